//! The `{Success, Data, Message}` wrapper around every backend response

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "Data", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(rename = "Message", default)]
    pub message: String,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decode a response body, failing closed on anything that is not an
    /// envelope. Error statuses carry envelopes too, so the status is only
    /// used for reporting.
    pub fn decode(status: u16, body: &[u8]) -> Result<Self, ApiError> {
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedResponse {
            status,
            reason: e.to_string(),
        })
    }
}

impl<T> Envelope<T> {
    /// Unwrap the payload of a successful envelope.
    pub fn into_data(self, status: u16, endpoint: &str) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::rejected(status, self.message));
        }
        self.data.ok_or_else(|| ApiError::MissingData {
            endpoint: endpoint.to_string(),
        })
    }

    /// Like [`Envelope::into_data`], but an omitted payload means empty.
    /// The backend drops `Data` for empty lists.
    pub fn into_data_or_default(self, status: u16) -> Result<T, ApiError>
    where
        T: Default,
    {
        if !self.success {
            return Err(ApiError::rejected(status, self.message));
        }
        Ok(self.data.unwrap_or_default())
    }

    pub fn into_unit(self, status: u16) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::rejected(status, self.message))
        }
    }
}
