//! HTTP client for the backend REST API
//!
//! One request, one response: there is no retry, backoff or write queue.
//! Every body is decoded as an [`Envelope`] before the caller sees it.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::DEFAULT_BASE_URL;

#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL without a trailing slash, e.g. `http://localhost:8080`
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// A decoded response together with the HTTP status it arrived with.
pub(crate) struct Reply<T> {
    pub status: u16,
    pub envelope: Envelope<T>,
}

impl<T> Reply<T> {
    pub fn data(self, endpoint: &str) -> Result<T, ApiError> {
        self.envelope.into_data(self.status, endpoint)
    }

    pub fn data_or_default(self) -> Result<T, ApiError>
    where
        T: Default,
    {
        self.envelope.into_data_or_default(self.status)
    }

    pub fn unit(self) -> Result<(), ApiError> {
        self.envelope.into_unit(self.status)
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    config: ApiClientConfig,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            token: None,
        })
    }

    /// Attach the bearer token issued by the identity provider.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.set_token(token);
        self
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        if token.trim().is_empty() {
            warn!("Ignoring empty access token");
            return;
        }
        self.token = Some(token);
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Reply<T>, ApiError> {
        self.execute(Method::GET, path, None).await
    }

    pub(crate) async fn post<B, T>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<Reply<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = body.map(Self::encode).transpose()?;
        self.execute(Method::POST, path, body).await
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<Reply<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = Self::encode(body)?;
        self.execute(Method::PUT, path, Some(body)).await
    }

    pub(crate) async fn patch<B, T>(&self, path: &str, body: &B) -> Result<Reply<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = Self::encode(body)?;
        self.execute(Method::PATCH, path, Some(body)).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Reply<T>, ApiError> {
        self.execute(Method::DELETE, path, None).await
    }

    fn encode<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
        serde_json::to_value(body)
            .map_err(|e| ApiError::Validation(format!("Failed to serialize body: {e}")))
    }

    #[instrument(skip_all, fields(method = %method, path = %path))]
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Reply<T>, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::MissingToken)?;
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);

        debug!(url = %url, "Sending request");

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| self.map_transport(e))?;

        let envelope = Envelope::decode(status, &bytes)?;
        if envelope.success {
            debug!(status, "Request succeeded");
        } else {
            warn!(status, message = %envelope.message, "Backend rejected request");
        }

        Ok(Reply { status, envelope })
    }

    fn map_transport(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.config.timeout)
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
