//! Cached backend state for the UI
//!
//! Each store owns one resource list plus a loading flag and the last error
//! message, and is handed the client it talks to.

mod documents;
mod entries;
mod projects;

pub use documents::{FolderStore, NoteStore};
pub use entries::{TimeBoxStore, TimeEntryStore};
pub use projects::ProjectStore;

use tempus_api::ApiError;
use tracing::error;

#[derive(Debug, Default, Clone)]
pub struct StoreStatus {
    loading: bool,
    last_error: Option<String>,
}

impl StoreStatus {
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    fn begin(&mut self) {
        self.loading = true;
        self.last_error = None;
    }

    /// Record the outcome of a request and pass it through.
    fn finish<T>(&mut self, what: &str, result: Result<T, ApiError>) -> Result<T, ApiError> {
        self.loading = false;
        if let Err(e) = &result {
            error!(operation = what, error = %e, "Store request failed");
            self.last_error = Some(e.to_string());
        }
        result
    }

    /// Validation failures never reach the network but still show up in the UI.
    fn reject<T>(&mut self, err: impl Into<ApiError>) -> Result<T, ApiError> {
        let err = err.into();
        self.last_error = Some(err.to_string());
        Err(err)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use serde_json::{json, Value};
    use tempus_api::{ApiClient, ApiClientConfig};
    use wiremock::{MockServer, ResponseTemplate};

    pub fn client_for(server: &MockServer) -> Arc<ApiClient> {
        let config = ApiClientConfig {
            base_url: server.uri(),
            ..Default::default()
        };
        Arc::new(ApiClient::new(config).unwrap().with_token("test-token"))
    }

    pub fn ok(data: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "Success": true,
            "Data": data,
            "Message": "",
        }))
    }

    pub fn failure(status: u16, message: &str) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_json(json!({"Success": false, "Message": message}))
    }
}
