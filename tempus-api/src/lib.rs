//! Client-side contract of the Tempus backend
//!
//! Wire models, the `{Success, Data, Message}` response envelope and a typed
//! REST client shared by the `tempus` app and `tempusctl`.

mod auth;
mod client;
mod documents;
mod entries;
mod envelope;
mod error;
pub mod models;
mod projects;

pub use client::{ApiClient, ApiClientConfig};
pub use envelope::Envelope;
pub use error::{ApiError, ErrorClass};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
