//! cloud::traits
//!
//! Status source trait definition.
//!
//! # Design
//!
//! The `StatusSource` trait is async because fetching statuses involves
//! network I/O. Failures are never retried: a timeout and any other
//! transport failure both surface as a fatal [`CloudError`].
//!
//! # Example
//!
//! ```ignore
//! use stackpick::cloud::StatusSource;
//!
//! async fn count_failed(source: &dyn StatusSource) -> Result<usize, CloudError> {
//!     let records = source.stack_statuses().await?;
//!     Ok(records.iter().filter(|r| !r.status.is_ok()).count())
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use super::types::RemoteStackStatus;

/// Errors from cloud operations.
#[derive(Debug, Clone, Error)]
pub enum CloudError {
    /// No credential could be obtained.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The request did not complete within the deadline.
    #[error("request to {url} timed out")]
    Timeout {
        /// Endpoint that timed out
        url: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// API returned an error status.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Response body could not be decoded.
    #[error("unexpected response from {url}: {message}")]
    Decode {
        /// Endpoint that answered
        url: String,
        /// Decoder message
        message: String,
    },

    /// The user belongs to no active organization.
    #[error("user is not a member of any active organization")]
    NoOrganization,

    /// The user belongs to several organizations and none is configured.
    #[error(
        "user is a member of several organizations ({}); set cloud.organization",
        .0.join(", ")
    )]
    AmbiguousOrganization(Vec<String>),
}

impl From<crate::auth::AuthError> for CloudError {
    fn from(err: crate::auth::AuthError) -> Self {
        CloudError::Auth(err.to_string())
    }
}

/// A source of remote stack status records.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// All stack status records visible to the caller's organization.
    async fn stack_statuses(&self) -> Result<Vec<RemoteStackStatus>, CloudError>;
}
