//! auth - Bearer credentials for the cloud API
//!
//! # Sources
//!
//! Credentials are tried in order:
//!
//! 1. [`StaticToken`] from `STACKPICK_CLOUD_TOKEN`
//! 2. [`GithubOidc`] when running inside GitHub Actions
//!
//! # Security
//!
//! Tokens never appear in logs, errors or debug output. Every credential
//! type implements a redacting `Debug`.
//!
//! # Example
//!
//! ```ignore
//! use stackpick::auth::{load_credential, Credential};
//!
//! let credential = load_credential().await?;
//! let token = credential.bearer_token().await?;
//! ```

mod errors;
mod github_oidc;
mod static_token;

use std::sync::Arc;

pub use errors::AuthError;
pub use github_oidc::{GithubOidc, AUDIENCE_ENV, REQUEST_TOKEN_ENV, REQUEST_URL_ENV};
pub use static_token::{StaticToken, TOKEN_ENV};

/// A source of bearer tokens for the cloud API.
///
/// Owned by the invocation and shared with the clients that need it.
#[async_trait::async_trait]
pub trait Credential: Send + Sync {
    /// Human readable name of the credential source.
    fn name(&self) -> &str;

    /// Returns a valid bearer token, refreshing it first if expired.
    ///
    /// Concurrent callers may each trigger a refresh; refreshing is
    /// idempotent.
    async fn bearer_token(&self) -> Result<String, AuthError>;

    /// Whether the cached token is expired (or absent).
    fn is_expired(&self) -> bool;
}

/// Load the first available credential.
///
/// # Errors
///
/// - [`AuthError::NotFound`] when no source is configured
/// - Any error from the initial token fetch of an OIDC source
pub async fn load_credential() -> Result<Arc<dyn Credential>, AuthError> {
    if let Some(token) = StaticToken::from_env() {
        tracing::debug!(source = token.name(), "using cloud credential");
        return Ok(Arc::new(token));
    }

    if let Some(oidc) = GithubOidc::from_env()? {
        oidc.refresh().await?;
        tracing::debug!(source = oidc.name(), "using cloud credential");
        return Ok(Arc::new(oidc));
    }

    Err(AuthError::NotFound)
}
