//! auth::errors
//!
//! Credential error types.
//!
//! # Example
//!
//! ```
//! use stackpick::auth::AuthError;
//!
//! let err = AuthError::InvalidToken("missing \"exp\" claim".to_string());
//! assert!(err.to_string().contains("exp"));
//! ```

use thiserror::Error;

/// Errors from credential operations.
///
/// # Security
///
/// Error messages never include token values.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// No credential source is configured.
    #[error(
        "no cloud credential found: set STACKPICK_CLOUD_TOKEN or run inside GitHub Actions \
         with id-token permissions"
    )]
    NotFound,

    /// A credential source is configured but unusable.
    #[error("invalid credential configuration: {0}")]
    InvalidConfig(String),

    /// Network error while obtaining a token.
    #[error("network error: {0}")]
    Network(String),

    /// The token endpoint answered with an error status.
    #[error("token request failed: {status} - {message}")]
    TokenRequest {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The token could not be decoded or lacks required claims.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The token cache lock was poisoned by a panicking writer.
    #[error("token cache is unavailable")]
    CachePoisoned,
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Network(err.without_url().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_sources() {
        let msg = AuthError::NotFound.to_string();
        assert!(msg.contains("STACKPICK_CLOUD_TOKEN"));
        assert!(msg.contains("GitHub Actions"));
    }

    #[test]
    fn token_request_formatting() {
        let err = AuthError::TokenRequest {
            status: 403,
            message: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "token request failed: 403 - forbidden");
    }
}
