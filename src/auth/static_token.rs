//! auth::static_token
//!
//! A fixed bearer token taken from the environment.

use super::{AuthError, Credential};

/// Environment variable holding a static cloud token.
pub const TOKEN_ENV: &str = "STACKPICK_CLOUD_TOKEN";

/// A bearer token that never expires client-side.
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Wrap a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Read the token from `STACKPICK_CLOUD_TOKEN`, if set and non-empty.
    pub fn from_env() -> Option<Self> {
        std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(|t| Self::new(t.trim()))
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToken")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait::async_trait]
impl Credential for StaticToken {
    fn name(&self) -> &str {
        "static token"
    }

    async fn bearer_token(&self) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }

    fn is_expired(&self) -> bool {
        false
    }
}
