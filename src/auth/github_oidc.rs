//! auth::github_oidc
//!
//! GitHub Actions OIDC tokens as cloud credentials.
//!
//! # Flow
//!
//! Inside a workflow with `id-token: write`, GitHub exposes
//! `ACTIONS_ID_TOKEN_REQUEST_URL` and `ACTIONS_ID_TOKEN_REQUEST_TOKEN`.
//! A GET on the request URL (authorized with the request token) returns
//! `{"value": "<jwt>"}`. The JWT's `exp`, `repository_owner` and
//! `repository` claims are decoded without signature verification; the
//! cloud verifies the token.
//!
//! # Concurrency
//!
//! The token is cached under an `RwLock` and refreshed lazily once expired.
//! Callers that observe expiry at the same time each refresh; the last
//! write wins and every refreshed token is valid.

use std::sync::RwLock;
use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{AuthError, Credential};

/// Environment variable holding the token request URL.
pub const REQUEST_URL_ENV: &str = "ACTIONS_ID_TOKEN_REQUEST_URL";

/// Environment variable holding the token request bearer.
pub const REQUEST_TOKEN_ENV: &str = "ACTIONS_ID_TOKEN_REQUEST_TOKEN";

/// Environment variable overriding the token audience.
pub const AUDIENCE_ENV: &str = "STACKPICK_OIDC_AUDIENCE";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// A decoded OIDC token.
#[derive(Clone)]
struct OidcToken {
    value: String,
    expires_at: DateTime<Utc>,
    repository_owner: String,
    repository: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    value: String,
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<f64>,
    repository_owner: Option<String>,
    repository: Option<String>,
}

impl OidcToken {
    fn parse(value: String) -> Result<Self, AuthError> {
        let claims = decode_claims(&value)?;

        let exp = claims
            .exp
            .ok_or_else(|| AuthError::InvalidToken("JWT has no \"exp\" claim".into()))?;
        let expires_at = DateTime::<Utc>::from_timestamp(exp.trunc() as i64, (exp.fract() * 1e9) as u32)
            .ok_or_else(|| AuthError::InvalidToken(format!("JWT \"exp\" out of range: {exp}")))?;

        let repository_owner = claims.repository_owner.ok_or_else(|| {
            AuthError::InvalidToken("GitHub OIDC JWT has no \"repository_owner\" claim".into())
        })?;
        let repository = claims.repository.ok_or_else(|| {
            AuthError::InvalidToken("GitHub OIDC JWT has no \"repository\" claim".into())
        })?;

        Ok(Self {
            value,
            expires_at,
            repository_owner,
            repository,
        })
    }
}

/// Decode the payload segment of a JWT.
fn decode_claims(token: &str) -> Result<Claims, AuthError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::InvalidToken("not a JWT".into()))?;

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::InvalidToken(format!("JWT payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::InvalidToken(format!("JWT payload is not valid JSON: {e}")))
}

/// GitHub Actions OIDC credential.
pub struct GithubOidc {
    client: reqwest::Client,
    request_url: String,
    request_token: String,
    cache: RwLock<Option<OidcToken>>,
}

impl GithubOidc {
    /// Display name of this credential source.
    pub const NAME: &'static str = "GitHub Actions OIDC";

    /// Create a credential fetching tokens from `request_url`.
    ///
    /// When `audience` is given it replaces any `audience` query parameter
    /// of the request URL.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidConfig`] if the URL does not parse.
    pub fn new(
        request_url: &str,
        request_token: impl Into<String>,
        audience: Option<&str>,
    ) -> Result<Self, AuthError> {
        let mut url = reqwest::Url::parse(request_url)
            .map_err(|e| AuthError::InvalidConfig(format!("invalid {REQUEST_URL_ENV}: {e}")))?;

        if let Some(audience) = audience {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| k != "audience")
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .append_pair("audience", audience);
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            request_url: url.into(),
            request_token: request_token.into(),
            cache: RwLock::new(None),
        })
    }

    /// Build from the GitHub Actions environment.
    ///
    /// Returns `Ok(None)` outside GitHub Actions (no request URL).
    pub fn from_env() -> Result<Option<Self>, AuthError> {
        let Some(url) = std::env::var(REQUEST_URL_ENV).ok().filter(|u| !u.is_empty()) else {
            return Ok(None);
        };
        let token = std::env::var(REQUEST_TOKEN_ENV).unwrap_or_default();
        let audience = std::env::var(AUDIENCE_ENV).ok().filter(|a| !a.is_empty());

        Self::new(&url, token, audience.as_deref()).map(Some)
    }

    /// The URL tokens are requested from.
    pub fn request_url(&self) -> &str {
        &self.request_url
    }

    /// Fetch a fresh token and replace the cached one.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let response = self
            .client
            .get(&self.request_url)
            .bearer_auth(&self.request_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(AuthError::TokenRequest {
                status: status.as_u16(),
                message,
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidToken(format!("unexpected token response: {e}")))?;
        let token = OidcToken::parse(body.value)?;

        tracing::debug!(
            owner = %token.repository_owner,
            repository = %token.repository,
            expires_at = %token.expires_at,
            "refreshed GitHub OIDC token"
        );

        let mut cache = self.cache.write().map_err(|_| AuthError::CachePoisoned)?;
        *cache = Some(token);
        Ok(())
    }

    /// Expiry of the cached token.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.cached().map(|t| t.expires_at)
    }

    /// `(owner, repository)` claims of the cached token.
    pub fn repository(&self) -> Option<(String, String)> {
        self.cached()
            .map(|t| (t.repository_owner, t.repository))
    }

    fn cached(&self) -> Option<OidcToken> {
        self.cache.read().ok().and_then(|c| c.clone())
    }
}

impl std::fmt::Debug for GithubOidc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubOidc")
            .field("request_url", &self.request_url)
            .field("request_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at())
            .finish()
    }
}

#[async_trait::async_trait]
impl Credential for GithubOidc {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn bearer_token(&self) -> Result<String, AuthError> {
        if self.is_expired() {
            self.refresh().await?;
        }
        self.cached()
            .map(|t| t.value)
            .ok_or_else(|| AuthError::InvalidToken("no token available".into()))
    }

    fn is_expired(&self) -> bool {
        self.cached()
            .map_or(true, |t| Utc::now() >= t.expires_at)
    }
}
