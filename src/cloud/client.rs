//! cloud::client
//!
//! HTTP client for the cloud API.
//!
//! # Endpoints
//!
//! - `GET {api}/v1/memberships` - organizations of the authenticated user
//! - `GET {api}/v1/stacks/{org_uuid}?page=N&per_page=M` - stack statuses
//!
//! Every request carries the credential's bearer token and is bounded by a
//! 5 second deadline. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::traits::{CloudError, StatusSource};
use super::types::{Membership, RemoteStackStatus, StacksPage};
use crate::auth::Credential;

/// Deadline for a single API request.
pub const API_TIMEOUT: Duration = Duration::from_secs(5);

const STACKS_PER_PAGE: u64 = 100;

/// Cloud API client.
pub struct CloudClient {
    client: Client,
    base_url: String,
    credential: Arc<dyn Credential>,
    organization: Option<Uuid>,
}

impl CloudClient {
    /// Create a client for `base_url` (no trailing slash).
    pub fn new(
        base_url: impl Into<String>,
        credential: Arc<dyn Credential>,
    ) -> Result<Self, CloudError> {
        let client = Client::builder()
            .timeout(API_TIMEOUT)
            .user_agent(concat!("stackpick/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CloudError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
            organization: None,
        })
    }

    /// Pin the organization instead of deriving it from memberships.
    pub fn with_organization(mut self, organization: Option<Uuid>) -> Self {
        self.organization = organization;
        self
    }

    /// Base URL of the API.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Organizations the authenticated user belongs to.
    pub async fn memberships(&self) -> Result<Vec<Membership>, CloudError> {
        self.get("/v1/memberships", &[]).await
    }

    /// The organization to query: the pinned one, else the single active
    /// membership.
    ///
    /// # Errors
    ///
    /// - [`CloudError::NoOrganization`] without active memberships
    /// - [`CloudError::AmbiguousOrganization`] with several
    pub async fn organization(&self) -> Result<Uuid, CloudError> {
        if let Some(org) = self.organization {
            return Ok(org);
        }

        let active: Vec<Membership> = self
            .memberships()
            .await?
            .into_iter()
            .filter(Membership::is_active)
            .collect();

        match active.as_slice() {
            [] => Err(CloudError::NoOrganization),
            [only] => {
                tracing::debug!(org = %only.org_name, uuid = %only.org_uuid, "using organization");
                Ok(only.org_uuid)
            }
            many => Err(CloudError::AmbiguousOrganization(
                many.iter().map(|m| m.org_name.clone()).collect(),
            )),
        }
    }

    /// All stack statuses of `org`, following pagination.
    pub async fn stacks(&self, org: Uuid) -> Result<Vec<RemoteStackStatus>, CloudError> {
        let path = format!("/v1/stacks/{}", org);
        let per_page = STACKS_PER_PAGE.to_string();
        let mut stacks = Vec::new();
        let mut page: u64 = 1;

        loop {
            let page_str = page.to_string();
            let result: StacksPage = self
                .get(&path, &[("page", &page_str), ("per_page", &per_page)])
                .await?;

            let fetched = result.stacks.len();
            stacks.extend(result.stacks);

            match result.paginated_result {
                Some(p) if p.has_more() && fetched > 0 => page += 1,
                _ => break,
            }
        }

        tracing::debug!(org = %org, count = stacks.len(), "fetched stack statuses");
        Ok(stacks)
    }

    async fn headers(&self) -> Result<HeaderMap, CloudError> {
        let token = self.credential.bearer_token().await?;
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| CloudError::Auth("token contains invalid header characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CloudError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "cloud request");

        let response = self
            .client
            .get(&url)
            .headers(self.headers().await?)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        Self::handle_response(&url, response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        url: &str,
        response: Response,
    ) -> Result<T, CloudError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .ok()
                .filter(|body| !body.trim().is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
            return Err(CloudError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(url, e))?;
        serde_json::from_slice(&body).map_err(|e| CloudError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for CloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudClient")
            .field("base_url", &self.base_url)
            .field("credential", &self.credential.name())
            .field("organization", &self.organization)
            .finish()
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> CloudError {
    if err.is_timeout() {
        CloudError::Timeout {
            url: url.to_string(),
        }
    } else {
        CloudError::Network(err.without_url().to_string())
    }
}

#[async_trait]
impl StatusSource for CloudClient {
    async fn stack_statuses(&self) -> Result<Vec<RemoteStackStatus>, CloudError> {
        let org = self.organization().await?;
        self.stacks(org).await
    }
}
