//! cloud::mock
//!
//! In-memory status source for deterministic testing.
//!
//! # Example
//!
//! ```
//! use stackpick::cloud::mock::MockCloud;
//! use stackpick::cloud::{StackStatus, StatusSource};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let cloud = MockCloud::new().with_stack("s1", "github.com/acme/infra", StackStatus::Failed);
//!
//! let records = cloud.stack_statuses().await.unwrap();
//! assert_eq!(records[0].meta_id, "s1");
//! assert_eq!(cloud.fetch_count(), 1);
//! # });
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{CloudError, StatusSource};
use super::types::{RemoteStackStatus, StackStatus};

/// Mock status source.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MockCloud {
    inner: Arc<Mutex<MockCloudInner>>,
}

#[derive(Debug, Default)]
struct MockCloudInner {
    records: Vec<RemoteStackStatus>,
    fail_with: Option<CloudError>,
    fetches: usize,
}

impl MockCloud {
    /// Create a source with no records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record.
    pub fn with_record(self, record: RemoteStackStatus) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.records.push(record);
        }
        self
    }

    /// Add a record for `meta_id` in `repository`.
    pub fn with_stack(self, meta_id: &str, repository: &str, status: StackStatus) -> Self {
        let stack_id = self.inner.lock().map(|i| i.records.len() as i64 + 1).unwrap_or(1);
        self.with_record(RemoteStackStatus {
            stack_id,
            meta_id: meta_id.to_string(),
            repository: repository.to_string(),
            path: String::new(),
            status,
            deployment_status: None,
            drift_status: None,
        })
    }

    /// Make every fetch fail.
    pub fn failing(self, err: CloudError) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_with = Some(err);
        }
        self
    }

    /// Number of fetches performed.
    pub fn fetch_count(&self) -> usize {
        self.inner.lock().map(|i| i.fetches).unwrap_or(0)
    }
}

#[async_trait]
impl StatusSource for MockCloud {
    async fn stack_statuses(&self) -> Result<Vec<RemoteStackStatus>, CloudError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| CloudError::Network("mock state poisoned".into()))?;
        inner.fetches += 1;
        match &inner.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(inner.records.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_records_in_order() {
        let cloud = MockCloud::new()
            .with_stack("a", "r", StackStatus::Ok)
            .with_stack("b", "r", StackStatus::Drifted);

        let records = cloud.stack_statuses().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].stack_id, 2);
        assert_eq!(records[1].status, StackStatus::Drifted);
    }

    #[tokio::test]
    async fn failure_is_returned_and_counted() {
        let cloud = MockCloud::new().failing(CloudError::Timeout {
            url: "http://x".into(),
        });

        assert!(cloud.stack_statuses().await.is_err());
        assert_eq!(cloud.fetch_count(), 1);
    }
}
