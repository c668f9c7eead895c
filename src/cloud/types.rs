//! cloud::types
//!
//! Wire types of the cloud API.
//!
//! Status enums are closed: values this client does not know decode to an
//! explicit `Unrecognized` variant instead of failing the whole response.

use serde::{Deserialize, Serialize};

/// Overall health of a stack as last reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackStatus {
    Ok,
    Failed,
    Drifted,
    Unknown,
    #[serde(other)]
    Unrecognized,
}

impl StackStatus {
    /// Whether this is the single healthy status.
    pub fn is_ok(self) -> bool {
        self == StackStatus::Ok
    }
}

/// Status of the last deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Ok,
    Pending,
    Running,
    Failed,
    Canceled,
    #[serde(other)]
    Unrecognized,
}

/// Status of the last drift detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftStatus {
    Ok,
    Drifted,
    Failed,
    Unknown,
    #[serde(other)]
    Unrecognized,
}

/// A stack status record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStackStatus {
    /// Cloud-side numeric id.
    pub stack_id: i64,
    /// Stack id declared in the stack manifest (may be empty).
    #[serde(default)]
    pub meta_id: String,
    /// Normalized repository the stack belongs to.
    pub repository: String,
    /// Stack path as reported by the last sync.
    #[serde(default)]
    pub path: String,
    /// Overall status used for health classification.
    pub status: StackStatus,
    /// Informational.
    #[serde(default)]
    pub deployment_status: Option<DeploymentStatus>,
    /// Informational.
    #[serde(default)]
    pub drift_status: Option<DriftStatus>,
}

/// Organization membership of the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub org_uuid: uuid::Uuid,
    pub org_name: String,
    #[serde(default)]
    pub org_display_name: String,
    /// Membership status (`active`, `invited`, ...).
    pub status: String,
}

impl Membership {
    /// Whether the membership grants access.
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

/// Paged list of stacks.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StacksPage {
    pub stacks: Vec<RemoteStackStatus>,
    #[serde(default)]
    pub paginated_result: Option<Pagination>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct Pagination {
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl Pagination {
    /// Whether pages after this one hold more records.
    pub fn has_more(&self) -> bool {
        self.page.saturating_mul(self.per_page) < self.total
    }
}
