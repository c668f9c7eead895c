//! cloud
//!
//! Cloud stack status source.
//!
//! # Architecture
//!
//! The [`StatusSource`] trait abstracts where stack health records come
//! from. [`CloudClient`] talks to the cloud API over HTTP;
//! [`mock::MockCloud`] serves records from memory for tests.
//!
//! Records are scoped to a repository through [`normalize_git_uri`]: a
//! record only concerns a project whose default remote normalizes to the
//! record's `repository`.

mod client;
pub mod mock;
mod normalize;
mod traits;
mod types;

pub use client::{CloudClient, API_TIMEOUT};
pub use normalize::{normalize_git_uri, NormalizedRepo};
pub use traits::{CloudError, StatusSource};
pub use types::{DeploymentStatus, DriftStatus, Membership, RemoteStackStatus, StackStatus};
