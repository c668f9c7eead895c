//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$STACKPICK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/stackpick/config.toml`
//! 3. `~/.stackpick/config.toml`
//!
//! # Project Config
//!
//! Located at `stackpick.toml` in the project root.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., the default branch must be a valid branch name).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// [cloud]
/// api_url = "https://api.terramate.io"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Cloud status service settings
    pub cloud: Option<CloudSection>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(cloud) = &self.cloud {
            cloud.validate()?;
        }
        Ok(())
    }
}

/// Project configuration, read from `stackpick.toml` at the project root.
///
/// # Example
///
/// ```toml
/// [git]
/// default_remote = "origin"
/// default_branch = "main"
/// default_branch_base_ref = "HEAD^"
/// check_remote = true
///
/// [cloud]
/// organization = "0b7ba2f4-6f39-4a54-9c86-1e4b1a5ee3a8"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Git baseline settings
    pub git: Option<GitSection>,

    /// Cloud status service settings
    pub cloud: Option<CloudSection>,
}

impl ProjectConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(git) = &self.git {
            git.validate()?;
        }
        if let Some(cloud) = &self.cloud {
            cloud.validate()?;
        }
        Ok(())
    }
}

/// The `[git]` section as written by the user. Unset keys get defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitSection {
    /// Remote treated as the deployment source of truth
    pub default_remote: Option<String>,

    /// Branch on the default remote that gets deployed
    pub default_branch: Option<String>,

    /// Revision to compare against when HEAD is a deployed commit
    pub default_branch_base_ref: Option<String>,

    /// Whether remote/branch existence and HEAD freshness are checked
    pub check_remote: Option<bool>,
}

impl GitSection {
    /// Validate the git section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(remote) = &self.default_remote {
            if remote.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "git.default_remote cannot be empty".to_string(),
                ));
            }
        }

        if let Some(branch) = &self.default_branch {
            BranchName::new(branch).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid git.default_branch: {}", e))
            })?;
        }

        if let Some(base_ref) = &self.default_branch_base_ref {
            if base_ref.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "git.default_branch_base_ref cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// The `[cloud]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CloudSection {
    /// Base URL of the status service API
    pub api_url: Option<String>,

    /// Organization UUID to query
    pub organization: Option<String>,
}

impl CloudSection {
    /// Validate the cloud section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.api_url {
            validate_api_url(url)?;
        }

        if let Some(org) = &self.organization {
            uuid::Uuid::parse_str(org).map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "cloud.organization must be a UUID, got '{}': {}",
                    org, e
                ))
            })?;
        }

        Ok(())
    }
}

/// Check that an API URL is an absolute http(s) URL.
pub(crate) fn validate_api_url(url: &str) -> Result<(), ConfigError> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));

    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ConfigError::InvalidValue(format!(
            "cloud api url must be an absolute http(s) URL, got '{}'",
            url
        ))),
    }
}
