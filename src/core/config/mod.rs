//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! stackpick has two configuration scopes:
//! - **Global**: User-level settings (cloud endpoint)
//! - **Project**: `stackpick.toml` at the project root
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. Environment (`STACKPICK_API_URL`)
//! 5. CLI flags (not handled here)
//!
//! # Example
//!
//! ```no_run
//! use stackpick::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Path::new("/path/to/project")).unwrap();
//! let git = result.config.git();
//! println!("diffing against {}/{}", git.default_remote, git.default_branch);
//! ```

pub mod schema;

pub use schema::{CloudSection, GitSection, GlobalConfig, ProjectConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::types::BranchName;

/// File name of the project configuration.
pub const PROJECT_CONFIG_FILE: &str = "stackpick.toml";

/// Default remote when `git.default_remote` is unset.
pub const DEFAULT_REMOTE: &str = "origin";

/// Default branch when `git.default_branch` is unset.
pub const DEFAULT_BRANCH: &str = "main";

/// Default "previous deployment" revision when `git.default_branch_base_ref` is unset.
pub const DEFAULT_BRANCH_BASE_REF: &str = "HEAD^";

/// Default cloud API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.terramate.io";

/// Environment variable overriding the cloud API endpoint.
pub const API_URL_ENV: &str = "STACKPICK_API_URL";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Effective git settings with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitConfig {
    /// Remote treated as the deployment source of truth.
    pub default_remote: String,
    /// Branch on the default remote that gets deployed.
    pub default_branch: BranchName,
    /// Revision compared against when HEAD is a deployed commit.
    pub default_branch_base_ref: String,
    /// Whether remote/branch existence and HEAD freshness are checked.
    pub check_remote: bool,
}

impl GitConfig {
    /// The `remote/branch` ref of the default branch.
    pub fn remote_default_branch_ref(&self) -> String {
        format!("{}/{}", self.default_remote, self.default_branch)
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        GitSection::default().resolve()
    }
}

impl GitSection {
    /// Fill unset keys with their defaults.
    ///
    /// Must only be called on a validated section.
    fn resolve(&self) -> GitConfig {
        let default_branch = self
            .default_branch
            .as_deref()
            .and_then(|b| BranchName::new(b).ok())
            .unwrap_or_else(|| BranchName::new(DEFAULT_BRANCH).expect("default branch is valid"));

        GitConfig {
            default_remote: self
                .default_remote
                .clone()
                .unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
            default_branch,
            default_branch_base_ref: self
                .default_branch_base_ref
                .clone()
                .unwrap_or_else(|| DEFAULT_BRANCH_BASE_REF.to_string()),
            check_remote: self.check_remote.unwrap_or(true),
        }
    }
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path or variable that triggered the warning.
    pub source: String,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence rules automatically.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Project configuration
    pub project: ProjectConfig,
    /// `STACKPICK_API_URL`, if set
    api_url_env: Option<String>,
}

impl Config {
    /// Load configuration for the project rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error.
    pub fn load(root: &Path) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let global = Self::load_global()?;
        let project = Self::load_project(root)?;

        global.validate()?;
        project.validate()?;

        let api_url_env = match std::env::var(API_URL_ENV) {
            Ok(url) if url.is_empty() => None,
            Ok(url) => match schema::validate_api_url(&url) {
                Ok(()) => Some(url),
                Err(e) => {
                    warnings.push(ConfigWarning {
                        message: format!("ignoring {}: {}", API_URL_ENV, e),
                        source: API_URL_ENV.to_string(),
                    });
                    None
                }
            },
            Err(_) => None,
        };

        Ok(ConfigLoadResult {
            config: Config {
                global,
                project,
                api_url_env,
            },
            warnings,
        })
    }

    /// Load global configuration from standard locations.
    fn load_global() -> Result<GlobalConfig, ConfigError> {
        // 1. Check $STACKPICK_CONFIG
        if let Ok(path) = std::env::var("STACKPICK_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return read_toml(&path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/stackpick/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("stackpick/config.toml");
            if path.exists() {
                return read_toml(&path);
            }
        }

        // 3. Check ~/.stackpick/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".stackpick/config.toml");
            if path.exists() {
                return read_toml(&path);
            }
        }

        Ok(GlobalConfig::default())
    }

    /// Load the project configuration, if present.
    fn load_project(root: &Path) -> Result<ProjectConfig, ConfigError> {
        let path = root.join(PROJECT_CONFIG_FILE);
        if !path.exists() {
            return Ok(ProjectConfig::default());
        }
        read_toml(&path)
    }

    /// Effective git settings.
    pub fn git(&self) -> GitConfig {
        self.project
            .git
            .as_ref()
            .map(GitSection::resolve)
            .unwrap_or_default()
    }

    /// Effective cloud API URL, without a trailing slash.
    pub fn cloud_api_url(&self) -> String {
        let url = self
            .api_url_env
            .clone()
            .or_else(|| self.project.cloud.as_ref().and_then(|c| c.api_url.clone()))
            .or_else(|| self.global.cloud.as_ref().and_then(|c| c.api_url.clone()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        url.trim_end_matches('/').to_string()
    }

    /// Configured organization UUID, if any.
    pub fn cloud_organization(&self) -> Option<uuid::Uuid> {
        self.project
            .cloud
            .as_ref()
            .and_then(|c| c.organization.as_deref())
            .or_else(|| {
                self.global
                    .cloud
                    .as_ref()
                    .and_then(|c| c.organization.as_deref())
            })
            .and_then(|org| uuid::Uuid::parse_str(org).ok())
    }
}

/// Read and parse a TOML config file.
fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
