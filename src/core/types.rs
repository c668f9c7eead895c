//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`Oid`] - Git object identifier (SHA)
//! - [`Revision`] - A commit id or a symbolic revision to diff against
//! - [`Tag`] - Validated stack tag
//! - [`MetaId`] - User-assigned stack identifier
//! - [`StackPath`] - Project-absolute stack directory
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use stackpick::core::types::{BranchName, Oid, StackPath, Tag};
//!
//! let branch = BranchName::new("main").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! let path = StackPath::new("/infra/network").unwrap();
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! assert!(Tag::new("Prod").is_err());
//! assert_eq!(path.as_str(), "/infra/network");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid tag: {0}")]
    InvalidTag(String),

    #[error("invalid stack id: {0}")]
    InvalidMetaId(String),

    #[error("invalid stack path: {0}")]
    InvalidStackPath(String),
}

/// A validated Git branch name.
///
/// Branch names must conform to Git's refname rules (see `git check-ref-format`):
/// - Cannot be empty or exactly `@`
/// - Cannot start with `.` or `-`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, or ASCII control characters
/// - Cannot contain spaces, `~`, `^`, `:`, `\`, `?`, `*`, `[`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        let reject = |why: &str| Err(TypeError::InvalidBranchName(format!("'{name}': {why}")));

        if name.is_empty() {
            return reject("branch name cannot be empty");
        }
        if name == "@" {
            return reject("branch name cannot be '@' (reserved)");
        }
        if name.starts_with('.') || name.starts_with('-') {
            return reject("branch name cannot start with '.' or '-'");
        }
        if name.ends_with(".lock") || name.ends_with('/') {
            return reject("branch name cannot end with '.lock' or '/'");
        }
        for seq in ["..", "@{", "//"] {
            if name.contains(seq) {
                return reject(&format!("branch name cannot contain '{seq}'"));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        if let Some(c) = name
            .chars()
            .find(|c| INVALID_CHARS.contains(c) || c.is_ascii_control())
        {
            return reject(&format!("branch name cannot contain {c:?}"));
        }

        if name
            .split('/')
            .any(|component| component.starts_with('.') || component.ends_with(".lock"))
        {
            return reject("path component cannot start with '.' or end with '.lock'");
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency.
///
/// # Example
///
/// ```
/// use stackpick::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The revision a command diffs `HEAD` against.
///
/// Either a concrete commit (a fork point) or a symbolic revision that git
/// resolves at diff time (`origin/main`, `HEAD^`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Revision {
    /// A resolved commit id.
    Commit(Oid),
    /// A symbolic revision such as `origin/main` or `HEAD^`.
    Symbolic(String),
}

impl Revision {
    /// Get the revision as git would accept it on the command line.
    pub fn as_str(&self) -> &str {
        match self {
            Revision::Commit(oid) => oid.as_str(),
            Revision::Symbolic(spec) => spec,
        }
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated stack tag.
///
/// Tags start with a lowercase ASCII letter and contain only lowercase
/// letters, digits, `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    /// Create a new validated tag.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTag` if the tag is empty or uses invalid characters.
    pub fn new(tag: impl Into<String>) -> Result<Self, TypeError> {
        let tag = tag.into();
        let mut chars = tag.chars();
        match chars.next() {
            None => return Err(TypeError::InvalidTag("tag cannot be empty".into())),
            Some(c) if !c.is_ascii_lowercase() => {
                return Err(TypeError::InvalidTag(format!(
                    "'{tag}' must start with a lowercase letter"
                )))
            }
            Some(_) => {}
        }
        if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_') {
            return Err(TypeError::InvalidTag(format!(
                "'{tag}' may only contain lowercase letters, digits, '-' and '_'"
            )));
        }
        Ok(Self(tag))
    }

    /// Get the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Tag {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User-assigned stable stack identifier correlating a local stack with its
/// cloud record.
///
/// An absent identifier is modelled as `Option<MetaId>::None`, never as an
/// empty `MetaId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MetaId(String);

impl MetaId {
    /// Create a new stack id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidMetaId` if the id is empty or contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidMetaId("stack id cannot be empty".into()));
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidMetaId(format!(
                "'{id}' cannot contain whitespace"
            )));
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MetaId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<MetaId> for String {
    fn from(id: MetaId) -> Self {
        id.0
    }
}

impl std::fmt::Display for MetaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Project-absolute, `/`-separated stack directory (`/` is the project root).
///
/// Ordering is plain byte-wise string ordering, which is what makes listing
/// output reproducible across machines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackPath(String);

impl StackPath {
    /// The project root.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Create a new stack path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidStackPath` unless the path is absolute,
    /// normalized (no `.`/`..`/empty components) and has no trailing slash.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let path = path.into();
        if path == "/" {
            return Ok(Self::root());
        }
        let Some(rest) = path.strip_prefix('/') else {
            return Err(TypeError::InvalidStackPath(format!(
                "'{path}' must start with '/'"
            )));
        };
        if rest
            .split('/')
            .any(|c| c.is_empty() || c == "." || c == "..")
        {
            return Err(TypeError::InvalidStackPath(format!(
                "'{path}' is not normalized"
            )));
        }
        Ok(Self(path))
    }

    /// Build a stack path from a path relative to the project root.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidStackPath` if a component is not valid UTF-8
    /// or the path escapes the root.
    pub fn from_relative(rel: &std::path::Path) -> Result<Self, TypeError> {
        let mut parts = Vec::new();
        for component in rel.components() {
            match component {
                std::path::Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        TypeError::InvalidStackPath(format!(
                            "'{}' is not valid UTF-8",
                            rel.display()
                        ))
                    })?;
                    parts.push(part);
                }
                std::path::Component::CurDir => {}
                _ => {
                    return Err(TypeError::InvalidStackPath(format!(
                        "'{}' escapes the project root",
                        rel.display()
                    )))
                }
            }
        }
        Self::new(format!("/{}", parts.join("/")))
    }

    /// Check whether this path equals `dir` or lies below it.
    pub fn is_within(&self, dir: &StackPath) -> bool {
        if dir.is_root() || self == dir {
            return true;
        }
        self.0
            .strip_prefix(dir.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Render this path relative to `dir` (`.` for `dir` itself).
    ///
    /// Returns `None` when the path is not within `dir`.
    pub fn relative_to(&self, dir: &StackPath) -> Option<String> {
        if !self.is_within(dir) {
            return None;
        }
        if self == dir {
            return Some(".".to_string());
        }
        let offset = if dir.is_root() { 1 } else { dir.0.len() + 1 };
        Some(self.0[offset..].to_string())
    }

    /// Check whether this is the project root.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StackPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
