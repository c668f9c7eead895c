//! core::stack
//!
//! Stack model and on-disk discovery.
//!
//! A stack is any directory holding a `stack.toml` manifest:
//!
//! ```toml
//! [stack]
//! id = "network-prod"
//! name = "network"
//! tags = ["prod", "aws"]
//! ```
//!
//! # Invariants
//!
//! - Stack paths are unique (one manifest per directory)
//! - Stack ids are unique among stacks that declare one
//! - Discovery output is sorted by path

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::types::{MetaId, StackPath, Tag, TypeError};

/// Name of the stack manifest file.
pub const STACK_MANIFEST: &str = "stack.toml";

/// Errors from stack discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid stack manifest '{path}': {message}")]
    InvalidManifest { path: PathBuf, message: String },

    #[error("stack id '{id}' is declared by both {first} and {second}")]
    DuplicateId {
        id: MetaId,
        first: StackPath,
        second: StackPath,
    },
}

/// An independently deployable unit of infrastructure configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    /// Project-absolute directory of the stack.
    pub path: StackPath,
    /// Identifier correlating the stack with its cloud record.
    pub meta_id: Option<MetaId>,
    /// Human readable name (defaults to the directory name).
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Tags used by tag filtering.
    pub tags: BTreeSet<Tag>,
}

impl Stack {
    /// Create a stack with no id and no tags.
    pub fn new(path: StackPath) -> Self {
        let name = path
            .as_str()
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or("/")
            .to_string();

        Self {
            path,
            meta_id: None,
            name,
            description: String::new(),
            tags: BTreeSet::new(),
        }
    }

    /// Set the stack id.
    pub fn with_id(mut self, id: MetaId) -> Self {
        self.meta_id = Some(id);
        self
    }

    /// Add tags.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }
}

/// On-disk manifest schema.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    stack: ManifestStack,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ManifestStack {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
}

/// Discover every stack below `root`, sorted by path.
///
/// Hidden directories (including `.git`) are not descended into.
///
/// # Errors
///
/// - [`DiscoveryError::Io`] if a directory or manifest cannot be read
/// - [`DiscoveryError::InvalidManifest`] if a manifest does not parse or
///   carries invalid tags/ids
/// - [`DiscoveryError::DuplicateId`] if two stacks share an id
pub fn discover(root: &Path) -> Result<Vec<Stack>, DiscoveryError> {
    let mut stacks = Vec::new();
    walk(root, root, &mut stacks)?;
    stacks.sort_by(|a, b| a.path.cmp(&b.path));

    let mut seen: HashMap<&MetaId, &StackPath> = HashMap::new();
    for stack in &stacks {
        if let Some(id) = &stack.meta_id {
            if let Some(first) = seen.insert(id, &stack.path) {
                return Err(DiscoveryError::DuplicateId {
                    id: id.clone(),
                    first: first.clone(),
                    second: stack.path.clone(),
                });
            }
        }
    }

    tracing::debug!(root = %root.display(), count = stacks.len(), "discovered stacks");
    Ok(stacks)
}

fn walk(root: &Path, dir: &Path, stacks: &mut Vec<Stack>) -> Result<(), DiscoveryError> {
    let io_err = |source| DiscoveryError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let manifest = dir.join(STACK_MANIFEST);
    if manifest.is_file() {
        stacks.push(load_stack(root, dir, &manifest)?);
    }

    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file_type = entry.file_type().map_err(io_err)?;
        if !file_type.is_dir() {
            continue;
        }
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden {
            subdirs.push(entry.path());
        }
    }

    for subdir in subdirs {
        walk(root, &subdir, stacks)?;
    }
    Ok(())
}

fn load_stack(root: &Path, dir: &Path, manifest: &Path) -> Result<Stack, DiscoveryError> {
    let invalid = |message: String| DiscoveryError::InvalidManifest {
        path: manifest.to_path_buf(),
        message,
    };
    let from_type = |e: TypeError| invalid(e.to_string());

    let contents = fs::read_to_string(manifest).map_err(|source| DiscoveryError::Io {
        path: manifest.to_path_buf(),
        source,
    })?;
    let parsed: Manifest = toml::from_str(&contents).map_err(|e| invalid(e.to_string()))?;

    let rel = dir.strip_prefix(root).unwrap_or(dir);
    let path = StackPath::from_relative(rel).map_err(from_type)?;

    let mut stack = Stack::new(path);
    if let Some(id) = parsed.stack.id.filter(|id| !id.is_empty()) {
        stack.meta_id = Some(MetaId::new(id).map_err(from_type)?);
    }
    if let Some(name) = parsed.stack.name {
        stack.name = name;
    }
    stack.description = parsed.stack.description.unwrap_or_default();
    for tag in parsed.stack.tags {
        stack.tags.insert(Tag::new(tag).map_err(from_type)?);
    }

    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    fn paths(stacks: &[Stack]) -> Vec<&str> {
        stacks.iter().map(|s| s.path.as_str()).collect()
    }

    #[test]
    fn empty_tree_has_no_stacks() {
        let dir = TempDir::new().unwrap();
        assert!(discover(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn finds_nested_stacks_sorted() {
        let dir = TempDir::new().unwrap();
        dir.child("b/stack.toml").write_str("[stack]\n").unwrap();
        dir.child("a/stack.toml").write_str("[stack]\n").unwrap();
        dir.child("a/child/stack.toml").write_str("[stack]\n").unwrap();
        dir.child("a-z/stack.toml").write_str("[stack]\n").unwrap();
        dir.child("docs/readme.md").write_str("not a stack").unwrap();

        let stacks = discover(dir.path()).unwrap();
        assert_eq!(paths(&stacks), vec!["/a", "/a-z", "/a/child", "/b"]);
    }

    #[test]
    fn root_can_be_a_stack() {
        let dir = TempDir::new().unwrap();
        dir.child("stack.toml").write_str("[stack]\n").unwrap();

        let stacks = discover(dir.path()).unwrap();
        assert_eq!(paths(&stacks), vec!["/"]);
    }

    #[test]
    fn hidden_directories_are_skipped() {
        let dir = TempDir::new().unwrap();
        dir.child(".git/stack.toml").write_str("[stack]\n").unwrap();
        dir.child(".cache/x/stack.toml").write_str("[stack]\n").unwrap();

        assert!(discover(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn reads_manifest_fields() {
        let dir = TempDir::new().unwrap();
        dir.child("net/stack.toml")
            .write_str(
                "[stack]\nid = \"net-1\"\nname = \"network\"\ndescription = \"vpc\"\ntags = [\"prod\", \"aws\"]\n",
            )
            .unwrap();

        let stacks = discover(dir.path()).unwrap();
        let stack = &stacks[0];
        assert_eq!(stack.meta_id.as_ref().unwrap().as_str(), "net-1");
        assert_eq!(stack.name, "network");
        assert_eq!(stack.description, "vpc");
        let tags: Vec<_> = stack.tags.iter().map(Tag::as_str).collect();
        assert_eq!(tags, vec!["aws", "prod"]);
    }

    #[test]
    fn empty_id_means_unidentified() {
        let dir = TempDir::new().unwrap();
        dir.child("s/stack.toml")
            .write_str("[stack]\nid = \"\"\n")
            .unwrap();

        let stacks = discover(dir.path()).unwrap();
        assert!(stacks[0].meta_id.is_none());
        assert_eq!(stacks[0].name, "s");
    }

    #[test]
    fn invalid_tag_is_rejected() {
        let dir = TempDir::new().unwrap();
        dir.child("s/stack.toml")
            .write_str("[stack]\ntags = [\"Prod\"]\n")
            .unwrap();

        let err = discover(dir.path()).unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidManifest { .. }));
    }

    #[test]
    fn unknown_manifest_field_is_rejected() {
        let dir = TempDir::new().unwrap();
        dir.child("s/stack.toml")
            .write_str("[stack]\nwatch = []\n")
            .unwrap();

        assert!(discover(dir.path()).is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        dir.child("a/stack.toml")
            .write_str("[stack]\nid = \"same\"\n")
            .unwrap();
        dir.child("b/stack.toml")
            .write_str("[stack]\nid = \"same\"\n")
            .unwrap();

        let err = discover(dir.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "stack id 'same' is declared by both /a and /b"
        );
    }

    #[test]
    fn builder_helpers() {
        let stack = Stack::new(StackPath::new("/infra/vpc").unwrap())
            .with_id(MetaId::new("vpc").unwrap())
            .with_tags([Tag::new("prod").unwrap()]);
        assert_eq!(stack.name, "vpc");
        assert!(stack.meta_id.is_some());
        assert_eq!(stack.tags.len(), 1);
    }
}
