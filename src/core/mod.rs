//! core
//!
//! Core domain types, schemas, and discovery for stackpick.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, Tag, MetaId, StackPath
//! - [`config`] - Configuration schema and loading
//! - [`stack`] - Stack model and on-disk discovery
//! - [`project`] - Project root, working directory and repository identity
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Discovery output is deterministic

pub mod config;
pub mod project;
pub mod stack;
pub mod types;
