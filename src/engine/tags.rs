//! engine::tags
//!
//! Include/exclude tag predicates.

use std::collections::BTreeSet;

use crate::core::stack::Stack;
use crate::core::types::Tag;

/// Selects stacks carrying every included tag and no excluded tag.
///
/// An empty include set requires nothing; an empty exclude set forbids
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    include: BTreeSet<Tag>,
    exclude: BTreeSet<Tag>,
}

impl TagFilter {
    pub fn new(
        include: impl IntoIterator<Item = Tag>,
        exclude: impl IntoIterator<Item = Tag>,
    ) -> Self {
        Self {
            include: include.into_iter().collect(),
            exclude: exclude.into_iter().collect(),
        }
    }

    /// Whether the filter lets every stack through.
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Evaluate the predicate against a tag set.
    pub fn matches(&self, tags: &BTreeSet<Tag>) -> bool {
        self.include.is_subset(tags) && self.exclude.is_disjoint(tags)
    }

    /// Keep the matching stacks, preserving order.
    pub fn apply(&self, stacks: Vec<Stack>) -> Vec<Stack> {
        if self.is_empty() {
            return stacks;
        }
        stacks.into_iter().filter(|s| self.matches(&s.tags)).collect()
    }
}
