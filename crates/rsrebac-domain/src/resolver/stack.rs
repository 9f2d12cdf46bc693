//! Cycle-prevention stacks for graph traversal.

use std::collections::HashSet;
use std::sync::Arc;

use crate::model::RelationReference;

/// An immutable set of relation references visited along the current
/// resolution path.
///
/// `with` returns an extended copy and leaves the receiver unchanged, so
/// sibling branches always see independent stacks. The inner set is
/// wrapped in `Arc` for cheap cloning when not extending.
#[derive(Debug, Clone, Default)]
pub struct LookupStack {
    entries: Arc<HashSet<RelationReference>>,
}

impl LookupStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new stack extended with the given reference.
    pub fn with(&self, reference: RelationReference) -> Self {
        let mut entries = (*self.entries).clone();
        entries.insert(reference);
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Returns true if the reference was visited along this path.
    pub fn has(&self, reference: &RelationReference) -> bool {
        self.entries.contains(reference)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_leaves_original_unchanged() {
        let base = LookupStack::new();
        let extended = base.with(RelationReference::new("document", "viewer"));
        assert!(base.is_empty());
        assert_eq!(extended.len(), 1);
        assert!(extended.has(&RelationReference::new("document", "viewer")));
    }

    #[test]
    fn test_siblings_see_independent_copies() {
        let base = LookupStack::new().with(RelationReference::new("document", "viewer"));
        let left = base.with(RelationReference::new("folder", "read"));
        let right = base.with(RelationReference::new("group", "member"));
        assert!(!left.has(&RelationReference::new("group", "member")));
        assert!(!right.has(&RelationReference::new("folder", "read")));
        assert_eq!(base.len(), 1);
    }
}
