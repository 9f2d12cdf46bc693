//! Insertion-order-preserving set of object-relation triples.

use std::collections::HashSet;

use super::types::ObjectAndRelation;

/// A set of [`ObjectAndRelation`] values.
///
/// Membership is by structural equality; iteration follows insertion
/// order, which keeps lookup results deterministic for replay testing.
#[derive(Debug, Clone, Default)]
pub struct OnrSet {
    seen: HashSet<ObjectAndRelation>,
    ordered: Vec<ObjectAndRelation>,
}

impl OnrSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning true if it was newly added.
    pub fn add(&mut self, onr: ObjectAndRelation) -> bool {
        if self.seen.insert(onr.clone()) {
            self.ordered.push(onr);
            true
        } else {
            false
        }
    }

    /// Inserts every value from the iterator.
    pub fn update<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = ObjectAndRelation>,
    {
        for onr in values {
            self.add(onr);
        }
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn has(&self, onr: &ObjectAndRelation) -> bool {
        self.seen.contains(onr)
    }

    /// The members in insertion order.
    pub fn as_slice(&self) -> &[ObjectAndRelation] {
        &self.ordered
    }

    /// Set intersection, preserving this set's insertion order.
    pub fn intersect(&self, other: &OnrSet) -> OnrSet {
        self.ordered
            .iter()
            .filter(|onr| other.has(onr))
            .cloned()
            .collect()
    }

    /// Set difference, preserving this set's insertion order.
    pub fn subtract(&self, other: &OnrSet) -> OnrSet {
        self.ordered
            .iter()
            .filter(|onr| !other.has(onr))
            .cloned()
            .collect()
    }

    /// Consumes the set, returning the members in insertion order.
    pub fn into_vec(self) -> Vec<ObjectAndRelation> {
        self.ordered
    }

    /// Consumes the set, returning at most `limit` members in insertion
    /// order.
    pub fn into_limited_vec(self, limit: usize) -> Vec<ObjectAndRelation> {
        let mut members = self.ordered;
        members.truncate(limit);
        members
    }
}

impl FromIterator<ObjectAndRelation> for OnrSet {
    fn from_iter<I: IntoIterator<Item = ObjectAndRelation>>(iter: I) -> Self {
        let mut set = OnrSet::new();
        set.update(iter);
        set
    }
}

impl IntoIterator for OnrSet {
    type Item = ObjectAndRelation;
    type IntoIter = std::vec::IntoIter<ObjectAndRelation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered.into_iter()
    }
}
