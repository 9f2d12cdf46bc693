//! In-memory storage implementation for testing and embedding.
//!
//! Tuples are bucketed by object namespace in a `DashMap` for thread-safe
//! concurrent access. Every write bumps a monotonic revision counter and
//! records the tuple's lifetime, so reads at an older revision see the
//! store as it was then.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::instrument;

use rsrebac_domain::error::{LookupError, LookupResult};
use rsrebac_domain::model::{
    NamespaceDefinition, NamespaceTypeSystem, ObjectAndRelation, RelationTuple, Revision,
};
use rsrebac_domain::resolver::{GraphDatastore, NamespaceManager};

/// A tuple together with the revision interval it is visible in.
#[derive(Debug, Clone)]
struct StoredTuple {
    tuple: RelationTuple,
    created_at: Revision,
    deleted_at: Option<Revision>,
}

impl StoredTuple {
    fn visible_at(&self, revision: Revision) -> bool {
        self.created_at <= revision && self.deleted_at.map_or(true, |deleted| deleted > revision)
    }
}

/// In-memory implementation of [`GraphDatastore`].
///
/// # Performance characteristics
///
/// - **Write / delete**: O(1) bucket lookup plus append or linear mark
/// - **Queries**: O(N) over the object namespace's bucket
///
/// Reads never block writes to other namespaces.
#[derive(Debug, Default)]
pub struct MemoryGraphDatastore {
    tuples: DashMap<String, Vec<StoredTuple>>,
    head: AtomicU64,
}

impl MemoryGraphDatastore {
    /// Creates an empty datastore at revision zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty datastore wrapped in `Arc`.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// The newest revision of the store.
    pub fn head_revision(&self) -> Revision {
        Revision(self.head.load(Ordering::SeqCst))
    }

    /// Writes a tuple, returning the revision it became visible at.
    #[instrument(skip(self), fields(tuple = %tuple))]
    pub fn write_tuple(&self, tuple: RelationTuple) -> Revision {
        let revision = Revision(self.head.fetch_add(1, Ordering::SeqCst) + 1);
        self.tuples
            .entry(tuple.object_and_relation.namespace.clone())
            .or_default()
            .push(StoredTuple {
                tuple,
                created_at: revision,
                deleted_at: None,
            });
        revision
    }

    /// Deletes a tuple, returning the revision it stopped being visible
    /// at, or `None` if no live tuple matched.
    #[instrument(skip(self), fields(tuple = %tuple))]
    pub fn delete_tuple(&self, tuple: &RelationTuple) -> Option<Revision> {
        let revision = Revision(self.head.fetch_add(1, Ordering::SeqCst) + 1);
        let mut bucket = self
            .tuples
            .get_mut(&tuple.object_and_relation.namespace)?;
        let stored = bucket
            .iter_mut()
            .find(|stored| stored.deleted_at.is_none() && stored.tuple == *tuple)?;
        stored.deleted_at = Some(revision);
        Some(revision)
    }
}

#[async_trait]
impl GraphDatastore for MemoryGraphDatastore {
    async fn reverse_query_tuples_from_subject(
        &self,
        subject: &ObjectAndRelation,
        object_namespace: &str,
        object_relation: &str,
        at_revision: Revision,
        limit: Option<usize>,
    ) -> LookupResult<Vec<RelationTuple>> {
        let Some(bucket) = self.tuples.get(object_namespace) else {
            return Ok(Vec::new());
        };

        Ok(bucket
            .iter()
            .filter(|stored| {
                stored.visible_at(at_revision)
                    && stored.tuple.subject == *subject
                    && stored.tuple.object_and_relation.relation == object_relation
            })
            .take(limit.unwrap_or(usize::MAX))
            .map(|stored| stored.tuple.clone())
            .collect())
    }

    async fn query_tuples(
        &self,
        object_namespace: &str,
        relation: &str,
        usersets: &[ObjectAndRelation],
        at_revision: Revision,
        limit: usize,
    ) -> LookupResult<Vec<RelationTuple>> {
        let Some(bucket) = self.tuples.get(object_namespace) else {
            return Ok(Vec::new());
        };

        Ok(bucket
            .iter()
            .filter(|stored| {
                stored.visible_at(at_revision)
                    && stored.tuple.object_and_relation.relation == relation
                    && usersets.contains(&stored.tuple.subject)
            })
            .take(limit)
            .map(|stored| stored.tuple.clone())
            .collect())
    }
}

/// In-memory implementation of [`NamespaceManager`].
///
/// Namespace definitions are registered whole; each registration builds
/// the namespace's type system once and shares it across readers.
#[derive(Debug, Default)]
pub struct MemoryNamespaceManager {
    namespaces: DashMap<String, (Arc<NamespaceTypeSystem>, Revision)>,
    head: AtomicU64,
}

impl MemoryNamespaceManager {
    /// Creates an empty namespace manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty namespace manager wrapped in `Arc`.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Registers (or replaces) a namespace definition, returning the
    /// revision it became visible at.
    #[instrument(skip(self, definition), fields(namespace = %definition.name))]
    pub fn write_namespace(&self, definition: NamespaceDefinition) -> Revision {
        let revision = Revision(self.head.fetch_add(1, Ordering::SeqCst) + 1);
        self.namespaces.insert(
            definition.name.clone(),
            (Arc::new(NamespaceTypeSystem::new(definition)), revision),
        );
        revision
    }
}

#[async_trait]
impl NamespaceManager for MemoryNamespaceManager {
    async fn read_namespace_and_types(
        &self,
        namespace: &str,
    ) -> LookupResult<(Arc<NamespaceTypeSystem>, Revision)> {
        self.namespaces
            .get(namespace)
            .map(|entry| {
                let (type_system, revision) = entry.value();
                (Arc::clone(type_system), *revision)
            })
            .ok_or_else(|| LookupError::NamespaceNotFound {
                namespace: namespace.to_string(),
            })
    }
}
