//! Collaborator traits consumed by the resolver.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LookupResult;
use crate::model::{NamespaceTypeSystem, ObjectAndRelation, RelationTuple, Revision};

use super::types::{LookupRequest, ResolvedObjects};

/// Routes a sub-request, locally or to a peer.
///
/// Implementations must honour `depth_remaining`: a request whose budget
/// is zero fails with [`crate::LookupError::DepthLimitExceeded`] before
/// any datastore read. `at_revision` must be propagated unchanged.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Resolves a lookup request.
    async fn dispatch_lookup(&self, request: LookupRequest) -> LookupResult<ResolvedObjects>;
}

/// Revisioned tuple queries needed by the resolver.
///
/// Both queries read at a single snapshot revision and push the result
/// bound into the store; implementations must be safe for concurrent use
/// by many tasks of the same request.
#[async_trait]
pub trait GraphDatastore: Send + Sync {
    /// Returns tuples whose subject equals `subject` and whose object
    /// lives under `object_namespace` / `object_relation`, stopping after
    /// `limit` tuples when a bound is given.
    async fn reverse_query_tuples_from_subject(
        &self,
        subject: &ObjectAndRelation,
        object_namespace: &str,
        object_relation: &str,
        at_revision: Revision,
        limit: Option<usize>,
    ) -> LookupResult<Vec<RelationTuple>>;

    /// Returns up to `limit` tuples under `object_namespace` with the
    /// given relation whose subject is any of `usersets`.
    async fn query_tuples(
        &self,
        object_namespace: &str,
        relation: &str,
        usersets: &[ObjectAndRelation],
        at_revision: Revision,
        limit: usize,
    ) -> LookupResult<Vec<RelationTuple>>;
}

/// Access to namespace definitions and their type systems.
#[async_trait]
pub trait NamespaceManager: Send + Sync {
    /// Reads the namespace definition and its type system, together with
    /// the revision the definition was read at.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LookupError::NamespaceNotFound`] when the
    /// namespace does not exist.
    async fn read_namespace_and_types(
        &self,
        namespace: &str,
    ) -> LookupResult<(Arc<NamespaceTypeSystem>, Revision)>;
}
