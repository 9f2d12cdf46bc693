//! Request and result types for the reverse-lookup resolver.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::model::{ObjectAndRelation, RelationReference, Revision};

use super::stack::LookupStack;
use super::trace::{DebugTracer, NullTracer};

/// Sentinel limit meaning "practically unbounded". Inferred-direct and
/// tuple-to-userset sub-lookups use this because pruning intermediate sets
/// by the caller's limit would produce incorrect final counts. All limit
/// arithmetic saturates so the sentinel never overflows.
pub const NO_LIMIT: usize = usize::MAX;

/// Default depth budget for newly constructed requests.
pub const DEFAULT_DEPTH_REMAINING: u32 = 25;

/// The objects resolved by a lookup, deduplicated and in deterministic
/// order.
pub type ResolvedObjects = Vec<ObjectAndRelation>;

/// A unit of reverse-lookup work.
///
/// Resolution finds the objects of `start_relation` that grant
/// `target_onr` access, bounded by `limit`. Every datastore read uses
/// `at_revision`; `depth_remaining` is decremented on every redispatch and
/// reaching zero fails the subtree. The two stacks cut structural cycles
/// along the inferred-direct and tuple-to-userset dimensions.
#[derive(Clone)]
pub struct LookupRequest {
    /// The subject to resolve from, fully qualified.
    pub target_onr: ObjectAndRelation,
    /// The relation whose resource set is being computed.
    pub start_relation: RelationReference,
    /// Upper bound on returned objects; must be positive.
    pub limit: usize,
    /// Datastore snapshot token; propagated unchanged.
    pub at_revision: Revision,
    /// Remaining redispatch budget.
    pub depth_remaining: u32,
    /// Relations visited along inferred-direct edges of this path.
    pub direct_stack: LookupStack,
    /// Relations visited along tuple-to-userset edges of this path.
    pub ttu_stack: LookupStack,
    /// Sink for structured diagnostic events.
    pub debug_tracer: Arc<dyn DebugTracer>,
    /// Cooperative cancellation handle inherited from the caller.
    pub cancel: CancellationToken,
}

impl LookupRequest {
    /// Creates a root request with default depth budget, empty stacks, a
    /// no-op tracer and a fresh cancellation token.
    pub fn new(
        target_onr: ObjectAndRelation,
        start_relation: RelationReference,
        limit: usize,
        at_revision: Revision,
    ) -> Self {
        Self {
            target_onr,
            start_relation,
            limit,
            at_revision,
            depth_remaining: DEFAULT_DEPTH_REMAINING,
            direct_stack: LookupStack::new(),
            ttu_stack: LookupStack::new(),
            debug_tracer: Arc::new(NullTracer),
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the diagnostic tracer.
    pub fn with_tracer(mut self, tracer: Arc<dyn DebugTracer>) -> Self {
        self.debug_tracer = tracer;
        self
    }

    /// Replaces the cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl fmt::Debug for LookupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupRequest")
            .field("target_onr", &self.target_onr)
            .field("start_relation", &self.start_relation)
            .field("limit", &self.limit)
            .field("at_revision", &self.at_revision)
            .field("depth_remaining", &self.depth_remaining)
            .field("direct_stack", &self.direct_stack)
            .field("ttu_stack", &self.ttu_stack)
            .finish_non_exhaustive()
    }
}
