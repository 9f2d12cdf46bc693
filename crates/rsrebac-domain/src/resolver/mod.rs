//! Reverse-lookup resolution engine.
//!
//! The resolver answers "which objects of this relation grant the target
//! subject access?" by walking the userset graph backwards: tuples stored
//! in the datastore plus the set-algebraic rewrites declared in the
//! schema. Branches fan out concurrently and are reduced by the result
//! combinators; two independent visited stacks cut structural cycles and
//! a per-request depth budget bounds recursion.
//!
//! # Architecture
//!
//! - **Deferred branches**: every handler produces a [`ReduceableLookup`],
//!   a boxed future yielding one result when driven. Combinators drive
//!   sets of branches concurrently and dropping a combinator cancels its
//!   remaining branches.
//! - **Cycle prevention**: copy-on-extend [`LookupStack`]s track the
//!   relations visited along the inferred-direct and tuple-to-userset
//!   dimensions of the current path; revisiting one yields the empty set.
//! - **Transitive closure**: after the structural pass, newly discovered
//!   objects are re-dispatched (possibly to a peer) until the result set
//!   stops growing or the limit is reached.

mod lookup;
mod reduce;
mod stack;
#[cfg(test)]
mod stack_proptest;
mod trace;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use lookup::{ConcurrentLookup, LocalDispatcher};
pub use reduce::{
    lookup_all, lookup_any, lookup_exclude, lookup_one, resolve_error, resolved, ReduceableLookup,
};
pub use stack::LookupStack;
pub use trace::{DebugTracer, EventTracer, NullTracer};
pub use traits::{Dispatcher, GraphDatastore, NamespaceManager};
pub use types::{LookupRequest, ResolvedObjects, DEFAULT_DEPTH_REMAINING, NO_LIMIT};
