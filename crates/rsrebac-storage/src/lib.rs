//! rsrebac-storage: storage backends for the rsrebac resolver.
//!
//! Currently provides in-memory, revision-aware implementations of the
//! domain's `GraphDatastore` and `NamespaceManager` traits, suitable for
//! tests and embedded use.

pub mod memory;

pub use memory::{MemoryGraphDatastore, MemoryNamespaceManager};
