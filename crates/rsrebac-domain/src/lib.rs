//! rsrebac-domain: core reverse-lookup resolution for relationship-based
//! access control.
//!
//! This crate contains:
//! - The relationship data model (object-relation triples, tuples,
//!   namespace definitions and their userset rewrites)
//! - The schema type system with cached relation lookups
//! - The concurrent reverse-lookup resolver and its result combinators
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               rsrebac-domain                │
//! ├─────────────────────────────────────────────┤
//! │  model/    - ONRs, tuples, rewrites,        │
//! │              namespace type system          │
//! │  resolver/ - reverse-lookup engine,         │
//! │              combinators, collaborator      │
//! │              traits                         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Storage and transport are consumed through the collaborator traits
//! exported from [`resolver`]; see the `rsrebac-storage` crate for
//! in-memory implementations.

pub mod error;
pub mod model;
pub mod resolver;

pub use error::{LookupError, LookupResult};
