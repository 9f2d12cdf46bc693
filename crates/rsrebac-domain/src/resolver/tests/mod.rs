//! Tests for the reverse-lookup resolver.
//!
//! Organized by functionality:
//! - Combinator algebra (any / all / exclude / one)
//! - Direct resolution and self-matches
//! - Rewrites (union, intersection, exclusion, computed usersets)
//! - Tuple-to-userset walks and transitive closure
//! - Safety (depth budget, cycle stacks, cancellation)


#[cfg(test)]
mod reduce_tests;
