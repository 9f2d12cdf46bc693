//! Property-based tests for the ONR set primitive.
