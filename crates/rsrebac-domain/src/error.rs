//! Domain error types for lookup resolution.

use thiserror::Error;

/// Errors surfaced by the reverse-lookup resolver and its collaborators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The requested namespace does not exist in the schema.
    #[error("namespace not found: {namespace}")]
    NamespaceNotFound { namespace: String },

    /// The requested relation does not exist under its namespace.
    #[error("relation '{relation}' not found under namespace '{namespace}'")]
    RelationNotFound { namespace: String, relation: String },

    /// A datastore query failed.
    #[error("storage operation failed: {reason}")]
    StorageOperationFailed { reason: String },

    /// A sub-lookup resolved an object under a namespace it must not
    /// produce. This is an internal invariant violation.
    #[error("resolved object {onr} has unexpected namespace, expected '{expected}'")]
    UnexpectedNamespace { onr: String, expected: String },

    /// The depth budget of the request reached zero.
    #[error("depth limit exceeded (max: {max_depth})")]
    DepthLimitExceeded { max_depth: u32 },

    /// The surrounding context was canceled before the lookup completed.
    #[error("lookup request canceled")]
    RequestCanceled,
}

/// Result type for lookup-domain operations.
pub type LookupResult<T> = Result<T, LookupError>;
