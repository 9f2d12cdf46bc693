//! Combinator algebra tests.

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;

use super::mocks::onr;
use crate::error::LookupError;
use crate::model::ObjectAndRelation;
use crate::resolver::{
    lookup_all, lookup_any, lookup_exclude, lookup_one, resolve_error, resolved, ReduceableLookup,
    DEFAULT_DEPTH_REMAINING, NO_LIMIT,
};

/// A branch that never completes, for cancellation tests.
fn never() -> ReduceableLookup<'static> {
    Box::pin(futures::future::pending())
}

fn docs(ids: &[&str]) -> Vec<ObjectAndRelation> {
    ids.iter().map(|id| onr("document", id, "viewer")).collect()
}

fn as_set(objects: &[ObjectAndRelation]) -> HashSet<ObjectAndRelation> {
    objects.iter().cloned().collect()
}

// ========== any ==========

#[tokio::test]
async fn test_any_of_nothing_is_empty_and_error_free() {
    let cancel = CancellationToken::new();
    let result = lookup_any(&cancel, NO_LIMIT, vec![]).await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_any_unions_branches() {
    let cancel = CancellationToken::new();
    let result = lookup_any(
        &cancel,
        NO_LIMIT,
        vec![resolved(docs(&["1", "2"])), resolved(docs(&["2", "3"]))],
    )
    .await
    .unwrap();
    assert_eq!(as_set(&result), as_set(&docs(&["1", "2", "3"])));
}

#[tokio::test]
async fn test_any_truncates_at_limit() {
    let cancel = CancellationToken::new();
    let result = lookup_any(
        &cancel,
        2,
        vec![resolved(docs(&["1", "2", "3"])), resolved(docs(&["4"]))],
    )
    .await
    .unwrap();
    assert_eq!(result.len(), 2);
}

#[tokio::test]
async fn test_any_limit_short_circuits_before_errors_behind_it() {
    // The limit is reached by the first branch, so the failing sibling is
    // cancelled rather than observed.
    let cancel = CancellationToken::new();
    let result = lookup_any(
        &cancel,
        2,
        vec![
            resolved(docs(&["1", "2"])),
            resolve_error(LookupError::StorageOperationFailed {
                reason: "boom".to_string(),
            }),
        ],
    )
    .await
    .unwrap();
    assert_eq!(result.len(), 2);
}

#[tokio::test]
async fn test_any_propagates_errors() {
    let cancel = CancellationToken::new();
    let err = lookup_any(
        &cancel,
        NO_LIMIT,
        vec![
            resolved(docs(&["1"])),
            resolve_error(LookupError::StorageOperationFailed {
                reason: "boom".to_string(),
            }),
        ],
    )
    .await
    .unwrap_err();
    assert_eq!(
        err,
        LookupError::StorageOperationFailed {
            reason: "boom".to_string()
        }
    );
}

// ========== all ==========

#[tokio::test]
async fn test_all_of_nothing_is_empty_and_error_free() {
    let cancel = CancellationToken::new();
    let result = lookup_all(&cancel, NO_LIMIT, vec![]).await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_all_of_one_branch_is_that_branch() {
    let cancel = CancellationToken::new();
    let result = lookup_all(&cancel, NO_LIMIT, vec![resolved(docs(&["1", "2"]))])
        .await
        .unwrap();
    assert_eq!(as_set(&result), as_set(&docs(&["1", "2"])));
}

#[tokio::test]
async fn test_all_intersects_branches() {
    let cancel = CancellationToken::new();
    let result = lookup_all(
        &cancel,
        NO_LIMIT,
        vec![
            resolved(docs(&["1", "2", "3"])),
            resolved(docs(&["2", "3", "4"])),
            resolved(docs(&["3", "2"])),
        ],
    )
    .await
    .unwrap();
    assert_eq!(as_set(&result), as_set(&docs(&["2", "3"])));
}

#[tokio::test]
async fn test_all_with_disjoint_branches_is_empty() {
    let cancel = CancellationToken::new();
    let result = lookup_all(
        &cancel,
        NO_LIMIT,
        vec![resolved(docs(&["1"])), resolved(docs(&["2"]))],
    )
    .await
    .unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_all_propagates_errors() {
    let cancel = CancellationToken::new();
    let err = lookup_all(
        &cancel,
        NO_LIMIT,
        vec![
            resolved(docs(&["1"])),
            resolve_error(LookupError::DepthLimitExceeded {
                max_depth: DEFAULT_DEPTH_REMAINING,
            }),
        ],
    )
    .await
    .unwrap_err();
    assert_eq!(
        err,
        LookupError::DepthLimitExceeded {
            max_depth: DEFAULT_DEPTH_REMAINING
        }
    );
}

// ========== exclude ==========

#[tokio::test]
async fn test_exclude_of_one_branch_is_that_branch() {
    let cancel = CancellationToken::new();
    let result = lookup_exclude(&cancel, NO_LIMIT, vec![resolved(docs(&["1", "2"]))])
        .await
        .unwrap();
    assert_eq!(as_set(&result), as_set(&docs(&["1", "2"])));
}

#[tokio::test]
async fn test_exclude_subtracts_the_other_branches() {
    let cancel = CancellationToken::new();
    let result = lookup_exclude(
        &cancel,
        NO_LIMIT,
        vec![
            resolved(docs(&["1", "2", "3", "4"])),
            resolved(docs(&["2"])),
            resolved(docs(&["4", "5"])),
        ],
    )
    .await
    .unwrap();
    assert_eq!(as_set(&result), as_set(&docs(&["1", "3"])));
}

#[tokio::test]
async fn test_exclude_propagates_errors() {
    let cancel = CancellationToken::new();
    let err = lookup_exclude(
        &cancel,
        NO_LIMIT,
        vec![
            resolved(docs(&["1"])),
            resolve_error(LookupError::StorageOperationFailed {
                reason: "boom".to_string(),
            }),
        ],
    )
    .await
    .unwrap_err();
    assert_eq!(
        err,
        LookupError::StorageOperationFailed {
            reason: "boom".to_string()
        }
    );
}

// ========== one & cancellation ==========

#[tokio::test]
async fn test_one_returns_the_single_result() {
    let cancel = CancellationToken::new();
    let result = lookup_one(&cancel, resolved(docs(&["1"]))).await.unwrap();
    assert_eq!(result, docs(&["1"]));
}

#[tokio::test]
async fn test_one_surfaces_cancellation() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = lookup_one(&cancel, resolved(docs(&["1"])))
        .await
        .unwrap_err();
    assert_eq!(err, LookupError::RequestCanceled);
}

#[tokio::test]
async fn test_any_surfaces_cancellation_while_pending() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = lookup_any(&cancel, NO_LIMIT, vec![never()])
        .await
        .unwrap_err();
    assert_eq!(err, LookupError::RequestCanceled);
}

#[tokio::test]
async fn test_all_surfaces_cancellation_while_pending() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = lookup_all(&cancel, NO_LIMIT, vec![never()])
        .await
        .unwrap_err();
    assert_eq!(err, LookupError::RequestCanceled);
}

#[tokio::test]
async fn test_exclude_surfaces_cancellation_while_pending() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = lookup_exclude(&cancel, NO_LIMIT, vec![resolved(docs(&["1"])), never()])
        .await
        .unwrap_err();
    assert_eq!(err, LookupError::RequestCanceled);
}
