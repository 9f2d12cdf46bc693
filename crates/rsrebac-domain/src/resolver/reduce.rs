//! Result combinators for concurrent lookup branches.
//!
//! A [`ReduceableLookup`] is a deferred branch: a boxed future yielding
//! one result when driven. The combinators drive a set of branches
//! concurrently inside a single cancellation scope and compose the branch
//! results set-algebraically. Returning from a combinator drops its
//! pending branches, which cancels them.

use futures::future::BoxFuture;
use futures::stream::{FuturesOrdered, FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::{LookupError, LookupResult};
use crate::model::OnrSet;

use super::types::ResolvedObjects;

/// A deferred lookup branch producing one result when driven.
pub type ReduceableLookup<'a> = BoxFuture<'a, LookupResult<ResolvedObjects>>;

/// A branch that immediately resolves to the given objects.
pub fn resolved(objects: ResolvedObjects) -> ReduceableLookup<'static> {
    Box::pin(async move { Ok(objects) })
}

/// A branch that immediately fails with the given error.
pub fn resolve_error(err: LookupError) -> ReduceableLookup<'static> {
    Box::pin(async move { Err(err) })
}

/// Drives a single branch, returning [`LookupError::RequestCanceled`] if
/// the surrounding scope ends first.
///
/// Cancellation that arrives before the result surfaces as the canceled
/// error, hence the biased select in every combinator.
pub async fn lookup_one(
    cancel: &CancellationToken,
    request: ReduceableLookup<'_>,
) -> LookupResult<ResolvedObjects> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LookupError::RequestCanceled),
        result = request => result,
    }
}

/// Union. All branches run concurrently; results are consumed in input
/// order so the union is deterministic. Returns as soon as `limit`
/// objects have accumulated, truncated to `limit`; the first error wins.
/// Remaining branches are cancelled on early return.
pub async fn lookup_any(
    cancel: &CancellationToken,
    limit: usize,
    requests: Vec<ReduceableLookup<'_>>,
) -> LookupResult<ResolvedObjects> {
    let mut pending: FuturesOrdered<_> = requests.into_iter().collect();
    let mut objects = OnrSet::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LookupError::RequestCanceled),
            next = pending.next() => match next {
                Some(Ok(result)) => {
                    objects.update(result);
                    if objects.len() >= limit {
                        return Ok(objects.into_limited_vec(limit));
                    }
                }
                Some(Err(err)) => return Err(err),
                None => break,
            },
        }
    }

    Ok(objects.into_limited_vec(limit))
}

/// Intersection. Branches run concurrently and are folded in completion
/// order; intersection is commutative, so the final set is independent of
/// that order. Returns empty as soon as the accumulator drains; an empty
/// input list is the empty set, error-free.
pub async fn lookup_all(
    cancel: &CancellationToken,
    limit: usize,
    requests: Vec<ReduceableLookup<'_>>,
) -> LookupResult<ResolvedObjects> {
    if requests.is_empty() {
        return Ok(Vec::new());
    }

    let mut pending: FuturesUnordered<_> = requests.into_iter().collect();
    let mut accumulator: Option<OnrSet> = None;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LookupError::RequestCanceled),
            next = pending.next() => match next {
                Some(Ok(result)) => {
                    let subset: OnrSet = result.into_iter().collect();
                    let folded = match accumulator.take() {
                        None => subset,
                        Some(acc) => acc.intersect(&subset),
                    };
                    if folded.is_empty() {
                        return Ok(Vec::new());
                    }
                    accumulator = Some(folded);
                }
                Some(Err(err)) => return Err(err),
                None => break,
            },
        }
    }

    Ok(accumulator
        .map(|set| set.into_limited_vec(limit))
        .unwrap_or_default())
}

/// Relative complement: the first branch minus the union of the rest.
/// The base is identified by position, so arrival order cannot mix it up
/// with the subtrahends. All branches must complete before the difference
/// is taken; any error surfaces immediately and cancels the rest.
///
/// # Panics
///
/// Panics if `requests` is empty; callers must supply at least the base
/// branch.
pub async fn lookup_exclude(
    cancel: &CancellationToken,
    limit: usize,
    mut requests: Vec<ReduceableLookup<'_>>,
) -> LookupResult<ResolvedObjects> {
    assert!(
        !requests.is_empty(),
        "lookup_exclude requires at least the base branch"
    );

    let base = requests.remove(0);
    let mut others: FuturesUnordered<_> = requests.into_iter().collect();

    let base_set = async move { base.await.map(|objects| objects.into_iter().collect::<OnrSet>()) };
    let excluded_set = async move {
        let mut excluded = OnrSet::new();
        while let Some(result) = others.next().await {
            excluded.update(result?);
        }
        Ok::<OnrSet, LookupError>(excluded)
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LookupError::RequestCanceled),
        joined = futures::future::try_join(base_set, excluded_set) => {
            let (base, excluded) = joined?;
            Ok(base.subtract(&excluded).into_limited_vec(limit))
        }
    }
}
