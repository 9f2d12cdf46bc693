//! Concurrent reverse-lookup resolution.
//!
//! `ConcurrentLookup` resolves the set of objects of a starting relation
//! that grant a target subject access. One structural pass evaluates the
//! relation (directly from tuples or through its userset rewrite), then a
//! transitive closure loop re-dispatches lookup for every newly
//! discovered object until the set stops growing or the limit is reached.
//! Sub-requests travel through the [`Dispatcher`] so the surrounding
//! infrastructure can route or cache them.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::trace;

use crate::error::{LookupError, LookupResult};
use crate::model::{
    AllowedDirectRelation, NamespaceTypeSystem, ObjectAndRelation, OnrSet, RelationReference,
    SetOperation, SetOperationChild, UsersetRewrite, ELLIPSIS,
};

use super::reduce::{
    lookup_all, lookup_any, lookup_exclude, lookup_one, resolve_error, resolved, ReduceableLookup,
};
use super::trace::DebugTracer;
use super::traits::{Dispatcher, GraphDatastore, NamespaceManager};
use super::types::{LookupRequest, ResolvedObjects, DEFAULT_DEPTH_REMAINING, NO_LIMIT};

/// Which combinator reduces the children of a set operation.
#[derive(Debug, Clone, Copy)]
enum SetReducer {
    Any,
    All,
    Exclude,
}

/// The reverse-lookup resolver.
///
/// Holds no mutable state across requests; per-request state lives in the
/// futures produced by the handlers. The collaborators must be safe for
/// concurrent use by many branches of the same request.
pub struct ConcurrentLookup<D, S, N> {
    dispatcher: D,
    datastore: Arc<S>,
    namespaces: Arc<N>,
}

impl<D, S, N> ConcurrentLookup<D, S, N>
where
    D: Dispatcher + Clone + 'static,
    S: GraphDatastore + 'static,
    N: NamespaceManager + 'static,
{
    /// Creates a new resolver over the given collaborators.
    pub fn new(dispatcher: D, datastore: Arc<S>, namespaces: Arc<N>) -> Self {
        Self {
            dispatcher,
            datastore,
            namespaces,
        }
    }

    /// Resolves the objects of `req.start_relation` granting
    /// `req.target_onr` access, up to `req.limit`.
    pub async fn lookup(&self, req: LookupRequest) -> LookupResult<ResolvedObjects> {
        trace!(target_onr = %req.target_onr, start_relation = %req.start_relation, "lookup");

        if req.depth_remaining == 0 {
            return Err(LookupError::DepthLimitExceeded {
                max_depth: DEFAULT_DEPTH_REMAINING,
            });
        }

        let mut obj_set = OnrSet::new();

        // The target itself resolves trivially when it lives on the start
        // relation. Resolution continues regardless: the target may also
        // be reachable indirectly.
        if req.start_relation.namespace == req.target_onr.namespace
            && req.start_relation.relation == req.target_onr.relation
        {
            obj_set.add(req.target_onr.clone());
            req.debug_tracer.child("(self)");
        }

        let (type_system, _) = self
            .namespaces
            .read_namespace_and_types(&req.start_relation.namespace)
            .await?;

        let relation = type_system.relation(&req.start_relation.relation)?;

        let request = match relation.userset_rewrite.clone() {
            Some(rewrite) => self.process_rewrite(&req, Arc::clone(&type_system), rewrite),
            None => self.lookup_direct(&req, Arc::clone(&type_system)),
        };

        // Structural pass.
        let result = lookup_any(&req.cancel, req.limit, vec![request]).await?;
        obj_set.update(result);

        // Transitive closure: re-dispatch lookup for every object found
        // that is not the target, until nothing new appears.
        let recursive_tracer = req.debug_tracer.child("recursive");
        let mut to_check = obj_set.clone();
        loop {
            if to_check.is_empty() || obj_set.len() >= req.limit {
                break;
            }

            let mut requests = Vec::new();
            for obj in to_check.as_slice() {
                if *obj == req.target_onr {
                    continue;
                }

                requests.push(self.dispatch(LookupRequest {
                    target_onr: obj.clone(),
                    start_relation: req.start_relation.clone(),
                    limit: req.limit.saturating_sub(obj_set.len()),
                    at_revision: req.at_revision,
                    depth_remaining: req.depth_remaining.saturating_sub(1),
                    direct_stack: req.direct_stack.clone(),
                    ttu_stack: req.ttu_stack.clone(),
                    debug_tracer: recursive_tracer.child_onr(obj),
                    cancel: req.cancel.child_token(),
                }));
            }

            if requests.is_empty() {
                break;
            }

            let result = lookup_any(&req.cancel, req.limit, requests).await?;

            let mut newly_found = OnrSet::new();
            for obj in result {
                if obj_set.add(obj.clone()) {
                    newly_found.add(obj);
                }
            }
            to_check = newly_found;
        }

        Ok(obj_set.into_limited_vec(req.limit))
    }

    /// Resolves a relation without a rewrite (or the `_this` marker of a
    /// rewrite) from its tuples.
    ///
    /// Two kinds of branches: the target itself, when its type is an
    /// allowed direct subject of the start relation, is searched with one
    /// reverse query; every other allowed subject type is resolved with an
    /// unbounded sub-lookup whose results are joined back through the
    /// start relation with a forward query, so the returned objects carry
    /// the start relation.
    fn lookup_direct<'a>(
        &'a self,
        req: &LookupRequest,
        type_system: Arc<NamespaceTypeSystem>,
    ) -> ReduceableLookup<'a> {
        let this_tracer = req.debug_tracer.child("_this");

        let is_direct_allowed = match type_system.is_allowed_direct_relation(
            &req.start_relation.relation,
            &req.target_onr.namespace,
            &req.target_onr.relation,
        ) {
            Ok(allowed) => allowed,
            Err(err) => return resolve_error(err),
        };

        let mut requests: Vec<ReduceableLookup<'a>> = Vec::new();

        if is_direct_allowed == AllowedDirectRelation::Valid {
            let req = req.clone();
            requests.push(
                async move {
                    let tuples = self
                        .datastore
                        .reverse_query_tuples_from_subject(
                            &req.target_onr,
                            &req.start_relation.namespace,
                            &req.start_relation.relation,
                            req.at_revision,
                            Some(req.limit),
                        )
                        .await?;

                    let mut objects = OnrSet::new();
                    for tuple in tuples {
                        objects.add(tuple.object_and_relation);
                        if objects.len() >= req.limit {
                            break;
                        }
                    }
                    Ok(objects.into_vec())
                }
                .boxed(),
            );
        }

        let allowed_direct = match type_system.allowed_direct_relations(&req.start_relation.relation)
        {
            Ok(types) => types,
            Err(err) => return resolve_error(err),
        };

        let inferred_tracer = this_tracer.child("inferred");
        let direct_stack = req.direct_stack.with(req.start_relation.clone());

        for allowed_type in allowed_direct {
            if allowed_type.relation == ELLIPSIS {
                continue;
            }

            if allowed_type == req.start_relation {
                continue;
            }

            // Recursive inferred lookups would loop forever.
            if direct_stack.has(&allowed_type) {
                inferred_tracer.child(&format!("skipping {allowed_type}"));
                continue;
            }

            let req = req.clone();
            let direct_stack = direct_stack.clone();
            let tracer = inferred_tracer.child(&format!("incoming {allowed_type}"));
            requests.push(
                async move {
                    let inferred = self.dispatch(LookupRequest {
                        target_onr: req.target_onr.clone(),
                        start_relation: allowed_type,
                        // Inferred lookups cannot be bounded: any
                        // intermediate might join back into the limit.
                        limit: NO_LIMIT,
                        at_revision: req.at_revision,
                        depth_remaining: req.depth_remaining.saturating_sub(1),
                        direct_stack,
                        ttu_stack: req.ttu_stack.clone(),
                        debug_tracer: tracer.clone(),
                        cancel: req.cancel.child_token(),
                    });

                    let result = lookup_any(&req.cancel, NO_LIMIT, vec![inferred]).await?;
                    if result.is_empty() {
                        return Ok(Vec::new());
                    }

                    // Join the intermediates back through the start
                    // relation so the returned objects carry it.
                    let tuples = self
                        .datastore
                        .query_tuples(
                            &req.start_relation.namespace,
                            &req.start_relation.relation,
                            &result,
                            req.at_revision,
                            req.limit,
                        )
                        .await?;

                    let mut objects = OnrSet::new();
                    for tuple in tuples {
                        tracer.child_onr(&tuple.object_and_relation);
                        objects.add(tuple.object_and_relation);
                        if objects.len() >= req.limit {
                            break;
                        }
                    }
                    Ok(objects.into_vec())
                }
                .boxed(),
            );
        }

        if requests.is_empty() {
            return resolved(Vec::new());
        }

        let cancel = req.cancel.clone();
        let limit = req.limit;
        async move { lookup_any(&cancel, limit, requests).await }.boxed()
    }

    /// Evaluates a userset rewrite tree.
    fn process_rewrite<'a>(
        &'a self,
        req: &LookupRequest,
        type_system: Arc<NamespaceTypeSystem>,
        rewrite: UsersetRewrite,
    ) -> ReduceableLookup<'a> {
        match rewrite {
            UsersetRewrite::Union(operation) => self.process_set_operation(
                req,
                req.debug_tracer.child("union"),
                type_system,
                operation,
                SetReducer::Any,
            ),
            UsersetRewrite::Intersection(operation) => self.process_set_operation(
                req,
                req.debug_tracer.child("intersection"),
                type_system,
                operation,
                SetReducer::All,
            ),
            UsersetRewrite::Exclusion(operation) => self.process_set_operation(
                req,
                req.debug_tracer.child("exclusion"),
                type_system,
                operation,
                SetReducer::Exclude,
            ),
        }
    }

    /// Evaluates the children of a set operation and reduces them with
    /// the combinator of the enclosing rewrite variant.
    fn process_set_operation<'a>(
        &'a self,
        req: &LookupRequest,
        tracer: Arc<dyn DebugTracer>,
        type_system: Arc<NamespaceTypeSystem>,
        operation: SetOperation,
        reducer: SetReducer,
    ) -> ReduceableLookup<'a> {
        let mut requests = Vec::with_capacity(operation.children.len());
        for child in operation.children {
            match child {
                SetOperationChild::This => {
                    requests.push(self.lookup_direct(req, Arc::clone(&type_system)));
                }
                SetOperationChild::ComputedUserset { relation } => {
                    requests.push(self.lookup_computed(req, tracer.clone(), relation));
                }
                SetOperationChild::UsersetRewrite(nested) => {
                    requests.push(self.process_rewrite(req, Arc::clone(&type_system), *nested));
                }
                SetOperationChild::TupleToUserset {
                    tupleset_relation,
                    computed_userset_relation,
                } => {
                    requests.push(self.process_tuple_to_userset(
                        req,
                        Arc::clone(&type_system),
                        tupleset_relation,
                        computed_userset_relation,
                    ));
                }
            }
        }

        let cancel = req.cancel.clone();
        let limit = req.limit;
        async move {
            match reducer {
                SetReducer::Any => lookup_any(&cancel, limit, requests).await,
                SetReducer::All => lookup_all(&cancel, limit, requests).await,
                SetReducer::Exclude => lookup_exclude(&cancel, limit, requests).await,
            }
        }
        .boxed()
    }

    /// Resolves a computed userset: the same object under a different
    /// relation, rewritten back to the start relation.
    fn lookup_computed<'a>(
        &'a self,
        req: &LookupRequest,
        tracer: Arc<dyn DebugTracer>,
        relation: String,
    ) -> ReduceableLookup<'a> {
        let req = req.clone();
        async move {
            let computed = self.dispatch(LookupRequest {
                target_onr: req.target_onr.clone(),
                start_relation: RelationReference::new(
                    req.start_relation.namespace.clone(),
                    relation.clone(),
                ),
                limit: req.limit,
                at_revision: req.at_revision,
                depth_remaining: req.depth_remaining.saturating_sub(1),
                direct_stack: req.direct_stack.with(req.start_relation.clone()),
                ttu_stack: req.ttu_stack.clone(),
                debug_tracer: tracer.child(&format!("computed_userset {relation}")),
                cancel: req.cancel.child_token(),
            });

            let result = lookup_one(&req.cancel, computed).await?;

            // Rewrite the found objects to carry this relation.
            let mut rewritten = Vec::with_capacity(result.len());
            for found in result {
                if found.namespace != req.start_relation.namespace {
                    return Err(LookupError::UnexpectedNamespace {
                        onr: found.to_string(),
                        expected: req.start_relation.namespace.clone(),
                    });
                }

                rewritten.push(ObjectAndRelation::new(
                    found.namespace,
                    found.object_id,
                    req.start_relation.relation.clone(),
                ));
            }
            Ok(rewritten)
        }
        .boxed()
    }

    /// Resolves a tuple-to-userset walk: the computed userset relation is
    /// looked up in every subject namespace of the tupleset relation, and
    /// each resolved userset is dereferenced back through the tupleset.
    fn process_tuple_to_userset<'a>(
        &'a self,
        req: &LookupRequest,
        type_system: Arc<NamespaceTypeSystem>,
        tupleset_relation: String,
        computed_userset_relation: String,
    ) -> ReduceableLookup<'a> {
        let req = req.clone();
        async move {
            let current = req.start_relation.clone();

            // Recursive tuple-to-userset walks would loop forever.
            if req.ttu_stack.has(&current) {
                req.debug_tracer.child(&format!("recursive ttu {current}"));
                return Ok(Vec::new());
            }

            let tupleset_types = type_system.allowed_direct_relations(&tupleset_relation)?;

            let ttu_tracer = req
                .debug_tracer
                .child(&format!("ttu {tupleset_relation} <- {computed_userset_relation}"));

            let mut seen_namespaces = HashSet::new();
            let mut branches: Vec<ReduceableLookup<'_>> = Vec::new();
            for direct_type in tupleset_types {
                if !seen_namespaces.insert(direct_type.namespace.clone()) {
                    continue;
                }

                let (subject_type_system, _) = self
                    .namespaces
                    .read_namespace_and_types(&direct_type.namespace)
                    .await?;

                if !subject_type_system.has_relation(&computed_userset_relation) {
                    continue;
                }

                let branch_req = req.clone();
                let branch_type_system = Arc::clone(&type_system);
                let subject_namespace = direct_type.namespace;
                let tupleset = tupleset_relation.clone();
                let computed = computed_userset_relation.clone();
                let current = current.clone();
                let tracer = ttu_tracer.child(&subject_namespace);
                branches.push(
                    async move {
                        let computed_request = self.dispatch(LookupRequest {
                            target_onr: branch_req.target_onr.clone(),
                            start_relation: RelationReference::new(
                                subject_namespace,
                                computed.clone(),
                            ),
                            // A step in the lookup; cannot be bounded.
                            limit: NO_LIMIT,
                            at_revision: branch_req.at_revision,
                            depth_remaining: branch_req.depth_remaining.saturating_sub(1),
                            direct_stack: branch_req.direct_stack.clone(),
                            ttu_stack: branch_req.ttu_stack.with(current),
                            debug_tracer: tracer.clone(),
                            cancel: branch_req.cancel.child_token(),
                        });

                        let result =
                            lookup_any(&branch_req.cancel, NO_LIMIT, vec![computed_request])
                                .await?;
                        if result.is_empty() {
                            return Ok(Vec::new());
                        }

                        // Collect the usersets admissible for the tupleset
                        // query: the resolved relation itself, and the
                        // ellipsis, each when the tupleset relation admits
                        // it directly.
                        let mut usersets = Vec::new();
                        for found in &result {
                            let mut admissible = Vec::new();

                            if branch_type_system.is_allowed_direct_relation(
                                &tupleset,
                                &found.namespace,
                                &found.relation,
                            )? == AllowedDirectRelation::Valid
                            {
                                admissible.push(found.relation.clone());
                            }

                            if found.relation != ELLIPSIS
                                && branch_type_system.is_allowed_direct_relation(
                                    &tupleset,
                                    &found.namespace,
                                    ELLIPSIS,
                                )? == AllowedDirectRelation::Valid
                            {
                                admissible.push(ELLIPSIS.to_string());
                            }

                            for relation in admissible {
                                usersets.push(ObjectAndRelation::new(
                                    found.namespace.clone(),
                                    found.object_id.clone(),
                                    relation,
                                ));
                            }
                        }

                        let mut objects = OnrSet::new();
                        if !usersets.is_empty() {
                            let tuples = self
                                .datastore
                                .query_tuples(
                                    &branch_req.start_relation.namespace,
                                    &tupleset,
                                    &usersets,
                                    branch_req.at_revision,
                                    branch_req.limit,
                                )
                                .await?;

                            for tuple in tuples {
                                if tuple.object_and_relation.namespace
                                    != branch_req.start_relation.namespace
                                {
                                    return Err(LookupError::UnexpectedNamespace {
                                        onr: tuple.object_and_relation.to_string(),
                                        expected: branch_req.start_relation.namespace.clone(),
                                    });
                                }

                                tracer.child_onr(&tuple.object_and_relation);
                                objects.add(ObjectAndRelation::new(
                                    branch_req.start_relation.namespace.clone(),
                                    tuple.object_and_relation.object_id,
                                    branch_req.start_relation.relation.clone(),
                                ));

                                if objects.len() >= branch_req.limit {
                                    break;
                                }
                            }
                        }

                        Ok(objects.into_vec())
                    }
                    .boxed(),
                );
            }

            if branches.is_empty() {
                return Ok(Vec::new());
            }

            lookup_any(&req.cancel, req.limit, branches).await
        }
        .boxed()
    }

    /// Defers a sub-request through the dispatcher.
    fn dispatch(&self, request: LookupRequest) -> ReduceableLookup<'static> {
        let dispatcher = self.dispatcher.clone();
        async move {
            trace!(
                target_onr = %request.target_onr,
                start_relation = %request.start_relation,
                "dispatch lookup"
            );
            dispatcher.dispatch_lookup(request).await
        }
        .boxed()
    }
}

/// An in-process dispatcher: every sub-request is resolved locally with a
/// fresh [`ConcurrentLookup`] over the same collaborators.
#[derive(Debug)]
pub struct LocalDispatcher<S, N> {
    datastore: Arc<S>,
    namespaces: Arc<N>,
}

impl<S, N> LocalDispatcher<S, N> {
    /// Creates a new local dispatcher.
    pub fn new(datastore: Arc<S>, namespaces: Arc<N>) -> Self {
        Self {
            datastore,
            namespaces,
        }
    }
}

impl<S, N> Clone for LocalDispatcher<S, N> {
    fn clone(&self) -> Self {
        Self {
            datastore: Arc::clone(&self.datastore),
            namespaces: Arc::clone(&self.namespaces),
        }
    }
}

#[async_trait]
impl<S, N> Dispatcher for LocalDispatcher<S, N>
where
    S: GraphDatastore + 'static,
    N: NamespaceManager + 'static,
{
    async fn dispatch_lookup(&self, request: LookupRequest) -> LookupResult<ResolvedObjects> {
        if request.depth_remaining == 0 {
            return Err(LookupError::DepthLimitExceeded {
                max_depth: DEFAULT_DEPTH_REMAINING,
            });
        }

        let resolver = ConcurrentLookup::new(
            self.clone(),
            Arc::clone(&self.datastore),
            Arc::clone(&self.namespaces),
        );
        resolver.lookup(request).await
    }
}
