//! Type system for namespace schema lookups with caching.
//!
//! The `NamespaceTypeSystem` answers the schema questions the resolver
//! asks: which relations exist, which subject types a relation admits
//! directly, and whether a given subject type is admissible. Relation
//! lookups are cached with `DashMap` for lock-free concurrent access.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{LookupError, LookupResult};

use super::types::{NamespaceDefinition, RelationDefinition, RelationReference};

/// The answer to "may this subject type appear directly in tuples of the
/// relation?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedDirectRelation {
    /// The subject type is declared as an allowed direct type.
    Valid,
    /// The subject type is not among the declared allowed direct types.
    Invalid,
    /// The relation carries no type information.
    Unknown,
}

/// Cached schema lookups over a single namespace definition.
///
/// Safe to share across tasks; relation lookups are cached on first use.
#[derive(Debug)]
pub struct NamespaceTypeSystem {
    definition: Arc<NamespaceDefinition>,
    relation_cache: DashMap<String, Arc<RelationDefinition>>,
}

impl NamespaceTypeSystem {
    /// Creates a type system over the given namespace definition.
    pub fn new(definition: NamespaceDefinition) -> Self {
        Self {
            definition: Arc::new(definition),
            relation_cache: DashMap::new(),
        }
    }

    /// Returns the underlying namespace definition.
    pub fn definition(&self) -> &NamespaceDefinition {
        &self.definition
    }

    /// Returns true if the namespace defines the relation.
    pub fn has_relation(&self, relation: &str) -> bool {
        self.relation_cache.contains_key(relation) || self.definition.relation(relation).is_some()
    }

    /// Gets a relation definition by name, using the cache if available.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::RelationNotFound`] if the relation does not
    /// exist under this namespace.
    pub fn relation(&self, relation: &str) -> LookupResult<Arc<RelationDefinition>> {
        if let Some(cached) = self.relation_cache.get(relation) {
            return Ok(Arc::clone(cached.value()));
        }

        let found = self
            .definition
            .relation(relation)
            .cloned()
            .map(Arc::new)
            .ok_or_else(|| LookupError::RelationNotFound {
                namespace: self.definition.name.clone(),
                relation: relation.to_string(),
            })?;

        self.relation_cache
            .insert(relation.to_string(), Arc::clone(&found));
        Ok(found)
    }

    /// Returns the subject types allowed to appear directly in tuples of
    /// the relation.
    pub fn allowed_direct_relations(&self, relation: &str) -> LookupResult<Vec<RelationReference>> {
        Ok(self.relation(relation)?.allowed_direct_types.clone())
    }

    /// Answers whether `(subject_namespace, subject_relation)` may appear
    /// directly in tuples of `relation`.
    pub fn is_allowed_direct_relation(
        &self,
        relation: &str,
        subject_namespace: &str,
        subject_relation: &str,
    ) -> LookupResult<AllowedDirectRelation> {
        let definition = self.relation(relation)?;
        if definition.allowed_direct_types.is_empty() {
            return Ok(AllowedDirectRelation::Unknown);
        }

        let allowed = definition
            .allowed_direct_types
            .iter()
            .any(|t| t.namespace == subject_namespace && t.relation == subject_relation);

        Ok(if allowed {
            AllowedDirectRelation::Valid
        } else {
            AllowedDirectRelation::Invalid
        })
    }
}
