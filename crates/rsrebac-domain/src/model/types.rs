//! Core type definitions for the relationship model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The wildcard subject relation, written `...` in tuples. A subject with
/// this relation stands for the object itself rather than a userset.
pub const ELLIPSIS: &str = "...";

/// An object-relation triple (e.g., `document:readme#viewer`).
///
/// Equality is structural across all three fields. The object id is empty
/// only when the value is used as a relation reference; emitted results
/// always carry a non-empty object id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectAndRelation {
    /// The namespace of the object (e.g., "document").
    pub namespace: String,
    /// The object id within the namespace (e.g., "readme").
    pub object_id: String,
    /// The relation on the object (e.g., "viewer").
    pub relation: String,
}

impl ObjectAndRelation {
    /// Creates a new object-relation triple.
    pub fn new(
        namespace: impl Into<String>,
        object_id: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            object_id: object_id.into(),
            relation: relation.into(),
        }
    }

    /// Returns the relation reference `(namespace, relation)` of this triple.
    pub fn relation_reference(&self) -> RelationReference {
        RelationReference::new(self.namespace.clone(), self.relation.clone())
    }
}

impl fmt::Display for ObjectAndRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.namespace, self.object_id, self.relation)
    }
}

/// A `(namespace, relation)` pair used as a schema coordinate and as the
/// key of the cycle-prevention stacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationReference {
    pub namespace: String,
    pub relation: String,
}

impl RelationReference {
    /// Creates a new relation reference.
    pub fn new(namespace: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            relation: relation.into(),
        }
    }
}

impl fmt::Display for RelationReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.namespace, self.relation)
    }
}

/// A stored relationship: `object_and_relation` is granted to `subject`.
///
/// The subject is itself an object-relation triple; its relation is
/// [`ELLIPSIS`] when the subject is a plain object rather than a userset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationTuple {
    pub object_and_relation: ObjectAndRelation,
    pub subject: ObjectAndRelation,
}

impl RelationTuple {
    /// Creates a new relation tuple.
    pub fn new(object_and_relation: ObjectAndRelation, subject: ObjectAndRelation) -> Self {
        Self {
            object_and_relation,
            subject,
        }
    }
}

impl fmt::Display for RelationTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.object_and_relation, self.subject)
    }
}

/// An opaque datastore snapshot token. All reads of a single request use
/// the same revision, and dispatch propagates it unchanged.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Revision(pub u64);

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A namespace definition: a named collection of relations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceDefinition {
    /// The namespace name (e.g., "document").
    pub name: String,
    /// Relations defined under this namespace.
    pub relations: Vec<RelationDefinition>,
}

impl NamespaceDefinition {
    /// Creates a new namespace definition.
    pub fn new(name: impl Into<String>, relations: Vec<RelationDefinition>) -> Self {
        Self {
            name: name.into(),
            relations,
        }
    }

    /// Finds a relation by name.
    pub fn relation(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// A relation definition within a namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationDefinition {
    /// The relation name.
    pub name: String,
    /// The userset rewrite computing this relation's membership, if any.
    /// A relation without a rewrite is resolved directly from tuples.
    pub userset_rewrite: Option<UsersetRewrite>,
    /// Subject types allowed to appear directly in tuples of this relation.
    pub allowed_direct_types: Vec<RelationReference>,
}

impl RelationDefinition {
    /// Creates a direct relation (no rewrite).
    pub fn direct(name: impl Into<String>, allowed_direct_types: Vec<RelationReference>) -> Self {
        Self {
            name: name.into(),
            userset_rewrite: None,
            allowed_direct_types,
        }
    }

    /// Creates a relation computed by a userset rewrite.
    pub fn with_rewrite(
        name: impl Into<String>,
        rewrite: UsersetRewrite,
        allowed_direct_types: Vec<RelationReference>,
    ) -> Self {
        Self {
            name: name.into(),
            userset_rewrite: Some(rewrite),
            allowed_direct_types,
        }
    }
}

/// A userset rewrite: a set-algebraic composition defining a relation's
/// membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UsersetRewrite {
    /// Union of the children.
    Union(SetOperation),
    /// Intersection of the children.
    Intersection(SetOperation),
    /// The first child minus the union of the rest.
    Exclusion(SetOperation),
}

/// An ordered list of rewrite children combined by the enclosing variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOperation {
    pub children: Vec<SetOperationChild>,
}

impl SetOperation {
    pub fn new(children: Vec<SetOperationChild>) -> Self {
        Self { children }
    }
}

/// A single child of a set operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SetOperationChild {
    /// The relation's own tuples (the `_this` marker).
    This,
    /// Another relation on the same object.
    ComputedUserset { relation: String },
    /// A nested rewrite.
    UsersetRewrite(Box<UsersetRewrite>),
    /// Dereference the tupleset relation, then evaluate the computed
    /// userset relation on each dereferenced subject.
    TupleToUserset {
        tupleset_relation: String,
        computed_userset_relation: String,
    },
}
