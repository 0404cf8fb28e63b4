//! The seam between domain objects and the engine.
//!
//! The engine never knows concrete entity types. It reads and writes through
//! [`Entity`], looking up the matching [`EntityTypeSchema`] in the registry
//! by [`Entity::entity_type`].
//!
//! [`EntityTypeSchema`]: crate::schema::EntityTypeSchema

use crate::value::{Attributes, EntityId, Value};

/// A single-level-up reference to the entity that scopes this one.
///
/// Used to build hierarchical URLs (`/recalls/{id}/products`) and to mark a
/// document as a scoped sub-collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    /// URL path segment of the parent's entity type.
    pub path: String,
    pub id: EntityId,
    /// The parent's own parent, if any.
    pub parent: Option<Box<ParentRef>>,
}

impl ParentRef {
    pub fn new(path: impl Into<String>, id: EntityId) -> Self {
        Self {
            path: path.into(),
            id,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: ParentRef) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// The top-most ancestor.
    pub fn root(&self) -> &ParentRef {
        let mut current = self;
        while let Some(p) = &current.parent {
            current = p;
        }
        current
    }

    /// URL prefix, outermost ancestor first: `/a/1/b/2`.
    pub fn url_prefix(&self) -> String {
        let own = format!("/{}/{}", self.path, self.id);
        match &self.parent {
            Some(p) => format!("{}{own}", p.url_prefix()),
            None => own,
        }
    }
}

/// A domain object the engine can serialize and populate.
pub trait Entity {
    /// Registered entity type name, e.g. `"recall"`.
    fn entity_type(&self) -> &str;

    fn id(&self) -> Option<&EntityId>;

    /// Current value stored under `key`, or `None` when unset.
    fn attribute(&self, key: &str) -> Option<Value>;

    /// The embedded single child stored under `relation`.
    fn embedded_one(&self, relation: &str) -> Option<&dyn Entity>;

    /// The embedded children stored under `relation`, in order.
    fn embedded_many(&self, relation: &str) -> Vec<&dyn Entity>;

    fn parent(&self) -> Option<&ParentRef> {
        None
    }

    /// Apply inbound attributes. Keys absent from `attributes` are untouched.
    fn assign(&mut self, attributes: Attributes);
}
