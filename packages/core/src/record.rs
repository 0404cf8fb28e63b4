//! A generic, map-backed [`Entity`].
//!
//! `Record` is what the reference node stores and what tests build fixtures
//! from. Domain crates with hand-written structs implement [`Entity`]
//! directly instead.

use std::collections::BTreeMap;

use crate::codec::NESTED_SUFFIX;
use crate::entity::{Entity, ParentRef};
use crate::value::{Attributes, EntityId, NestedAttributes, Value};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    entity_type: String,
    id: Option<EntityId>,
    attributes: Attributes,
    embedded_one: BTreeMap<String, Record>,
    embedded_many: BTreeMap<String, Vec<Record>>,
    parent: Option<ParentRef>,
}

impl Record {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, relation: impl Into<String>, child: Record) -> Self {
        self.embedded_one.insert(relation.into(), child);
        self
    }

    pub fn with_children(mut self, relation: impl Into<String>, children: Vec<Record>) -> Self {
        self.embedded_many.insert(relation.into(), children);
        self
    }

    pub fn with_parent(mut self, parent: ParentRef) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn child(&self, relation: &str) -> Option<&Record> {
        self.embedded_one.get(relation)
    }

    pub fn children(&self, relation: &str) -> &[Record] {
        self.embedded_many
            .get(relation)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn assign_one(&mut self, relation: String, nested: Option<NestedAttributes>) {
        let Some(nested) = nested else {
            self.embedded_one.remove(&relation);
            return;
        };
        let child = self
            .embedded_one
            .entry(relation)
            .or_insert_with(|| Record::new(&nested.entity_type));
        if let Some(id) = nested.id {
            child.id = Some(id);
        }
        child.assign(nested.attributes);
    }

    /// The submitted list replaces the relation in order. Items whose `id`
    /// matches an existing child update that child; the rest are new.
    fn assign_many(&mut self, relation: String, items: Vec<NestedAttributes>) {
        let mut existing = self.embedded_many.remove(&relation).unwrap_or_default();
        let mut next = Vec::with_capacity(items.len());
        for nested in items {
            let reused = nested
                .id
                .as_ref()
                .and_then(|id| existing.iter().position(|c| c.id.as_ref() == Some(id)))
                .map(|pos| existing.remove(pos));
            let mut child = reused.unwrap_or_else(|| {
                let mut c = Record::new(&nested.entity_type);
                c.id = Some(nested.id.clone().unwrap_or_else(EntityId::generate));
                c
            });
            child.assign(nested.attributes);
            next.push(child);
        }
        self.embedded_many.insert(relation, next);
    }
}

impl Entity for Record {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn attribute(&self, key: &str) -> Option<Value> {
        self.attributes.get(key).cloned()
    }

    fn embedded_one(&self, relation: &str) -> Option<&dyn Entity> {
        self.embedded_one.get(relation).map(|c| c as &dyn Entity)
    }

    fn embedded_many(&self, relation: &str) -> Vec<&dyn Entity> {
        self.children(relation)
            .iter()
            .map(|c| c as &dyn Entity)
            .collect()
    }

    fn parent(&self) -> Option<&ParentRef> {
        self.parent.as_ref()
    }

    fn assign(&mut self, attributes: Attributes) {
        for (key, value) in attributes {
            let relation = key.strip_suffix(NESTED_SUFFIX).map(str::to_string);
            match (relation, value) {
                (Some(relation), Value::Nested(nested)) => self.assign_one(relation, Some(nested)),
                (Some(relation), Value::NestedList(items)) => self.assign_many(relation, items),
                (Some(relation), Value::Null) => self.assign_one(relation, None),
                (_, value) => {
                    self.attributes.insert(key, value);
                }
            }
        }
    }
}
