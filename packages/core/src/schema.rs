//! The field registry: typed, once-per-type declarations of how an entity
//! travels over the wire.
//!
//! An entity type is declared with an [`EntityDeclaration`] (an ordered list
//! of [`FieldSpec`]s plus optional naming overrides) and registered in a
//! [`SchemaRegistry`] at startup. Registration validates every field and
//! computes the derived name sets the codec consults on every request. After
//! bootstrap the registry is frozen behind an `Arc` and only ever read.
//!
//! ```rust
//! use recallwire::schema::{EntityDeclaration, FieldSpec, SchemaRegistry};
//! use recallwire::value::{FieldType, ScalarKind};
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .declare(
//!         EntityDeclaration::new("recall")
//!             .field(FieldSpec::field("title").inbound())
//!             .field(FieldSpec::field("published_at").of(FieldType::Scalar(ScalarKind::Timestamp))),
//!     )
//!     .unwrap();
//! assert_eq!(registry.path_for("recall").unwrap(), "recalls");
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::SchemaError;
use crate::naming::{pluralize, to_wire_name};
use crate::value::{FieldType, ScalarKind, Value};

/// Wire name reserved for the resource identifier.
pub const ID_WIRE_NAME: &str = "id";

/// Whether a field is a plain attribute or an embedded relation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldShape {
    Plain(FieldType),
    /// A single embedded child of the named entity type.
    EmbedsOne(String),
    /// An ordered list of embedded children of the named entity type.
    EmbedsMany(String),
}

/// Direction and visibility flags for a field.
///
/// A field with no flags set is an ordinary read/write attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldFlags {
    /// Client may submit this field on create/update.
    pub inbound: bool,
    /// Computed from relationships; emitted but never accepted from a client.
    pub outbound: bool,
    /// Transient; not a stored attribute.
    pub synthetic: bool,
    /// Present on the entity but never serialized.
    pub internal: bool,
    /// Emitted only in the document's `meta` block.
    pub meta: bool,
    /// Accepted from a client but never emitted.
    pub write_only: bool,
}

/// One declared field of an entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    /// `as` alias. When present it is the storage key and the wire name base.
    pub alias: Option<String>,
    /// Explicit wire name, overriding the camel-cased storage key.
    pub wire_override: Option<String>,
    pub shape: FieldShape,
    pub default: Value,
    pub flags: FieldFlags,
}

impl FieldSpec {
    /// A plain string field.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            wire_override: None,
            shape: FieldShape::Plain(FieldType::default()),
            default: Value::Null,
            flags: FieldFlags::default(),
        }
    }

    /// An embedded single child of `target` entity type.
    pub fn embeds_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            shape: FieldShape::EmbedsOne(target.into()),
            ..Self::field(name)
        }
    }

    /// An embedded ordered list of `target` children.
    pub fn embeds_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            shape: FieldShape::EmbedsMany(target.into()),
            default: Value::List(Vec::new()),
            ..Self::field(name)
        }
    }

    /// Set the semantic type of a plain field. List types default to `[]`.
    pub fn of(mut self, field_type: FieldType) -> Self {
        if field_type.is_list() && self.default.is_null() {
            self.default = Value::List(Vec::new());
        }
        self.shape = FieldShape::Plain(field_type);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn wire_name(mut self, wire: impl Into<String>) -> Self {
        self.wire_override = Some(wire.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    pub fn inbound(mut self) -> Self {
        self.flags.inbound = true;
        self
    }

    pub fn outbound(mut self) -> Self {
        self.flags.outbound = true;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.flags.synthetic = true;
        self
    }

    pub fn internal(mut self) -> Self {
        self.flags.internal = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.flags.meta = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.flags.write_only = true;
        self.flags.inbound = true;
        self
    }

    /// Key the value is stored under on the entity.
    pub fn storage_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Key the value travels under on the wire.
    pub fn wire_key(&self) -> String {
        match &self.wire_override {
            Some(w) => w.clone(),
            None => to_wire_name(self.storage_key()),
        }
    }

    pub fn field_type(&self) -> Option<FieldType> {
        match self.shape {
            FieldShape::Plain(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        match &self.shape {
            FieldShape::Plain(t) => t.is_list(),
            FieldShape::EmbedsMany(_) => true,
            FieldShape::EmbedsOne(_) => false,
        }
    }

    pub fn is_identifier(&self) -> bool {
        self.field_type().map(FieldType::scalar) == Some(ScalarKind::Identifier)
    }

    /// The embedded entity type, if this field is a relation.
    pub fn embedded_target(&self) -> Option<&str> {
        match &self.shape {
            FieldShape::EmbedsOne(t) | FieldShape::EmbedsMany(t) => Some(t),
            FieldShape::Plain(_) => None,
        }
    }

    /// Emitted in the `attributes` block of outbound documents.
    pub fn is_outbound_eligible(&self) -> bool {
        !self.flags.internal && !self.flags.write_only && !self.flags.meta
    }

    /// Accepted from a client by the inbound codec.
    ///
    /// `all_fields` additionally admits outbound-only, synthetic and
    /// identifier fields; internal fields are never admitted.
    pub fn is_inbound_eligible(&self, all_fields: bool) -> bool {
        if self.flags.internal {
            return false;
        }
        all_fields || !(self.flags.outbound || self.flags.synthetic || self.is_identifier())
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() || self.alias.as_deref().is_some_and(|a| a.trim().is_empty())
        {
            return Err(SchemaError::EmptyFieldName(self.name.clone()));
        }
        let f = self.flags;
        if f.inbound && f.outbound {
            return Err(SchemaError::InboundAndOutbound(self.name.clone()));
        }
        if f.internal && f.meta {
            return Err(SchemaError::InternalAndMeta(self.name.clone()));
        }
        if f.write_only && (f.outbound || f.meta) {
            return Err(SchemaError::WriteOnlyEmitted(self.name.clone()));
        }
        Ok(())
    }
}

/// Builder for one entity type's schema.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDeclaration {
    entity_type: String,
    singular: Option<String>,
    plural: Option<String>,
    path: Option<String>,
    fields: Vec<FieldSpec>,
}

impl EntityDeclaration {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            singular: None,
            plural: None,
            path: None,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn fields(mut self, specs: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(specs);
        self
    }

    /// Override the singular wire type name.
    pub fn singular(mut self, name: impl Into<String>) -> Self {
        self.singular = Some(name.into());
        self
    }

    /// Override the plural wire type name.
    pub fn plural(mut self, name: impl Into<String>) -> Self {
        self.plural = Some(name.into());
        self
    }

    /// Override the URL path segment.
    pub fn path(mut self, segment: impl Into<String>) -> Self {
        self.path = Some(segment.into());
        self
    }
}

/// The immutable, validated schema of one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityTypeSchema {
    entity_type: String,
    singular: String,
    plural: String,
    path: String,
    fields: Vec<FieldSpec>,
    array_fields: Vec<String>,
    inbound_fields: Vec<String>,
    outbound_fields: Vec<String>,
    synthetic_fields: Vec<String>,
    serialized_fields: Vec<String>,
    meta_fields: Vec<String>,
}

impl EntityTypeSchema {
    fn build(decl: EntityDeclaration) -> Result<Self, SchemaError> {
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(ID_WIRE_NAME.to_string());

        let mut schema = Self {
            singular: decl
                .singular
                .unwrap_or_else(|| to_wire_name(&decl.entity_type)),
            plural: decl
                .plural
                .unwrap_or_else(|| to_wire_name(&pluralize(&decl.entity_type))),
            path: decl.path.unwrap_or_else(|| pluralize(&decl.entity_type)),
            entity_type: decl.entity_type,
            fields: Vec::with_capacity(decl.fields.len()),
            array_fields: Vec::new(),
            inbound_fields: Vec::new(),
            outbound_fields: Vec::new(),
            synthetic_fields: Vec::new(),
            serialized_fields: Vec::new(),
            meta_fields: Vec::new(),
        };

        for spec in decl.fields {
            spec.validate()?;
            let wire = spec.wire_key();
            if !seen.insert(wire.clone()) {
                return Err(SchemaError::DuplicateWireName {
                    entity: schema.entity_type.clone(),
                    wire,
                });
            }
            if spec.is_list() {
                schema.array_fields.push(spec.storage_key().to_string());
            }
            if spec.flags.inbound {
                schema.inbound_fields.push(wire.clone());
            }
            if spec.flags.outbound {
                schema.outbound_fields.push(wire.clone());
            }
            if spec.flags.synthetic {
                schema.synthetic_fields.push(wire.clone());
            }
            if spec.flags.meta {
                schema.meta_fields.push(wire.clone());
            }
            if !spec.flags.internal && !spec.flags.write_only {
                schema.serialized_fields.push(wire);
            }
            schema.fields.push(spec);
        }

        Ok(schema)
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Singular wire type name, e.g. `productRecall`.
    pub fn singular_name(&self) -> &str {
        &self.singular
    }

    /// Plural wire type name, e.g. `productRecalls`.
    pub fn plural_name(&self) -> &str {
        &self.plural
    }

    /// URL path segment, e.g. `product_recalls`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, storage_key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.storage_key() == storage_key)
    }

    /// Storage keys of list-typed fields (including embeds-many).
    pub fn array_fields(&self) -> &[String] {
        &self.array_fields
    }

    /// Wire names of fields flagged `inbound`.
    pub fn inbound_fields(&self) -> &[String] {
        &self.inbound_fields
    }

    /// Wire names of outbound-only (computed) fields.
    pub fn outbound_fields(&self) -> &[String] {
        &self.outbound_fields
    }

    pub fn synthetic_fields(&self) -> &[String] {
        &self.synthetic_fields
    }

    /// Wire names of every field that is serialized at all.
    pub fn serialized_fields(&self) -> &[String] {
        &self.serialized_fields
    }

    /// Wire names emitted into the document `meta` block.
    pub fn meta_fields(&self) -> &[String] {
        &self.meta_fields
    }
}

/// Write-once-read-many registry of entity type schemas.
///
/// Build it with `&mut` during bootstrap, then share it as
/// `Arc<SchemaRegistry>`; nothing mutates it afterwards.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<EntityTypeSchema>>,
    wire_types: HashMap<String, String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register an entity type.
    ///
    /// Embedded targets must be declared first. Re-declaring an identical
    /// schema returns the existing one; a different schema for an already
    /// registered type is rejected.
    pub fn declare(
        &mut self,
        decl: EntityDeclaration,
    ) -> Result<Arc<EntityTypeSchema>, SchemaError> {
        for spec in &decl.fields {
            if let Some(target) = spec.embedded_target() {
                if target != decl.entity_type && !self.schemas.contains_key(target) {
                    return Err(SchemaError::UnknownEmbeddedType {
                        field: spec.name.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }

        let schema = EntityTypeSchema::build(decl)?;

        if let Some(existing) = self.schemas.get(&schema.entity_type) {
            if **existing == schema {
                tracing::debug!(entity = %schema.entity_type, "schema re-declared unchanged");
                return Ok(Arc::clone(existing));
            }
            return Err(SchemaError::ConflictingDeclaration(schema.entity_type));
        }

        for wire in [&schema.singular, &schema.plural] {
            if let Some(owner) = self.wire_types.get(wire) {
                return Err(SchemaError::WireTypeTaken {
                    entity: schema.entity_type.clone(),
                    wire: wire.clone(),
                    owner: owner.clone(),
                });
            }
        }

        tracing::debug!(
            entity = %schema.entity_type,
            fields = schema.fields.len(),
            "schema declared"
        );

        self.wire_types
            .insert(schema.singular.clone(), schema.entity_type.clone());
        self.wire_types
            .insert(schema.plural.clone(), schema.entity_type.clone());
        let schema = Arc::new(schema);
        self.schemas
            .insert(schema.entity_type.clone(), Arc::clone(&schema));
        Ok(schema)
    }

    pub fn schema(&self, entity_type: &str) -> Result<&Arc<EntityTypeSchema>, SchemaError> {
        self.schemas
            .get(entity_type)
            .ok_or_else(|| SchemaError::UnknownEntityType(entity_type.to_string()))
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.schemas.contains_key(entity_type)
    }

    pub fn path_for(&self, entity_type: &str) -> Result<&str, SchemaError> {
        self.schema(entity_type).map(|s| s.path())
    }

    pub fn singular_name(&self, entity_type: &str) -> Result<&str, SchemaError> {
        self.schema(entity_type).map(|s| s.singular_name())
    }

    pub fn plural_name(&self, entity_type: &str) -> Result<&str, SchemaError> {
        self.schema(entity_type).map(|s| s.plural_name())
    }

    /// Map a singular or plural wire type name back to its entity type.
    pub fn resolve_wire_type(&self, wire_type: &str) -> Option<&str> {
        self.wire_types.get(wire_type).map(String::as_str)
    }
}

// --- tests -------------------------------------------------------------------
