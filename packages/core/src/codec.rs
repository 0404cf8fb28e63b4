//! The attribute codec: entity attributes ↔ wire attribute maps.
//!
//! Both directions walk the entity type's schema in declaration order and
//! consult each [`FieldSpec`]'s flags to decide whether the field travels.
//!
//! # Outbound
//!
//! [`to_wire_attributes`] emits every outbound-eligible field under its wire
//! name. Embedded relations are flattened: an embeds-one child becomes
//! `{ "id": ..., <child attributes> }` with no `type` wrapper, and an
//! embeds-many relation becomes an ordered list of those.
//!
//! # Inbound
//!
//! [`from_wire_attributes`] converts a client-submitted wire map into
//! internal [`Attributes`]. Absent keys are never touched, so the same call
//! serves create and partial update. Embedded relations come back as
//! [`Value::Nested`] / [`Value::NestedList`] under `<relation>_attributes`.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as Json};

use crate::entity::Entity;
use crate::envelope::{render_flat, ResourceObject};
use crate::error::{InboundFormatError, WireError};
use crate::schema::{FieldShape, FieldSpec, SchemaRegistry, ID_WIRE_NAME};
use crate::value::{Attributes, EntityId, FieldType, NestedAttributes, ScalarKind, Value};

/// Suffix appended to a relation's storage key for nested inbound attributes.
pub const NESTED_SUFFIX: &str = "_attributes";

/// Options for [`to_wire_attributes`].
#[derive(Debug, Clone, Default)]
pub struct OutboundOptions {
    /// Fields to leave out, by storage key or wire name.
    pub exclude: Vec<String>,
}

impl OutboundOptions {
    pub fn excluding(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            exclude: fields.into_iter().map(Into::into).collect(),
        }
    }

    fn excludes(&self, spec: &FieldSpec) -> bool {
        let wire = spec.wire_key();
        self.exclude
            .iter()
            .any(|e| e == spec.storage_key() || *e == wire)
    }
}

/// Options for [`from_wire_attributes`] and [`crate::envelope::from_wire`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InboundOptions {
    /// Also accept outbound-only, synthetic and identifier fields.
    /// Used for trusted imports, never for client requests.
    pub all_fields: bool,
    /// Reject payloads not nested under the singular or plural key.
    pub require_root: bool,
}

// --- outbound ----------------------------------------------------------------

/// Serialize an entity's outbound-eligible attributes to a wire map.
pub fn to_wire_attributes(
    registry: &SchemaRegistry,
    entity: &dyn Entity,
    options: &OutboundOptions,
) -> Result<Map<String, Json>, WireError> {
    let schema = registry.schema(entity.entity_type())?;
    let mut out = Map::new();

    for spec in schema.fields() {
        if !spec.is_outbound_eligible() || options.excludes(spec) {
            continue;
        }
        let key = spec.storage_key();
        let value = match &spec.shape {
            FieldShape::Plain(_) => read_value(entity, spec).to_json(),
            FieldShape::EmbedsOne(_) => match entity.embedded_one(key) {
                Some(child) => Json::Object(flatten(registry, child)?),
                None => Json::Null,
            },
            FieldShape::EmbedsMany(_) => Json::Array(
                entity
                    .embedded_many(key)
                    .into_iter()
                    .map(|child| flatten(registry, child).map(Json::Object))
                    .collect::<Result<_, _>>()?,
            ),
        };
        out.insert(spec.wire_key(), value);
    }

    Ok(out)
}

/// Values of the entity's `meta` fields, keyed by wire name.
pub fn meta_attributes(
    registry: &SchemaRegistry,
    entity: &dyn Entity,
) -> Result<Map<String, Json>, WireError> {
    let schema = registry.schema(entity.entity_type())?;
    Ok(schema
        .fields()
        .iter()
        .filter(|spec| spec.flags.meta)
        .map(|spec| (spec.wire_key(), read_value(entity, spec).to_json()))
        .collect())
}

fn read_value(entity: &dyn Entity, spec: &FieldSpec) -> Value {
    entity
        .attribute(spec.storage_key())
        .unwrap_or_else(|| spec.default.clone())
}

fn flatten(registry: &SchemaRegistry, child: &dyn Entity) -> Result<Map<String, Json>, WireError> {
    let resource = ResourceObject::from_entity(registry, child, &OutboundOptions::default())?;
    Ok(render_flat(&resource))
}

// --- inbound -----------------------------------------------------------------

/// Convert a client-submitted wire attribute map into internal attributes.
///
/// Only inbound-eligible fields are read. A key missing from `wire` leaves
/// the field out of the result entirely; `null` or `""` on a list field
/// clears it to `[]`; blank list entries are dropped.
pub fn from_wire_attributes(
    registry: &SchemaRegistry,
    wire: &Map<String, Json>,
    entity_type: &str,
    options: &InboundOptions,
) -> Result<Attributes, WireError> {
    let schema = registry.schema(entity_type)?;
    let mut out = Attributes::new();

    for spec in schema.fields() {
        if !spec.is_inbound_eligible(options.all_fields) {
            continue;
        }
        let wire_key = spec.wire_key();
        let Some(raw) = wire.get(&wire_key) else {
            continue;
        };
        let key = spec.storage_key();
        let converted = match &spec.shape {
            FieldShape::Plain(field_type) => {
                (key.to_string(), convert_plain(&wire_key, *field_type, raw)?)
            }
            FieldShape::EmbedsOne(target) => (
                format!("{key}{NESTED_SUFFIX}"),
                match raw {
                    Json::Null => Value::Null,
                    Json::Object(map) => {
                        Value::Nested(convert_nested(registry, target, map, options)?)
                    }
                    _ => {
                        return Err(InboundFormatError::ExpectedObject(format!("{wire_key:?}")).into())
                    }
                },
            ),
            FieldShape::EmbedsMany(target) => (
                format!("{key}{NESTED_SUFFIX}"),
                Value::NestedList(convert_nested_list(registry, target, &wire_key, raw, options)?),
            ),
        };
        out.insert(converted.0, converted.1);
    }

    Ok(out)
}

fn convert_nested(
    registry: &SchemaRegistry,
    target: &str,
    map: &Map<String, Json>,
    options: &InboundOptions,
) -> Result<NestedAttributes, WireError> {
    Ok(NestedAttributes {
        entity_type: target.to_string(),
        id: parse_id(map.get(ID_WIRE_NAME))?,
        attributes: from_wire_attributes(registry, map, target, options)?,
    })
}

fn convert_nested_list(
    registry: &SchemaRegistry,
    target: &str,
    wire_key: &str,
    raw: &Json,
    options: &InboundOptions,
) -> Result<Vec<NestedAttributes>, WireError> {
    match raw {
        Json::Null => Ok(Vec::new()),
        Json::String(s) if s.trim().is_empty() => Ok(Vec::new()),
        Json::Array(items) => items
            .iter()
            .filter(|item| !is_blank(item))
            .map(|item| match item {
                Json::Object(map) => convert_nested(registry, target, map, options),
                _ => Err(InboundFormatError::ExpectedObject(format!("an item of {wire_key:?}")).into()),
            })
            .collect(),
        other => Err(mismatch(wire_key, "a list", other).into()),
    }
}

fn convert_plain(
    wire_key: &str,
    field_type: FieldType,
    raw: &Json,
) -> Result<Value, InboundFormatError> {
    match field_type {
        FieldType::Scalar(kind) => convert_scalar(wire_key, kind, raw),
        FieldType::List(kind) => match raw {
            Json::Null => Ok(Value::List(Vec::new())),
            Json::String(s) if s.trim().is_empty() => Ok(Value::List(Vec::new())),
            Json::Array(items) => items
                .iter()
                .filter(|item| !is_blank(item))
                .map(|item| convert_scalar(wire_key, kind, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            other => Err(mismatch(wire_key, "a list", other)),
        },
    }
}

fn convert_scalar(wire_key: &str, kind: ScalarKind, raw: &Json) -> Result<Value, InboundFormatError> {
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let converted = match (kind, raw) {
        (ScalarKind::String, Json::String(s)) => Some(Value::String(s.clone())),
        (ScalarKind::Number, Json::Number(n)) => Some(Value::Number(n.clone())),
        (ScalarKind::Number, Json::String(s)) => parse_number(s.trim()).map(Value::Number),
        (ScalarKind::Boolean, Json::Bool(b)) => Some(Value::Boolean(*b)),
        (ScalarKind::Boolean, Json::String(s)) => match s.trim() {
            "true" | "1" => Some(Value::Boolean(true)),
            "false" | "0" => Some(Value::Boolean(false)),
            _ => None,
        },
        (ScalarKind::Timestamp, Json::String(s)) => {
            return DateTime::parse_from_rfc3339(s.trim())
                .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
                .map_err(|_| InboundFormatError::InvalidTimestamp {
                    field: wire_key.to_string(),
                    value: s.clone(),
                });
        }
        (ScalarKind::Identifier, Json::String(s)) => Some(Value::Id(EntityId::new(s.as_str()))),
        (ScalarKind::Identifier, Json::Number(n)) if n.is_u64() || n.is_i64() => {
            Some(Value::Id(EntityId::new(n.to_string())))
        }
        _ => None,
    };
    converted.ok_or_else(|| mismatch(wire_key, kind.expectation(), raw))
}

/// Parse a resource id as sent by a client: string or integer.
pub(crate) fn parse_id(raw: Option<&Json>) -> Result<Option<EntityId>, InboundFormatError> {
    match raw {
        None | Some(Json::Null) => Ok(None),
        Some(Json::String(s)) if s.is_empty() => Ok(None),
        Some(Json::String(s)) => Ok(Some(EntityId::new(s.as_str()))),
        Some(Json::Number(n)) if n.is_u64() || n.is_i64() => Ok(Some(EntityId::new(n.to_string()))),
        Some(other) => Err(InboundFormatError::InvalidId(describe(other).to_string())),
    }
}

fn parse_number(s: &str) -> Option<serde_json::Number> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(i.into());
    }
    s.parse::<f64>().ok().and_then(serde_json::Number::from_f64)
}

fn is_blank(v: &Json) -> bool {
    match v {
        Json::Null => true,
        Json::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn mismatch(wire_key: &str, expected: &'static str, got: &Json) -> InboundFormatError {
    InboundFormatError::TypeMismatch {
        field: wire_key.to_string(),
        expected,
        got: describe(got).to_string(),
    }
}

fn describe(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "a list",
        Json::Object(_) => "an object",
    }
}

// --- tests -------------------------------------------------------------------
