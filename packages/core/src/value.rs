//! Internal attribute values and their semantic types.
//!
//! Entities store attributes as [`Value`]s keyed by storage key. The
//! [`ScalarKind`] / [`FieldType`] pair declares what a field is expected to
//! hold, and drives conversion to and from the wire in [`crate::codec`].

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Internal attribute map: storage key → value.
pub type Attributes = BTreeMap<String, Value>;

/// Opaque entity identifier. Always rendered on the wire as its string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh time-ordered UUIDv7 identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The scalar kinds a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
    Timestamp,
    Identifier,
}

impl ScalarKind {
    /// Human-readable expectation used in type-mismatch errors.
    pub fn expectation(self) -> &'static str {
        match self {
            ScalarKind::String => "a string",
            ScalarKind::Number => "a number",
            ScalarKind::Boolean => "a boolean",
            ScalarKind::Timestamp => "an RFC 3339 timestamp",
            ScalarKind::Identifier => "an identifier string",
        }
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarKind::String => write!(f, "string"),
            ScalarKind::Number => write!(f, "number"),
            ScalarKind::Boolean => write!(f, "boolean"),
            ScalarKind::Timestamp => write!(f, "timestamp"),
            ScalarKind::Identifier => write!(f, "identifier"),
        }
    }
}

/// Declared semantic type of a plain field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Scalar(ScalarKind),
    /// Ordered list of scalars.
    List(ScalarKind),
}

impl FieldType {
    pub fn is_list(self) -> bool {
        matches!(self, FieldType::List(_))
    }

    pub fn scalar(self) -> ScalarKind {
        match self {
            FieldType::Scalar(k) | FieldType::List(k) => k,
        }
    }
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::Scalar(ScalarKind::String)
    }
}

/// A single internal attribute value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    String(String),
    Number(serde_json::Number),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Id(EntityId),
    List(Vec<Value>),
    /// Inbound attributes destined for an embeds-one child.
    Nested(NestedAttributes),
    /// Inbound attributes destined for embeds-many children, in order.
    NestedList(Vec<NestedAttributes>),
}

/// Converted inbound attributes for one embedded child.
///
/// `id` is set when the client referenced an existing child, so the caller
/// can update it in place instead of building a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedAttributes {
    pub entity_type: String,
    pub id: Option<EntityId>,
    pub attributes: Attributes,
}

impl NestedAttributes {
    fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        if let Some(id) = &self.id {
            map.insert("id".into(), serde_json::Value::String(id.to_string()));
        }
        for (k, v) in &self.attributes {
            map.insert(k.clone(), v.to_json());
        }
        serde_json::Value::Object(map)
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Id(id) => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Render as a wire JSON value.
    ///
    /// Timestamps use RFC 3339 in UTC with a `Z` suffix and only as many
    /// sub-second digits as needed; identifiers become plain strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::String(s) => Json::String(s.clone()),
            Value::Number(n) => Json::Number(n.clone()),
            Value::Boolean(b) => Json::Bool(*b),
            Value::Timestamp(t) => Json::String(format_timestamp(t)),
            Value::Id(id) => Json::String(id.to_string()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Nested(nested) => nested.to_json(),
            Value::NestedList(list) => {
                Json::Array(list.iter().map(NestedAttributes::to_json).collect())
            }
        }
    }
}

/// Canonical wire rendering of a timestamp.
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Value::Id(id)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_render_in_utc_with_z() {
        let t = Utc.with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap();
        assert_eq!(Value::from(t).to_json(), serde_json::json!("2026-02-18T12:00:00Z"));
    }

    #[test]
    fn ids_render_as_strings() {
        let v = Value::Id(EntityId::new("abc123"));
        assert_eq!(v.to_json(), serde_json::json!("abc123"));
    }

    #[test]
    fn generated_ids_are_uuid_v7() {
        let id = EntityId::generate();
        let parsed = uuid::Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[test]
    fn field_type_helpers() {
        assert!(FieldType::List(ScalarKind::String).is_list());
        assert_eq!(FieldType::List(ScalarKind::Number).scalar(), ScalarKind::Number);
        assert_eq!(FieldType::default(), FieldType::Scalar(ScalarKind::String));
    }
}
