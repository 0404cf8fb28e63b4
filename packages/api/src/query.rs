//! List-endpoint query parameters.
//!
//! `GET` on a collection accepts `limit`, `offset`, an optional `sort` and
//! any number of equality filters keyed by wire field name:
//!
//! ```text
//! GET /v1/recalls?category=toys&sort=-publishedAt&limit=5&offset=10
//! ```
//!
//! Filters naming a field the entity type does not emit are ignored. Every
//! parameter except `total` is echoed into the pagination links.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use recallwire::{Entity, EntityTypeSchema, FieldShape, FieldSpec, PageParams, Value};

const SORT: &str = "sort";

/// Sort direction and key parsed from `sort=[-]<wireName>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub wire_name: String,
    pub descending: bool,
}

impl SortKey {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (wire_name, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        (!wire_name.is_empty()).then(|| Self {
            wire_name: wire_name.to_string(),
            descending,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: PageParams,
    pub sort: Option<SortKey>,
    /// Wire field name → expected value.
    pub filters: BTreeMap<String, String>,
}

impl ListQuery {
    pub fn from_query(query: &BTreeMap<String, String>) -> Self {
        let page = PageParams::from_query(query);
        let filters = page
            .passthrough
            .iter()
            .filter(|(k, _)| k.as_str() != SORT)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            sort: query.get(SORT).and_then(|s| SortKey::parse(s)),
            page,
            filters,
        }
    }

    /// Whether `entity` satisfies every applicable filter.
    ///
    /// List fields match when any element equals the expected value.
    pub fn matches(&self, schema: &EntityTypeSchema, entity: &dyn Entity) -> bool {
        self.filters.iter().all(|(wire, expected)| {
            let Some(spec) = filterable_field(schema, wire) else {
                return true;
            };
            match read(entity, spec) {
                Value::List(items) => items.iter().any(|v| text(v).as_deref() == Some(expected.as_str())),
                v => text(&v).as_deref() == Some(expected.as_str()),
            }
        })
    }

    /// Filter then sort `items` in place.
    pub fn apply<E: Entity>(&self, schema: &EntityTypeSchema, items: &mut Vec<E>) {
        items.retain(|e| self.matches(schema, e));
        let Some(sort) = &self.sort else {
            return;
        };
        let Some(spec) = filterable_field(schema, &sort.wire_name) else {
            return;
        };
        items.sort_by(|a, b| {
            let ord = compare(&read(a, spec), &read(b, spec));
            if sort.descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }
}

// --- helpers -----------------------------------------------------------------

fn filterable_field<'s>(schema: &'s EntityTypeSchema, wire: &str) -> Option<&'s FieldSpec> {
    schema.fields().iter().find(|f| {
        matches!(f.shape, FieldShape::Plain(_)) && f.is_outbound_eligible() && f.wire_key() == wire
    })
}

/// The stored value, or the declared default the way it is rendered.
fn read(entity: &dyn Entity, spec: &FieldSpec) -> Value {
    entity
        .attribute(spec.storage_key())
        .unwrap_or_else(|| spec.default.clone())
}

fn text(value: &Value) -> Option<String> {
    match value.to_json() {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Missing values sort first; numbers compare numerically, everything else
/// by its wire text (RFC 3339 timestamps order correctly as text).
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (a, b) => text(a).cmp(&text(b)),
    }
}
