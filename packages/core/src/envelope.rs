//! The envelope builder: top-level JSON:API-style documents.
//!
//! A [`WireDocument`] is built in memory by [`to_wire`] (or [`as_error`]),
//! optionally decorated by [`crate::pagination::apply_pagination`], and
//! rendered to JSON by [`serialize`]. Inbound payloads go the other way
//! through [`from_wire`].
//!
//! # Shapes
//!
//! ```json
//! { "jsonapi": { "version": "1.0" },
//!   "data": { "type": "recalls", "id": "abc123",
//!             "attributes": { "title": "Widget Recall" },
//!             "links": { "self": "https://api.example.com/v1/recalls/abc123" } } }
//! ```
//!
//! A document with exactly one datum renders in single shape, with `meta`
//! and the `self` link nested inside the datum. Anything else renders as a
//! collection with `meta`, `links` and `included` at the top level. A
//! document carrying errors renders only `jsonapi` and `errors`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as Json};

use crate::codec::{from_wire_attributes, meta_attributes, parse_id, to_wire_attributes, InboundOptions, OutboundOptions};
use crate::entity::{Entity, ParentRef};
use crate::error::{InboundFormatError, WireError, WireFormatError};
use crate::schema::SchemaRegistry;
use crate::value::{Attributes, EntityId};

/// Protocol version advertised in every document.
pub const JSONAPI_VERSION: &str = "1.0";

/// One entry of the `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub status: u16,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Navigation links for a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

impl PageLinks {
    pub fn is_empty(&self) -> bool {
        self.self_link.is_none()
            && self.first.is_none()
            && self.prev.is_none()
            && self.next.is_none()
            && self.last.is_none()
    }
}

/// One resource in `data` or `included`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceObject {
    pub id: Option<EntityId>,
    /// Wire type name, e.g. `recalls`.
    pub resource_type: String,
    /// URL path segment of the resource's entity type.
    pub path: String,
    pub attributes: Map<String, Json>,
    pub meta: Map<String, Json>,
}

impl ResourceObject {
    /// Build the resource for an entity using its own registered schema.
    pub fn from_entity(
        registry: &SchemaRegistry,
        entity: &dyn Entity,
        options: &OutboundOptions,
    ) -> Result<Self, WireError> {
        let schema = registry.schema(entity.entity_type())?;
        Ok(Self {
            id: entity.id().cloned(),
            resource_type: schema.plural_name().to_string(),
            path: schema.path().to_string(),
            attributes: to_wire_attributes(registry, entity, options)?,
            meta: Map::new(),
        })
    }

    fn to_json(&self) -> Map<String, Json> {
        let mut out = Map::new();
        out.insert("type".into(), Json::String(self.resource_type.clone()));
        if let Some(id) = &self.id {
            out.insert("id".into(), Json::String(id.to_string()));
        }
        out.insert("attributes".into(), Json::Object(self.attributes.clone()));
        out
    }
}

/// The top-level protocol document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WireDocument {
    pub data: Vec<ResourceObject>,
    pub included: Vec<ResourceObject>,
    pub errors: Vec<ErrorObject>,
    pub links: PageLinks,
    pub meta: Map<String, Json>,
    /// Scope of a sub-collection. Suppresses pagination siblings.
    pub parent: Option<ParentRef>,
    /// Extra segment appended to generated links, e.g. `activate`.
    pub path_suffix: Option<String>,
    /// Absolute prefix for generated links, e.g. `https://api.example.com/v1`.
    pub base_url: String,
    /// Path segment of the collection this document lists.
    pub collection_path: String,
}

impl WireDocument {
    pub fn is_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// More (or fewer) than one datum.
    pub fn is_collection(&self) -> bool {
        self.data.len() != 1
    }

    /// `<base>[/<parent path>/<parent id>]/<collection path>`
    pub fn collection_url(&self) -> String {
        format!("{}/{}", self.scope_prefix(), self.collection_path)
    }

    /// Canonical link to one datum, honoring parent scope and suffix.
    pub fn resource_url(&self, resource: &ResourceObject) -> String {
        let mut url = format!("{}/{}", self.scope_prefix(), resource.path);
        if let Some(id) = &resource.id {
            url.push('/');
            url.push_str(id.as_str());
        }
        if let Some(suffix) = &self.path_suffix {
            url.push('/');
            url.push_str(suffix.trim_matches('/'));
        }
        url
    }

    fn scope_prefix(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        match &self.parent {
            Some(parent) => format!("{base}{}", parent.url_prefix()),
            None => base.to_string(),
        }
    }
}

/// Options for [`to_wire`].
#[derive(Default)]
pub struct ToWireOptions<'a> {
    pub base_url: String,
    pub path_suffix: Option<String>,
    pub outbound: OutboundOptions,
    /// Related resources to render under `included`.
    pub related: Vec<&'a dyn Entity>,
}

impl<'a> ToWireOptions<'a> {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Options for [`serialize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeOptions {
    /// Render collection shape even for a single datum.
    pub collection: bool,
    /// Drop the datum's `self` link in single shape.
    pub exclude_self_link: bool,
}

/// Build a document from one or more entities.
///
/// `entity_type` names the collection (used for links and for empty
/// collections); each datum is rendered with its own entity's schema.
pub fn to_wire<'e, E, I>(
    registry: &SchemaRegistry,
    entity_type: &str,
    entities: I,
    options: &ToWireOptions<'_>,
) -> Result<WireDocument, WireError>
where
    E: Entity + 'e,
    I: IntoIterator<Item = &'e E>,
{
    let mut doc = WireDocument {
        base_url: options.base_url.clone(),
        path_suffix: options.path_suffix.clone(),
        collection_path: registry.path_for(entity_type)?.to_string(),
        ..WireDocument::default()
    };

    for entity in entities {
        if doc.data.is_empty() {
            doc.parent = entity.parent().cloned();
        }
        let mut resource = ResourceObject::from_entity(registry, entity, &options.outbound)?;
        resource.meta = meta_attributes(registry, entity)?;
        doc.data.push(resource);
    }

    for related in &options.related {
        doc.included.push(ResourceObject::from_entity(
            registry,
            *related,
            &OutboundOptions::default(),
        )?);
    }

    Ok(doc)
}

/// A document containing exactly one error and nothing else.
pub fn as_error(status: u16, title: impl Into<String>, detail: Option<String>) -> WireDocument {
    WireDocument {
        errors: vec![ErrorObject {
            status,
            title: title.into(),
            detail,
        }],
        ..WireDocument::default()
    }
}

/// Render a document to plain JSON.
pub fn serialize(doc: &WireDocument, options: &SerializeOptions) -> Json {
    let mut out = Map::new();
    out.insert("jsonapi".into(), json!({ "version": JSONAPI_VERSION }));

    if doc.is_error() {
        out.insert("errors".into(), json!(doc.errors));
        return Json::Object(out);
    }

    if options.collection || doc.is_collection() {
        // Only the first datum's meta survives in collection shape.
        let mut meta = doc.data.first().map(|d| d.meta.clone()).unwrap_or_default();
        meta.extend(doc.meta.clone());
        if !meta.is_empty() {
            out.insert("meta".into(), Json::Object(meta));
        }
        out.insert(
            "data".into(),
            Json::Array(doc.data.iter().map(|d| Json::Object(d.to_json())).collect()),
        );
        if !doc.links.is_empty() {
            out.insert("links".into(), json!(doc.links));
        }
    } else {
        let datum = &doc.data[0];
        let mut rendered = datum.to_json();
        let wants_self = datum.id.is_some() || doc.path_suffix.is_some();
        if wants_self && !options.exclude_self_link {
            rendered.insert("links".into(), json!({ "self": doc.resource_url(datum) }));
        }
        let mut meta = datum.meta.clone();
        meta.extend(doc.meta.clone());
        if !meta.is_empty() {
            rendered.insert("meta".into(), Json::Object(meta));
        }
        out.insert("data".into(), Json::Object(rendered));
    }

    if !doc.included.is_empty() {
        out.insert(
            "included".into(),
            Json::Array(doc.included.iter().map(|r| Json::Object(r.to_json())).collect()),
        );
    }

    Json::Object(out)
}

/// Flat rendering for embedding: `{ id?, ...attributes }`, no wrapper.
pub fn render_flat(resource: &ResourceObject) -> Map<String, Json> {
    let mut out = Map::new();
    if let Some(id) = &resource.id {
        out.insert("id".into(), Json::String(id.to_string()));
    }
    out.extend(resource.attributes.clone());
    out
}

// --- inbound -----------------------------------------------------------------

/// Raw inbound payload: serialized text or an already-parsed value.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Text(&'a str),
    Json(&'a Json),
}

impl<'a> From<&'a str> for Payload<'a> {
    fn from(s: &'a str) -> Self {
        Payload::Text(s)
    }
}

impl<'a> From<&'a String> for Payload<'a> {
    fn from(s: &'a String) -> Self {
        Payload::Text(s)
    }
}

impl<'a> From<&'a Json> for Payload<'a> {
    fn from(v: &'a Json) -> Self {
        Payload::Json(v)
    }
}

/// Result of [`from_wire`]: one entity, or a list (possibly of one).
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<E> {
    One(E),
    Many(Vec<E>),
}

impl<E> Decoded<E> {
    pub fn is_single(&self) -> bool {
        matches!(self, Decoded::One(_))
    }

    pub fn into_vec(self) -> Vec<E> {
        match self {
            Decoded::One(e) => vec![e],
            Decoded::Many(v) => v,
        }
    }
}

/// An `included` item decoded by [`decode_included`].
#[derive(Debug, Clone, PartialEq)]
pub struct IncludedResource {
    pub entity_type: String,
    pub id: Option<EntityId>,
    pub attributes: Attributes,
}

/// Decode an inbound payload into entities.
///
/// `resolve` is called once per datum with the datum's id (if any) and must
/// return the existing entity or a fresh one; the converted inbound
/// attributes are then assigned to it.
pub fn from_wire<'p, E, F>(
    registry: &SchemaRegistry,
    entity_type: &str,
    payload: impl Into<Payload<'p>>,
    options: &InboundOptions,
    mut resolve: F,
) -> Result<Decoded<E>, WireError>
where
    E: Entity,
    F: FnMut(Option<&EntityId>) -> Result<E, WireError>,
{
    let parsed;
    let root = match payload.into() {
        Payload::Json(v) => v,
        Payload::Text(s) => {
            parsed = serde_json::from_str::<Json>(s)
                .map_err(|e| InboundFormatError::InvalidJson(e.to_string()))?;
            &parsed
        }
    };

    let (block, plural) = locate_block(registry, entity_type, root, options)?;
    let data = normalize(block)?;
    let single = !plural && data.len() == 1;

    let mut entities = Vec::with_capacity(data.len());
    for (id, attrs) in data {
        let mut entity = resolve(id.as_ref())?;
        let converted = from_wire_attributes(registry, attrs, entity_type, options)
            .inspect_err(|e| tracing::debug!(entity = entity_type, error = %e, "inbound conversion failed"))?;
        entity.assign(converted);
        entities.push(entity);
    }

    if single {
        if let Some(entity) = entities.pop() {
            return Ok(Decoded::One(entity));
        }
    }
    Ok(Decoded::Many(entities))
}

/// Decode the top-level `included` list of an inbound document.
///
/// Each item's `type` must name a registered entity type by its singular or
/// plural wire name.
pub fn decode_included<'p>(
    registry: &SchemaRegistry,
    payload: impl Into<Payload<'p>>,
    options: &InboundOptions,
) -> Result<Vec<IncludedResource>, WireError> {
    let parsed;
    let root = match payload.into() {
        Payload::Json(v) => v,
        Payload::Text(s) => {
            parsed = serde_json::from_str::<Json>(s)
                .map_err(|e| InboundFormatError::InvalidJson(e.to_string()))?;
            &parsed
        }
    };

    let items = match root.get("included") {
        None | Some(Json::Null) => return Ok(Vec::new()),
        Some(Json::Array(items)) => items,
        Some(_) => return Err(WireFormatError::IncludedNotList.into()),
    };

    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let malformed = |reason: &str| WireFormatError::MalformedIncluded {
            index,
            reason: reason.to_string(),
        };
        let Json::Object(map) = item else {
            return Err(malformed("not an object").into());
        };
        let Some(wire_type) = map.get("type").and_then(Json::as_str) else {
            return Err(malformed("missing `type`").into());
        };
        let entity_type = registry
            .resolve_wire_type(wire_type)
            .ok_or_else(|| WireFormatError::UnresolvableType(wire_type.to_string()))?;
        let attributes = match map.get("attributes") {
            None | Some(Json::Null) => Attributes::new(),
            Some(Json::Object(attrs)) => from_wire_attributes(registry, attrs, entity_type, options)?,
            Some(_) => return Err(malformed("`attributes` is not an object").into()),
        };
        out.push(IncludedResource {
            entity_type: entity_type.to_string(),
            id: parse_id(map.get("id"))?,
            attributes,
        });
    }
    Ok(out)
}

/// Find the data block and whether it was wrapped as a plural collection.
fn locate_block<'j>(
    registry: &SchemaRegistry,
    entity_type: &str,
    root: &'j Json,
    options: &InboundOptions,
) -> Result<(&'j Json, bool), WireError> {
    let schema = registry.schema(entity_type)?;
    let missing = || InboundFormatError::MissingRoot {
        singular: schema.singular_name().to_string(),
        plural: schema.plural_name().to_string(),
    };

    match root {
        Json::Object(map) => {
            if let Some(block) = map.get(schema.plural_name()) {
                Ok((block, true))
            } else if let Some(block) = map.get(schema.singular_name()) {
                Ok((block, false))
            } else if let Some(block) = map.get("data") {
                Ok((block, block.is_array()))
            } else if options.require_root {
                Err(missing().into())
            } else {
                Ok((root, false))
            }
        }
        Json::Array(_) if options.require_root => Err(missing().into()),
        Json::Array(_) => Ok((root, true)),
        _ => Err(InboundFormatError::ExpectedObject("the request body".into()).into()),
    }
}

/// Normalize a data block into `(id, attributes)` pairs.
///
/// Accepts `{ "id", "attributes": {...} }` resource objects and bare
/// attribute objects with an optional `id`.
fn normalize(block: &Json) -> Result<Vec<(Option<EntityId>, &Map<String, Json>)>, WireError> {
    let items: Vec<&Json> = match block {
        Json::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    items
        .into_iter()
        .map(|item| {
            let Json::Object(map) = item else {
                return Err(InboundFormatError::ExpectedObject("each resource".into()).into());
            };
            let id = parse_id(map.get("id"))?;
            match map.get("attributes") {
                Some(Json::Object(attrs)) => Ok((id, attrs)),
                _ => Ok((id, map)),
            }
        })
        .collect()
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::schema::{EntityDeclaration, FieldSpec};
    use crate::value::{FieldType, ScalarKind, Value};

    const BASE: &str = "https://api.example.com/v1";

    fn registry() -> SchemaRegistry {
        let mut r = SchemaRegistry::new();
        r.declare(EntityDeclaration::new("product").field(FieldSpec::field("name").inbound()))
            .unwrap();
        r.declare(
            EntityDeclaration::new("recall")
                .field(FieldSpec::field("title").inbound())
                .field(FieldSpec::field("hazard").inbound())
                .field(FieldSpec::field("relevance").of(FieldType::Scalar(ScalarKind::Number)).meta())
                .field(FieldSpec::embeds_many("products", "product").inbound()),
        )
        .unwrap();
        r.declare(EntityDeclaration::new("manufacturer").field(FieldSpec::field("name").inbound()))
            .unwrap();
        r
    }

    fn title_only_registry() -> SchemaRegistry {
        let mut r = SchemaRegistry::new();
        r.declare(EntityDeclaration::new("recall").field(FieldSpec::field("title").inbound()))
            .unwrap();
        r
    }

    fn resolve_new(entity_type: &'static str) -> impl FnMut(Option<&EntityId>) -> Result<Record, WireError> {
        move |id| {
            let mut r = Record::new(entity_type);
            if let Some(id) = id {
                r.set_id(id.clone());
            }
            Ok(r)
        }
    }

    #[test]
    fn single_resource_without_parent() {
        let r = title_only_registry();
        let recall = Record::new("recall").with_id("abc123").with("title", "Widget Recall");
        let doc = to_wire(&r, "recall", [&recall], &ToWireOptions::with_base_url(BASE)).unwrap();
        let json = serialize(&doc, &SerializeOptions::default());
        assert_eq!(
            json,
            json!({
                "jsonapi": { "version": "1.0" },
                "data": {
                    "type": "recalls",
                    "id": "abc123",
                    "attributes": { "title": "Widget Recall" },
                    "links": { "self": "https://api.example.com/v1/recalls/abc123" }
                }
            })
        );
    }

    #[test]
    fn error_document_has_nothing_else() {
        let json = serialize(&as_error(404, "Not Found", None), &SerializeOptions::default());
        assert_eq!(
            json,
            json!({ "jsonapi": { "version": "1.0" }, "errors": [ { "status": 404, "title": "Not Found" } ] })
        );
        assert!(json.get("data").is_none());
        assert!(json.get("links").is_none());
    }

    #[test]
    fn errors_suppress_data_links_and_included() {
        let r = registry();
        let recall = Record::new("recall").with_id("r1");
        let mut doc = to_wire(&r, "recall", [&recall], &ToWireOptions::with_base_url(BASE)).unwrap();
        doc.links.self_link = Some("x".into());
        doc.errors.push(ErrorObject { status: 422, title: "Unprocessable Entity".into(), detail: Some("bad".into()) });
        let json = serialize(&doc, &SerializeOptions::default());
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["jsonapi", "errors"]);
        assert_eq!(json["errors"][0]["detail"], json!("bad"));
    }

    #[test]
    fn classification_follows_datum_count() {
        let r = registry();
        let a = Record::new("recall").with_id("a").with("title", "A");
        let b = Record::new("recall").with_id("b").with("title", "B");
        let opts = ToWireOptions::with_base_url(BASE);

        let one = serialize(&to_wire(&r, "recall", [&a], &opts).unwrap(), &SerializeOptions::default());
        assert!(one["data"].is_object());

        let two = serialize(&to_wire(&r, "recall", [&a, &b], &opts).unwrap(), &SerializeOptions::default());
        assert!(two["data"].is_array());
        assert_eq!(two["data"].as_array().unwrap().len(), 2);
        assert!(two["data"][0].get("links").is_none());

        let forced = serialize(
            &to_wire(&r, "recall", [&a], &opts).unwrap(),
            &SerializeOptions { collection: true, ..Default::default() },
        );
        assert_eq!(forced["data"].as_array().unwrap().len(), 1);

        let empty: Vec<Record> = Vec::new();
        let none = serialize(&to_wire(&r, "recall", &empty, &opts).unwrap(), &SerializeOptions::default());
        assert_eq!(none["data"], json!([]));
    }

    #[test]
    fn meta_nests_in_single_and_only_first_survives_in_collection() {
        let r = registry();
        let a = Record::new("recall").with_id("a").with("relevance", 7_i64);
        let b = Record::new("recall").with_id("b").with("relevance", 2_i64);
        let opts = ToWireOptions::with_base_url(BASE);

        let single = serialize(&to_wire(&r, "recall", [&a], &opts).unwrap(), &SerializeOptions::default());
        assert_eq!(single["data"]["meta"], json!({ "relevance": 7 }));
        assert!(single["data"]["attributes"].get("relevance").is_none());

        let mut doc = to_wire(&r, "recall", [&a, &b], &opts).unwrap();
        doc.meta.insert("total".into(), json!(2));
        let coll = serialize(&doc, &SerializeOptions::default());
        assert_eq!(coll["meta"], json!({ "relevance": 7, "total": 2 }));
        assert!(coll["data"][1].get("meta").is_none());
    }

    #[test]
    fn self_link_rules() {
        let r = registry();
        let opts = ToWireOptions::with_base_url(BASE);
        let unsaved = Record::new("recall").with("title", "Draft");
        let json = serialize(&to_wire(&r, "recall", [&unsaved], &opts).unwrap(), &SerializeOptions::default());
        assert!(json["data"].get("links").is_none());
        assert!(json["data"].get("id").is_none());

        let with_suffix = ToWireOptions { path_suffix: Some("preview".into()), ..ToWireOptions::with_base_url(BASE) };
        let json = serialize(&to_wire(&r, "recall", [&unsaved], &with_suffix).unwrap(), &SerializeOptions::default());
        assert_eq!(json["data"]["links"]["self"], json!("https://api.example.com/v1/recalls/preview"));

        let saved = Record::new("recall").with_id("r9");
        let json = serialize(
            &to_wire(&r, "recall", [&saved], &opts).unwrap(),
            &SerializeOptions { exclude_self_link: true, ..Default::default() },
        );
        assert!(json["data"].get("links").is_none());
    }

    #[test]
    fn parent_scope_prefixes_self_link() {
        let r = registry();
        let product = Record::new("product")
            .with_id("p1")
            .with("name", "Kettle")
            .with_parent(ParentRef::new("recalls", EntityId::new("r1")));
        let doc = to_wire(&r, "product", [&product], &ToWireOptions::with_base_url(BASE)).unwrap();
        assert!(doc.parent.is_some());
        let json = serialize(&doc, &SerializeOptions::default());
        assert_eq!(json["data"]["links"]["self"], json!("https://api.example.com/v1/recalls/r1/products/p1"));
        assert_eq!(doc.collection_url(), "https://api.example.com/v1/recalls/r1/products");
    }

    #[test]
    fn related_items_render_as_included() {
        let r = registry();
        let recall = Record::new("recall").with_id("r1");
        let maker = Record::new("manufacturer").with_id("m1").with("name", "Acme");
        let opts = ToWireOptions { related: vec![&maker], ..ToWireOptions::with_base_url(BASE) };
        let json = serialize(&to_wire(&r, "recall", [&recall], &opts).unwrap(), &SerializeOptions::default());
        assert_eq!(
            json["included"],
            json!([{ "type": "manufacturers", "id": "m1", "attributes": { "name": "Acme" } }])
        );
    }

    #[test]
    fn related_item_of_unknown_type_is_schema_error() {
        let r = registry();
        let recall = Record::new("recall").with_id("r1");
        let stray = Record::new("widget").with_id("w1");
        let opts = ToWireOptions { related: vec![&stray], ..ToWireOptions::with_base_url(BASE) };
        let err = to_wire(&r, "recall", [&recall], &opts).unwrap_err();
        assert!(matches!(err, WireError::Schema(_)));
    }

    #[test]
    fn flat_rendering_has_no_wrapper() {
        let resource = ResourceObject {
            id: Some(EntityId::new("p1")),
            resource_type: "products".into(),
            path: "products".into(),
            attributes: json!({ "name": "Kettle" }).as_object().unwrap().clone(),
            meta: Map::new(),
        };
        assert_eq!(Json::Object(render_flat(&resource)), json!({ "id": "p1", "name": "Kettle" }));
    }

    #[test]
    fn from_wire_singular_key_yields_one() {
        let r = registry();
        let decoded = from_wire(&r, "recall", r#"{ "recall": { "title": "Widget Recall" } }"#, &InboundOptions::default(), resolve_new("recall")).unwrap();
        let Decoded::One(recall) = decoded else { panic!("expected single") };
        assert_eq!(recall.attribute("title"), Some(Value::from("Widget Recall")));
    }

    #[test]
    fn from_wire_plural_key_yields_list_even_of_one() {
        let r = registry();
        let payload = json!({ "recalls": [ { "id": "r1", "title": "A" } ] });
        let decoded = from_wire(&r, "recall", &payload, &InboundOptions::default(), resolve_new("recall")).unwrap();
        let Decoded::Many(list) = decoded else { panic!("expected list") };
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id().unwrap().as_str(), "r1");
    }

    #[test]
    fn from_wire_data_array_of_one_yields_list() {
        let r = registry();
        let payload = json!({ "data": [ { "type": "recalls", "id": "r1", "attributes": { "title": "A" } } ] });
        let decoded = from_wire(&r, "recall", &payload, &InboundOptions::default(), resolve_new("recall")).unwrap();
        let Decoded::Many(list) = decoded else { panic!("expected list") };
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id().unwrap().as_str(), "r1");
        assert_eq!(list[0].attribute("title"), Some(Value::from("A")));
    }

    #[test]
    fn from_wire_bare_payloads() {
        let r = registry();
        let one = from_wire(&r, "recall", r#"{ "title": "Bare" }"#, &InboundOptions::default(), resolve_new("recall")).unwrap();
        assert!(one.is_single());

        let many = from_wire(&r, "recall", r#"[ { "title": "A" }, { "title": "B" } ]"#, &InboundOptions::default(), resolve_new("recall")).unwrap();
        assert_eq!(many.into_vec().len(), 2);
    }

    #[test]
    fn from_wire_accepts_resource_objects_under_data() {
        let r = registry();
        let payload = r#"{ "data": { "type": "recalls", "id": "r5", "attributes": { "hazard": "fire" } } }"#;
        let decoded = from_wire(&r, "recall", payload, &InboundOptions::default(), resolve_new("recall")).unwrap();
        let Decoded::One(recall) = decoded else { panic!("expected single") };
        assert_eq!(recall.id().unwrap().as_str(), "r5");
        assert_eq!(recall.attribute("hazard"), Some(Value::from("fire")));
    }

    #[test]
    fn from_wire_require_root_rejects_bare_payload() {
        let r = registry();
        let opts = InboundOptions { require_root: true, ..Default::default() };
        let err = from_wire(&r, "recall", r#"{ "title": "Bare" }"#, &opts, resolve_new("recall")).unwrap_err();
        assert_eq!(
            err,
            WireError::Inbound(InboundFormatError::MissingRoot { singular: "recall".into(), plural: "recalls".into() })
        );
    }

    #[test]
    fn from_wire_rejects_invalid_json_and_non_objects() {
        let r = registry();
        let err = from_wire(&r, "recall", "{ nope", &InboundOptions::default(), resolve_new("recall")).unwrap_err();
        assert!(matches!(err, WireError::Inbound(InboundFormatError::InvalidJson(_))));

        let err = from_wire(&r, "recall", r#"{ "recalls": [1, 2] }"#, &InboundOptions::default(), resolve_new("recall")).unwrap_err();
        assert!(matches!(err, WireError::Inbound(InboundFormatError::ExpectedObject(_))));

        let err = from_wire(&r, "recall", "42", &InboundOptions::default(), resolve_new("recall")).unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn partial_update_with_empty_map_changes_nothing() {
        let r = registry();
        let existing = Record::new("recall").with_id("r1").with("title", "Widget Recall").with("hazard", "fire");
        let before = existing.clone();
        let decoded = from_wire(&r, "recall", r#"{ "recall": {} }"#, &InboundOptions::default(), |_| Ok(existing.clone())).unwrap();
        let Decoded::One(after) = decoded else { panic!("expected single") };
        assert_eq!(after, before);
    }

    #[test]
    fn resolver_errors_propagate() {
        let r = registry();
        let err = from_wire::<Record, _>(&r, "recall", r#"{ "id": "missing", "title": "x" }"#, &InboundOptions::default(), |id| {
            Err(WireError::Resolve(format!("recall {} not found", id.unwrap())))
        })
        .unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn included_items_resolve_by_wire_type() {
        let r = registry();
        let payload = json!({
            "data": { "type": "recalls", "attributes": {} },
            "included": [
                { "type": "manufacturers", "id": "m1", "attributes": { "name": "Acme" } },
                { "type": "product", "attributes": { "name": "Kettle" } }
            ]
        });
        let included = decode_included(&r, &payload, &InboundOptions::default()).unwrap();
        assert_eq!(included.len(), 2);
        assert_eq!(included[0].entity_type, "manufacturer");
        assert_eq!(included[0].id, Some(EntityId::new("m1")));
        assert_eq!(included[1].entity_type, "product");
        assert_eq!(included[1].attributes["name"], Value::from("Kettle"));
    }

    #[test]
    fn included_errors_are_wire_format_errors() {
        let r = registry();
        let unknown = json!({ "included": [ { "type": "widgets" } ] });
        assert_eq!(
            decode_included(&r, &unknown, &InboundOptions::default()).unwrap_err(),
            WireError::Format(WireFormatError::UnresolvableType("widgets".into()))
        );

        let not_object = json!({ "included": [ "m1" ] });
        assert!(matches!(
            decode_included(&r, &not_object, &InboundOptions::default()).unwrap_err(),
            WireError::Format(WireFormatError::MalformedIncluded { index: 0, .. })
        ));

        let not_list = json!({ "included": {} });
        assert_eq!(
            decode_included(&r, &not_list, &InboundOptions::default()).unwrap_err(),
            WireError::Format(WireFormatError::IncludedNotList)
        );
    }
}
