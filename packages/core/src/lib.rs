//! Declarative entity ↔ wire serialization for the recall-notification API.
//!
//! Entity types declare their fields once at startup; the engine then turns
//! entities into JSON:API-flavored documents and client payloads back into
//! attribute maps, enforcing per-field direction rules along the way.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`naming`] | snake_case ↔ lowerCamelCase translation and pluralization |
//! | [`schema`] | Field declarations and the frozen [`SchemaRegistry`] |
//! | [`value`] | Internal attribute values: [`Value`], [`EntityId`], [`FieldType`] |
//! | [`entity`] | The [`Entity`] trait the engine reads and writes through |
//! | [`record`] | [`Record`], a generic map-backed entity |
//! | [`codec`] | Attribute conversion in both directions |
//! | [`envelope`] | Document building ([`to_wire`]), rendering ([`serialize`]) and decoding ([`from_wire`]) |
//! | [`pagination`] | Limit/offset bounds and navigation links |
//! | [`error`] | [`SchemaError`], [`InboundFormatError`], [`WireFormatError`], [`WireError`] |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use recallwire::{
//!     serialize, to_wire, EntityDeclaration, FieldSpec, Record, SchemaRegistry,
//!     SerializeOptions, ToWireOptions,
//! };
//!
//! let mut registry = SchemaRegistry::new();
//! registry.declare(EntityDeclaration::new("recall").field(FieldSpec::field("title").inbound()))?;
//!
//! let recall = Record::new("recall").with_id("abc123").with("title", "Widget Recall");
//! let doc = to_wire(&registry, "recall", [&recall], &ToWireOptions::with_base_url("https://api.example.com/v1"))?;
//! let json = serialize(&doc, &SerializeOptions::default());
//! ```

pub mod codec;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod naming;
pub mod pagination;
pub mod record;
pub mod schema;
pub mod value;

pub use codec::{from_wire_attributes, to_wire_attributes, InboundOptions, OutboundOptions};
pub use entity::{Entity, ParentRef};
pub use envelope::{
    as_error, decode_included, from_wire, render_flat, serialize, to_wire, Decoded, ErrorObject,
    IncludedResource, PageLinks, Payload, ResourceObject, SerializeOptions, ToWireOptions,
    WireDocument, JSONAPI_VERSION,
};
pub use error::{InboundFormatError, SchemaError, WireError, WireFormatError};
pub use pagination::{apply_pagination, Page, PageParams, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use record::Record;
pub use schema::{EntityDeclaration, EntityTypeSchema, FieldFlags, FieldShape, FieldSpec, SchemaRegistry};
pub use value::{Attributes, EntityId, FieldType, NestedAttributes, ScalarKind, Value};
