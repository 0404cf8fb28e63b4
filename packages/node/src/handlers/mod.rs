//! HTTP request handlers for the recall service.
//!
//! Handlers own the transport boundary: they read raw bodies and query maps,
//! hand them to the engine, apply computed fields, and return wire documents.
//! Every failure is turned into a single-error document by [`AppError`].

pub mod manufacturers;
pub mod node;
pub mod recalls;

use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use recallwire::{
    apply_pagination, serialize, to_wire, Entity, EntityId, PageParams, ParentRef, Record,
    SchemaRegistry, SerializeOptions, ToWireOptions, WireError,
};

use crate::{config::NodeConfig, error::AppError, storage::Storage};

/// Media type of every response body.
pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Shared application state threaded through all Axum handlers via [`axum::extract::State`].
#[derive(Clone)]
pub struct AppState {
    /// Frozen after bootstrap; handlers only read it.
    pub registry: Arc<SchemaRegistry>,
    pub storage: Arc<dyn Storage>,
    pub config: NodeConfig,
}

impl AppState {
    fn wire_options<'a>(&self) -> ToWireOptions<'a> {
        ToWireOptions::with_base_url(&self.config.api_base)
    }

    /// Load a record or fail with a 404 naming it.
    pub(crate) async fn find(&self, entity_type: &str, id: &EntityId) -> Result<Record, AppError> {
        self.storage
            .get(entity_type, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{entity_type} {id} not found")))
    }
}

/// A rendered wire document with its HTTP status.
#[derive(Debug)]
pub struct Document {
    status: StatusCode,
    body: serde_json::Value,
}

impl Document {
    pub fn new(status: StatusCode, body: serde_json::Value) -> Self {
        Self { status, body }
    }
}

impl IntoResponse for Document {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, JSONAPI_MEDIA_TYPE)],
            self.body.to_string(),
        )
            .into_response()
    }
}

/// Render one record in single shape, with optional `included` resources.
pub(crate) fn render_one(
    state: &AppState,
    entity_type: &str,
    record: &Record,
    related: Vec<&dyn Entity>,
    status: StatusCode,
) -> Result<Document, AppError> {
    let options = ToWireOptions {
        related,
        ..state.wire_options()
    };
    let doc = to_wire(&state.registry, entity_type, [record], &options)?;
    Ok(Document::new(status, serialize(&doc, &SerializeOptions::default())))
}

/// Render records as an unpaginated collection.
pub(crate) fn render_many(
    state: &AppState,
    entity_type: &str,
    records: &[Record],
    status: StatusCode,
) -> Result<Document, AppError> {
    let doc = to_wire(&state.registry, entity_type, records, &state.wire_options())?;
    let options = SerializeOptions {
        collection: true,
        ..SerializeOptions::default()
    };
    Ok(Document::new(status, serialize(&doc, &options)))
}

/// Render the requested page of `records` with `meta.total` and links.
///
/// `params` must already carry the total. A `parent` marks the page as a
/// scoped sub-collection, even when the page itself is empty.
pub(crate) fn render_page(
    state: &AppState,
    entity_type: &str,
    records: &[Record],
    params: &PageParams,
    parent: Option<ParentRef>,
) -> Result<Document, AppError> {
    let window = params.page().window(records.len());
    let mut doc = to_wire(
        &state.registry,
        entity_type,
        &records[window],
        &state.wire_options(),
    )?;
    if parent.is_some() {
        doc.parent = parent;
    }
    apply_pagination(&mut doc, params);
    let options = SerializeOptions {
        collection: true,
        ..SerializeOptions::default()
    };
    Ok(Document::new(StatusCode::OK, serialize(&doc, &options)))
}

/// Resolver for creates: a fresh record, keeping a client-chosen id if given.
pub(crate) fn new_record(
    entity_type: &'static str,
) -> impl FnMut(Option<&EntityId>) -> Result<Record, WireError> {
    move |id| {
        let id = id.cloned().unwrap_or_else(EntityId::generate);
        Ok(Record::new(entity_type).with_id(id))
    }
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("no such resource".into())
}
