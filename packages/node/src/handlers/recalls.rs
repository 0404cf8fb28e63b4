//! Recall handlers: list, create, retrieve, update, delete, and the scoped
//! product sub-collection.
//!
//! # Computed fields
//!
//! On every write the handler stamps `createdAt`/`updatedAt`, bumps the
//! `revision` meta counter, and recomputes `affectedUnits` from the embedded
//! products. None of these are accepted from clients.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use recallwire::{
    from_wire, Decoded, Entity, EntityId, InboundOptions, PageParams, ParentRef, Record,
};
use recallwire_api::{ListQuery, MANUFACTURER, PRODUCT, RECALL};

use crate::{error::AppError, storage::StorageError};

use super::{new_record, render_many, render_one, render_page, AppState, Document};

// ---------------------------------------------------------------------------
// GET /v1/recalls
// ---------------------------------------------------------------------------

/// `GET /v1/recalls`: filtered, sorted, paginated collection.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Result<Document, AppError> {
    let list_query = ListQuery::from_query(&query);
    let mut recalls = state.storage.list(RECALL).await?;
    list_query.apply(state.registry.schema(RECALL)?, &mut recalls);
    let params = list_query.page.with_total(recalls.len());
    render_page(&state, RECALL, &recalls, &params, None)
}

// ---------------------------------------------------------------------------
// POST /v1/recalls
// ---------------------------------------------------------------------------

/// `POST /v1/recalls`: create one recall, or several from a plural payload.
///
/// Responds 201 with the stored recall(s) in the same cardinality as the
/// request.
pub async fn create(State(state): State<AppState>, body: String) -> Result<Document, AppError> {
    let decoded = from_wire(
        &state.registry,
        RECALL,
        &body,
        &InboundOptions::default(),
        new_record(RECALL),
    )?;
    let single = decoded.is_single();
    let now = Utc::now();

    let mut created = decoded.into_vec();
    for recall in &mut created {
        stamp(recall, now, None);
    }
    state.storage.insert_all(&created).await?;
    for recall in &created {
        tracing::info!(id = %display_id(recall), "recall created");
    }

    match created.as_slice() {
        [recall] if single => render_one(&state, RECALL, recall, Vec::new(), StatusCode::CREATED),
        _ => render_many(&state, RECALL, &created, StatusCode::CREATED),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/recalls/{id}
// ---------------------------------------------------------------------------

/// `GET /v1/recalls/{id}`: one recall, with its manufacturer under
/// `included` when the referenced manufacturer exists.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Document, AppError> {
    let recall = state.find(RECALL, &EntityId::new(id)).await?;
    let manufacturer = match manufacturer_id(&recall) {
        Some(mid) => state.storage.get(MANUFACTURER, &mid).await?,
        None => None,
    };
    let related: Vec<&dyn Entity> = manufacturer.iter().map(|m| m as &dyn Entity).collect();
    render_one(&state, RECALL, &recall, related, StatusCode::OK)
}

// ---------------------------------------------------------------------------
// PATCH /v1/recalls/{id}
// ---------------------------------------------------------------------------

/// `PATCH /v1/recalls/{id}`: partial update.
///
/// Only attributes present in the payload change. An `id` in the body must
/// match the URL.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> Result<Document, AppError> {
    let id = EntityId::new(id);
    let existing = state.find(RECALL, &id).await?;
    let previous_revision = revision(&existing);

    let mut mismatched = None;
    let decoded = from_wire(
        &state.registry,
        RECALL,
        &body,
        &InboundOptions::default(),
        |given| {
            if let Some(given) = given.filter(|g| **g != id) {
                mismatched = Some(given.clone());
            }
            Ok(existing.clone())
        },
    )?;
    if let Some(other) = mismatched {
        return Err(AppError::BadRequest(format!(
            "body id {other} does not match URL id {id}"
        )));
    }
    let Decoded::One(mut recall) = decoded else {
        return Err(AppError::BadRequest("expected a single recall".into()));
    };

    stamp(&mut recall, Utc::now(), Some(previous_revision));
    state.storage.update(&recall).await?;
    render_one(&state, RECALL, &recall, Vec::new(), StatusCode::OK)
}

// ---------------------------------------------------------------------------
// DELETE /v1/recalls/{id}
// ---------------------------------------------------------------------------

/// `DELETE /v1/recalls/{id}`: 204 on success, 404 error document if absent.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = EntityId::new(id);
    state
        .storage
        .delete(RECALL, &id)
        .await
        .map_err(|e| match e {
            StorageError::NotFound => AppError::NotFound(format!("{RECALL} {id} not found")),
            other => other.into(),
        })?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /v1/recalls/{id}/products
// ---------------------------------------------------------------------------

/// `GET /v1/recalls/{id}/products`: the recall's embedded products as a
/// scoped sub-collection. Scoped pages carry only a `self` link.
pub async fn products(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Result<Document, AppError> {
    let id = EntityId::new(id);
    let recall = state.find(RECALL, &id).await?;
    let parent = ParentRef::new(state.registry.path_for(RECALL)?, id);
    let products: Vec<Record> = recall
        .children("products")
        .iter()
        .map(|p| p.clone().with_parent(parent.clone()))
        .collect();
    let params = PageParams::from_query(&query).with_total(products.len());
    render_page(&state, PRODUCT, &products, &params, Some(parent))
}

// --- helpers -----------------------------------------------------------------

/// Apply server-computed fields. `previous_revision` is `None` on create.
fn stamp(recall: &mut Record, now: DateTime<Utc>, previous_revision: Option<i64>) {
    if previous_revision.is_none() {
        recall.set("created_at", now);
    }
    recall.set("updated_at", now);
    recall.set("revision", previous_revision.unwrap_or(0) + 1);

    let affected: i64 = recall
        .children("products")
        .iter()
        .filter_map(|p| p.attribute("units_affected").and_then(|v| v.as_i64()))
        .sum();
    recall.set("affected_units", affected);
}

fn revision(recall: &Record) -> i64 {
    recall
        .attribute("revision")
        .and_then(|v| v.as_i64())
        .unwrap_or(0)
}

fn manufacturer_id(recall: &Record) -> Option<EntityId> {
    recall
        .attribute("manufacturer_id")
        .and_then(|v| v.as_str().map(EntityId::from))
}

fn display_id(record: &Record) -> String {
    record.id().map(ToString::to_string).unwrap_or_default()
}
