//! Manufacturer handlers: list and create.

use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use recallwire::{from_wire, Entity, InboundOptions, Record};
use recallwire_api::{ListQuery, MANUFACTURER, RECALL};

use crate::error::AppError;

use super::{new_record, render_many, render_one, render_page, AppState, Document};

/// `GET /v1/manufacturers`: paginated collection with `recallCount`
/// computed from the stored recalls.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Result<Document, AppError> {
    let recalls = state.storage.list(RECALL).await?;
    let mut counts: HashMap<String, i64> = HashMap::new();
    for recall in &recalls {
        if let Some(mid) = recall
            .attribute("manufacturer_id")
            .and_then(|v| v.as_str().map(str::to_string))
        {
            *counts.entry(mid).or_default() += 1;
        }
    }

    let mut manufacturers = state.storage.list(MANUFACTURER).await?;
    for m in &mut manufacturers {
        let count = m
            .id()
            .and_then(|id| counts.get(id.as_str()))
            .copied()
            .unwrap_or(0);
        m.set("recall_count", count);
    }

    let list_query = ListQuery::from_query(&query);
    list_query.apply(state.registry.schema(MANUFACTURER)?, &mut manufacturers);
    let params = list_query.page.with_total(manufacturers.len());
    render_page(&state, MANUFACTURER, &manufacturers, &params, None)
}

/// `POST /v1/manufacturers`: create one manufacturer, or several.
pub async fn create(State(state): State<AppState>, body: String) -> Result<Document, AppError> {
    let decoded = from_wire(
        &state.registry,
        MANUFACTURER,
        &body,
        &InboundOptions::default(),
        new_record(MANUFACTURER),
    )?;
    let single = decoded.is_single();
    let now = Utc::now();

    let mut created: Vec<Record> = decoded.into_vec();
    for manufacturer in &mut created {
        manufacturer.set("created_at", now);
    }
    state.storage.insert_all(&created).await?;
    tracing::info!(count = created.len(), "manufacturers created");

    match created.as_slice() {
        [m] if single => render_one(&state, MANUFACTURER, m, Vec::new(), StatusCode::CREATED),
        _ => render_many(&state, MANUFACTURER, &created, StatusCode::CREATED),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::{
        config::NodeConfig,
        router::build_router,
        storage::{memory::MemoryStorage, Storage},
    };

    use super::*;

    fn build_app(storage: Arc<dyn Storage>) -> axum::Router {
        let registry = recallwire_api::registry().unwrap();
        build_router(registry, storage, NodeConfig::local("127.0.0.1:3000".parse().unwrap()))
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_ignores_computed_and_internal_fields() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let req = Request::builder()
            .method("POST")
            .uri("/v1/manufacturers")
            .header("content-type", "application/vnd.api+json")
            .body(Body::from(
                json!({ "manufacturer": { "name": "Acme", "recallCount": 50, "importBatch": "x" } })
                    .to_string(),
            ))
            .unwrap();
        let resp = build_app(Arc::clone(&storage)).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["attributes"]["name"], json!("Acme"));
        assert_eq!(body["data"]["attributes"]["recallCount"], json!(0));
        assert!(body["data"]["attributes"]["createdAt"].is_string());
        assert!(body["data"]["attributes"].get("importBatch").is_none());

        let stored = storage.list(MANUFACTURER).await.unwrap();
        assert!(stored[0].attribute("import_batch").is_none());
    }

    #[tokio::test]
    async fn plural_create_with_duplicate_ids_stores_nothing() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let req = Request::builder()
            .method("POST")
            .uri("/v1/manufacturers")
            .header("content-type", "application/vnd.api+json")
            .body(Body::from(
                json!({ "manufacturers": [ { "id": "m1", "name": "Acme" }, { "id": "m1", "name": "Globex" } ] })
                    .to_string(),
            ))
            .unwrap();
        let resp = build_app(Arc::clone(&storage)).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(storage.count(MANUFACTURER).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_counts_recalls_per_manufacturer() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage
            .insert(&Record::new(MANUFACTURER).with_id("m1").with("name", "Acme"))
            .await
            .unwrap();
        storage
            .insert(&Record::new(MANUFACTURER).with_id("m2").with("name", "Globex"))
            .await
            .unwrap();
        for (id, mid) in [("r1", "m1"), ("r2", "m1"), ("r3", "m2")] {
            storage
                .insert(&Record::new(RECALL).with_id(id).with("manufacturer_id", mid))
                .await
                .unwrap();
        }

        let req = Request::builder()
            .uri("/v1/manufacturers?sort=-recallCount")
            .body(Body::empty())
            .unwrap();
        let body = body_json(build_app(storage).oneshot(req).await.unwrap()).await;
        assert_eq!(body["data"][0]["id"], json!("m1"));
        assert_eq!(body["data"][0]["attributes"]["recallCount"], json!(2));
        assert_eq!(body["data"][1]["attributes"]["recallCount"], json!(1));
        assert_eq!(body["meta"]["total"], json!(2));
    }
}
