//! Assembles the Axum [`Router`] from all handler modules.

use std::sync::Arc;

use axum::{routing::get, Router};
use recallwire::SchemaRegistry;
use tower_http::trace::TraceLayer;

use crate::{
    config::NodeConfig,
    handlers::{manufacturers, node, not_found, recalls, AppState},
    storage::Storage,
};

/// Build the complete application router with shared state.
pub fn build_router(
    registry: Arc<SchemaRegistry>,
    storage: Arc<dyn Storage>,
    config: NodeConfig,
) -> Router {
    let state = AppState {
        registry,
        storage,
        config,
    };

    Router::new()
        // Discovery
        .route("/.well-known/recallwire", get(node::well_known))
        // Recalls
        .route("/v1/recalls", get(recalls::list).post(recalls::create))
        .route(
            "/v1/recalls/{id}",
            get(recalls::get_by_id)
                .patch(recalls::update)
                .delete(recalls::delete),
        )
        .route("/v1/recalls/{id}/products", get(recalls::products))
        // Manufacturers
        .route(
            "/v1/manufacturers",
            get(manufacturers::list).post(manufacturers::create),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
