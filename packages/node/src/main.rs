//! `recallwire-node`: reference service for the recall-notification API.
//!
//! # Quick start
//!
//! ```sh
//! # In-memory service on the default port:
//! recallwire-node
//!
//! # Custom bind address and public link base:
//! RECALLWIRE_BIND=0.0.0.0:8080 RECALLWIRE_API_BASE=https://api.example.com/v1 recallwire-node
//! ```
//!
//! # Environment variables
//!
//! See [`recallwire_node::config::NodeConfig::from_env`] for the full list.

use std::sync::Arc;

use recallwire_node::{build_router, MemoryStorage, NodeConfig, Storage};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recallwire_node=info,recallwire=info,tower_http=debug".into()),
        )
        .init();

    let config = NodeConfig::from_env().unwrap_or_else(|e| panic!("invalid configuration: {e}"));

    let registry = recallwire_api::registry()
        .unwrap_or_else(|e| panic!("entity declarations are inconsistent: {e}"));

    tracing::info!("storage: in-memory (data will not survive restart)");
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());

    if let Some(name) = &config.name {
        tracing::info!("service name: {name}");
    }
    tracing::info!("links rooted at {}", config.api_base);

    let app = build_router(registry, storage, config.clone());

    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {e}", config.bind_addr));

    axum::serve(listener, app).await.expect("server error");
}
