//! Shared helpers for the recallwire conformance test suite.
//!
//! Provides [`spawn_node`], which binds a `TcpListener` on an ephemeral
//! port, wires up an in-process service backed by `MemoryStorage`, and
//! returns both the root URL and the underlying storage so tests can seed
//! records without going through the HTTP layer.

use std::sync::Arc;

use recallwire_node::{build_router, config::NodeConfig, storage::memory::MemoryStorage, Storage};

/// Start an ephemeral in-process service and return `(root_url, storage)`.
///
/// The service runs in a background `tokio` task bound to an OS-assigned
/// port on `127.0.0.1`. The returned `String` is the root URL, e.g.
/// `http://127.0.0.1:51234`; the API and every generated link live under
/// `<root>/v1`.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound or the service fails to start.
pub async fn spawn_node() -> (String, Arc<MemoryStorage>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    let root_url = format!("http://{addr}");

    let mem_storage = Arc::new(MemoryStorage::new());
    let storage: Arc<dyn Storage> = Arc::clone(&mem_storage) as Arc<dyn Storage>;

    let mut config = NodeConfig::local(addr);
    config.name = Some("conformance-node".into());
    let registry = recallwire_api::registry().expect("entity declarations");
    let router = build_router(registry, storage, config);

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("conformance node error");
    });

    (root_url, mem_storage)
}
