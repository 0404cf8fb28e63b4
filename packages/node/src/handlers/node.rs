//! Service discovery handler: `GET /.well-known/recallwire`.

use axum::{extract::State, Json};
use recallwire::JSONAPI_VERSION;
use recallwire_api::{MANUFACTURER, RECALL};
use serde::Serialize;

use super::AppState;

/// The discovery document.
///
/// ```json
/// {
///   "name": "Recall Notices",
///   "apiBase": "https://api.example.com/v1",
///   "jsonapiVersion": "1.0",
///   "collections": { "recall": "https://api.example.com/v1/recalls" }
/// }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub api_base: String,
    pub jsonapi_version: &'static str,
    /// Entity type → collection URL, for every type with endpoints.
    pub collections: std::collections::BTreeMap<String, String>,
}

/// `GET /.well-known/recallwire`
pub async fn well_known(State(state): State<AppState>) -> Json<ServiceInfo> {
    let cfg = &state.config;
    let collections = [RECALL, MANUFACTURER]
        .into_iter()
        .filter_map(|t| {
            let path = state.registry.path_for(t).ok()?;
            Some((t.to_string(), format!("{}/{path}", cfg.api_base)))
        })
        .collect();
    Json(ServiceInfo {
        name: cfg.name.clone(),
        api_base: cfg.api_base.clone(),
        jsonapi_version: JSONAPI_VERSION,
        collections,
    })
}
