use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use roster_types::Document;
use serde_json::json;
use tracing::info;

use crate::error::ServerResult;
use crate::state::AppState;

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "roster-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Return the whole hosted document.
pub async fn get_roster(State(state): State<AppState>) -> ServerResult<Json<Document>> {
    Ok(Json(state.load()?))
}

/// Replace the hosted document.
pub async fn post_roster(
    State(state): State<AppState>,
    Json(doc): Json<Document>,
) -> ServerResult<StatusCode> {
    state.replace(&doc)?;
    info!(accounts = doc.len(), "roster replaced");
    Ok(StatusCode::NO_CONTENT)
}
