//! HTTP routes.

use crate::state::AppState;
use crate::{dialogflow, whatsapp};
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route(
            "/webhook/whatsapp",
            get(whatsapp::verify).post(whatsapp::receive),
        )
        .route("/webhook", post(dialogflow::webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root(State(state): State<Arc<AppState>>) -> Json<JsonValue> {
    Json(json!({
        "service": "EasyMo AI Webhook",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "whatsapp_phone_id": state.phone_number_id,
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<JsonValue> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "services": {
            "store": state.store_kind,
            "generation": state.generation_provider,
            "whatsapp": if state.phone_number_id.is_empty() { "unconfigured" } else { "configured" },
        },
    }))
}
