use std::sync::Arc;

use crate::main_lib::AppState;
use axum::{extract::State, routing::get, Json, Router};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    rate_source: &'static str,
    cached_rates: usize,
    watched_tokens: Vec<String>,
    default_token: String,
    /// Rate quotes fall back to when the source has nothing.
    fallback_rate: Decimal,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut watched_tokens: Vec<String> = state.subscriptions.keys().cloned().collect();
    watched_tokens.sort();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        rate_source: state.rate_cache.source_id(),
        cached_rates: state.rate_cache.len(),
        watched_tokens,
        default_token: state.quote_service.default_token(),
        fallback_rate: state.quote_service.fallback_rate(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}
