use std::sync::Arc;

use crate::main_lib::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use onramp_core::fees::{FeeCalculation, FeeConfig, RampDirection};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeRequest {
    amount: Decimal,
    direction: RampDirection,
    /// Only read on off-ramp.
    #[serde(default)]
    receive_amount: Decimal,
    exchange_rate: Decimal,
}

async fn calculate_fees(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FeeRequest>,
) -> Json<FeeCalculation> {
    Json(state.quote_service.calculate_fees(
        body.amount,
        body.direction,
        body.receive_amount,
        body.exchange_rate,
    ))
}

async fn get_fee_config(State(state): State<Arc<AppState>>) -> Json<FeeConfig> {
    Json(state.quote_service.fee_config())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/fees/calculate", post(calculate_fees))
        .route("/fees/config", get(get_fee_config))
}
