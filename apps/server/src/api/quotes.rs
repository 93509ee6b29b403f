use std::{str::FromStr, sync::Arc};

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use onramp_core::{
    fees::RampDirection,
    quotes::{QuoteRequest, RampQuote},
    Error as CoreError,
};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Deserialize)]
struct QuoteParams {
    direction: String,
    token: Option<String>,
    amount: String,
}

/// Quote from query parameters. Amounts arrive as strings so they keep their
/// exact decimal value.
async fn get_quote(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuoteParams>,
) -> ApiResult<Json<RampQuote>> {
    let direction = RampDirection::from_str(&params.direction)?;
    let amount = Decimal::from_str(params.amount.trim()).map_err(CoreError::from)?;
    let quote = state
        .quote_service
        .quote(QuoteRequest {
            direction,
            token: params.token,
            amount,
        })
        .await?;
    Ok(Json(quote))
}

async fn create_quote(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuoteRequest>,
) -> ApiResult<Json<RampQuote>> {
    let quote = state.quote_service.quote(request).await?;
    Ok(Json(quote))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/quote", get(get_quote).post(create_quote))
}
