use std::{convert::Infallible, sync::Arc, time::Duration};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    extract::{Path, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures_core::stream::Stream;
use onramp_core::quotes::EffectiveRate;
use onramp_rates::{ExchangeRate, RateState, RateSubscription};
use serde::Deserialize;
use tokio_stream::wrappers::WatchStream;

#[derive(Deserialize)]
struct BatchRatesRequest {
    tokens: Vec<String>,
}

fn watched<'a>(state: &'a AppState, token: &str) -> ApiResult<&'a RateSubscription> {
    state
        .subscription(token)
        .ok_or_else(|| ApiError::NotFound(format!("{} is not a watched token", token)))
}

async fn get_rate(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> ApiResult<Json<EffectiveRate>> {
    let rate = state.quote_service.effective_rate(&token).await?;
    Ok(Json(rate))
}

async fn get_rates(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BatchRatesRequest>,
) -> ApiResult<Json<Vec<ExchangeRate>>> {
    let rates = state.quote_service.exchange_rates(&body.tokens).await?;
    Ok(Json(rates))
}

/// Forces a fetch. A watched token's subscription is nudged as well so its
/// published state follows.
async fn refresh_rate(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> ApiResult<Json<EffectiveRate>> {
    if let Some(subscription) = state.subscription(&token) {
        subscription.refresh();
    }
    let rate = state.quote_service.refresh_rate(&token).await?;
    Ok(Json(rate))
}

async fn get_rate_state(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> ApiResult<Json<RateState>> {
    Ok(Json(watched(&state, &token)?.state()))
}

async fn stream_rate_state(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>> {
    let receiver = watched(&state, &token)?.watch();
    let stream = tokio_stream::StreamExt::filter_map(WatchStream::new(receiver), |rate_state| {
        match SseEvent::default().event("rate").json_data(&rate_state) {
            Ok(event) => Some(Ok(event)),
            Err(err) => {
                tracing::error!(
                    "Failed to serialize rate state for {}: {}",
                    rate_state.token,
                    err
                );
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rates", post(get_rates))
        .route("/rates/{token}", get(get_rate))
        .route("/rates/{token}/refresh", post(refresh_rate))
        .route("/rates/{token}/state", get(get_rate_state))
        .route("/rates/{token}/stream", get(stream_rate_state))
}
