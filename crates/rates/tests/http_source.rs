//! HttpRateSource against an in-process stub of the backend rate API.

use std::collections::HashMap;

use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use onramp_rates::{
    fetch_exchange_rate, fetch_exchange_rates, HttpRateSource, RateError, RateSource,
};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn get_rate(Query(params): Query<HashMap<String, String>>) -> Response {
    let token = params.get("token").cloned().unwrap_or_default();
    match token.as_str() {
        "USDT" => Json(json!({
            "success": true,
            "data": {
                "token": "USDT",
                "rate": 1580.5,
                "lastUpdated": "2024-03-01T12:00:00Z",
                "source": "p2p-median"
            }
        }))
        .into_response(),
        "BOOM" => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
        "GARBAGE" => "<html>maintenance</html>".into_response(),
        _ => Json(json!({ "success": false, "error": "Token not supported" })).into_response(),
    }
}

async fn post_rates(Json(body): Json<Value>) -> Json<Value> {
    let tokens: Vec<String> = body["tokens"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let data: Vec<Value> = tokens
        .iter()
        .flat_map(|token| match token.as_str() {
            "USDT" => vec![json!({ "token": "USDT", "rate": 1580 })],
            "USDC" => vec![json!({ "token": "USDC", "rate": 1590 })],
            "BROKEN" => vec![json!({ "token": "BROKEN", "rate": 0 })],
            // Promotions push rates nobody asked for, and repeat USDT.
            "PROMO" => vec![
                json!({ "token": "DAI", "rate": 1575 }),
                json!({ "token": "USDT", "rate": 1, "source": "promo" }),
            ],
            _ => Vec::new(),
        })
        .collect();

    Json(json!({ "success": true, "data": data }))
}

async fn spawn_backend() -> String {
    let router = Router::new().route("/api/exchange-rates", get(get_rate).post(post_rates));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn fetches_single_rate() {
    let source = HttpRateSource::new(spawn_backend().await);

    let rate = source.fetch_rate("usdt").await.unwrap();

    assert_eq!(rate.token, "USDT");
    assert_eq!(rate.rate, dec!(1580.5));
    assert_eq!(rate.source, "p2p-median");
}

#[tokio::test]
async fn unsuccessful_payload_is_typed_error_and_none_at_boundary() {
    let source = HttpRateSource::new(spawn_backend().await);

    match source.fetch_rate("XYZ").await {
        Err(RateError::Unsuccessful(message)) => assert_eq!(message, "Token not supported"),
        other => panic!("expected Unsuccessful, got {:?}", other),
    }
    assert!(fetch_exchange_rate(&source, "XYZ").await.is_none());
}

#[tokio::test]
async fn server_error_maps_to_http_status() {
    let source = HttpRateSource::new(spawn_backend().await);

    match source.fetch_rate("BOOM").await {
        Err(RateError::HttpStatus { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected HttpStatus, got {:?}", other),
    }
    assert!(fetch_exchange_rate(&source, "BOOM").await.is_none());
}

#[tokio::test]
async fn malformed_body_maps_to_invalid_payload() {
    let source = HttpRateSource::new(spawn_backend().await);

    assert!(matches!(
        source.fetch_rate("GARBAGE").await,
        Err(RateError::InvalidPayload(_))
    ));
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let source = HttpRateSource::new(format!("http://{}", addr));

    assert!(matches!(
        source.fetch_rate("USDT").await,
        Err(RateError::Network(_))
    ));
    assert!(fetch_exchange_rate(&source, "USDT").await.is_none());
    assert!(fetch_exchange_rates(&source, &["USDT".to_string()])
        .await
        .is_empty());
}

#[tokio::test]
async fn batch_returns_valid_subset() {
    let source = HttpRateSource::new(spawn_backend().await);
    let tokens = vec![
        "usdt".to_string(),
        "USDC".to_string(),
        "BROKEN".to_string(),
        "XYZ".to_string(),
    ];

    let rates = fetch_exchange_rates(&source, &tokens).await;

    let symbols: Vec<&str> = rates.iter().map(|r| r.token.as_str()).collect();
    assert_eq!(symbols, vec!["USDT", "USDC"]);
    assert_eq!(rates[1].rate, dec!(1590));
}

#[tokio::test]
async fn batch_drops_unrequested_and_repeated_tokens() {
    let source = HttpRateSource::new(spawn_backend().await);
    let tokens = vec!["USDT".to_string(), "PROMO".to_string()];

    let rates = fetch_exchange_rates(&source, &tokens).await;

    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].token, "USDT");
    assert_eq!(rates[0].rate, dec!(1580));
}
