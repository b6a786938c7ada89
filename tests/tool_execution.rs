//! Tool execution integration tests
//!
//! Runs tools end to end against a mock market data API and an in-memory
//! object store.

use std::sync::Arc;

use avtools::store::{MemoryStore, ObjectStore, StoreError};
use avtools::tools::{OutputDelivery, ToolContext, ToolExecutor};
use avtools::upstream::{Entitlement, MockMarketDataApi};
use serde_json::{Value, json};

async fn call(api: &MockMarketDataApi, delivery: &OutputDelivery, tool: &str, input: Value) -> String {
    let ctx = ToolContext {
        api,
        delivery,
        entitlement: None,
    };
    ToolExecutor::standard().execute(tool, &input, &ctx).await
}

fn parse(output: &str) -> Value {
    serde_json::from_str(output).unwrap()
}

#[tokio::test]
async fn test_bulk_quotes_routed_with_symbol_key() {
    let api = MockMarketDataApi::new().with_response("REALTIME_BULK_QUOTES", "symbol,price\nAAPL,1\nMSFT,2");
    let delivery = OutputDelivery::inline_only();

    let out = call(
        &api,
        &delivery,
        "time_series",
        json!({"series_type": "bulk_quotes", "symbols": "AAPL,MSFT"}),
    )
    .await;
    assert!(out.starts_with("symbol,price"));

    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].function, "REALTIME_BULK_QUOTES");
    assert_eq!(calls[0].params.get("symbol"), Some("AAPL,MSFT"));
    assert!(!calls[0].params.contains_key("symbols"));
}

#[tokio::test]
async fn test_mama_defaults_reach_upstream() {
    let api = MockMarketDataApi::new().with_response("MAMA", "time,MAMA,FAMA");
    let delivery = OutputDelivery::inline_only();

    call(
        &api,
        &delivery,
        "moving_average",
        json!({"indicator_type": "mama", "symbol": "IBM", "interval": "daily", "series_type": "close"}),
    )
    .await;

    let calls = api.calls();
    assert_eq!(calls[0].function, "MAMA");
    assert_eq!(calls[0].params.get("fastlimit"), Some("0.01"));
    assert_eq!(calls[0].params.get("slowlimit"), Some("0.01"));
    assert!(!calls[0].params.contains_key("time_period"));
}

#[tokio::test]
async fn test_treasury_yield_without_maturity() {
    let api = MockMarketDataApi::new();
    let delivery = OutputDelivery::inline_only();

    let err = parse(&call(&api, &delivery, "economic", json!({"indicator_type": "treasury_yield"})).await);
    assert_eq!(err["error"], "Request validation failed");
    let messages = err["validation_errors"].to_string();
    assert!(messages.contains("maturity"));
    assert!(messages.contains("requires"));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_conflicting_output_flags() {
    let api = MockMarketDataApi::new();
    let delivery = OutputDelivery::inline_only();

    let err = parse(
        &call(
            &api,
            &delivery,
            "statement",
            json!({"statement_type": "earnings", "symbol": "IBM", "force_inline": true, "force_file": true}),
        )
        .await,
    );
    assert!(err["message"].as_str().unwrap().contains("mutually exclusive"));
}

#[tokio::test]
async fn test_statement_sends_only_symbol() {
    let api = MockMarketDataApi::new().with_response("BALANCE_SHEET", r#"{"symbol": "IBM", "annualReports": []}"#);
    let delivery = OutputDelivery::inline_only();

    let out = parse(
        &call(
            &api,
            &delivery,
            "statement",
            json!({"statement_type": "balance_sheet", "symbol": "IBM"}),
        )
        .await,
    );
    assert_eq!(out["symbol"], "IBM");

    let calls = api.calls();
    assert_eq!(calls[0].function, "BALANCE_SHEET");
    assert_eq!(calls[0].params.len(), 1);
}

#[tokio::test]
async fn test_entitlement_forwarded() {
    let api = MockMarketDataApi::new().with_response("GLOBAL_QUOTE", "symbol,price\nIBM,1");
    let delivery = OutputDelivery::inline_only();
    let ctx = ToolContext {
        api: &api,
        delivery: &delivery,
        entitlement: Some(Entitlement::Realtime),
    };

    ToolExecutor::standard()
        .execute("time_series", &json!({"series_type": "quote", "symbol": "IBM"}), &ctx)
        .await;
    assert_eq!(api.calls()[0].entitlement, Some(Entitlement::Realtime));
}

#[tokio::test]
async fn test_force_file_delivers_to_store() {
    let api = MockMarketDataApi::new().with_response("FX_WEEKLY", "timestamp,open\n2024-01-05,1.09");
    let store = Arc::new(MemoryStore::new("market-data"));
    let delivery = OutputDelivery::new(Some(store.clone() as Arc<dyn ObjectStore>));

    let out = parse(
        &call(
            &api,
            &delivery,
            "forex",
            json!({"timeframe": "weekly", "from_symbol": "EUR", "to_symbol": "USD", "force_file": true}),
        )
        .await,
    );
    let file = &out["data_file"];
    assert_eq!(file["bucket"], "market-data");
    assert_eq!(file["format"], "csv");
    assert_eq!(file["size_bytes"], 30);

    let key = file["key"].as_str().unwrap();
    assert!(key.starts_with("responses/FX_WEEKLY/"));
    assert!(key.ends_with(".csv"));
    let object = store.get(key).unwrap();
    assert_eq!(object.body, b"timestamp,open\n2024-01-05,1.09");
}

#[tokio::test]
async fn test_oversized_response_goes_to_store() {
    let body = format!("{{\"data\": \"{}\"}}", "x".repeat(64));
    let api = MockMarketDataApi::new().with_response("REAL_GDP", body.clone());
    let store = Arc::new(MemoryStore::new("market-data"));
    let delivery = OutputDelivery::new(Some(store.clone() as Arc<dyn ObjectStore>)).with_max_inline_bytes(32);

    let out = parse(&call(&api, &delivery, "economic", json!({"indicator_type": "real_gdp"})).await);
    assert_eq!(out["data_file"]["format"], "json");
    assert_eq!(out["data_file"]["size_bytes"], body.len());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_forced_upload_failure_is_reported() {
    let api = MockMarketDataApi::new().with_response("TOP_GAINERS_LOSERS", r#"{"top_gainers": []}"#);
    let store = Arc::new(MemoryStore::new("market-data").failing(StoreError::AccessDenied("market-data".into())));
    let delivery = OutputDelivery::new(Some(store as Arc<dyn ObjectStore>));

    let err = parse(
        &call(
            &api,
            &delivery,
            "market_data",
            json!({"data_type": "top_gainers_losers", "force_file": true}),
        )
        .await,
    );
    assert_eq!(err["error"], "StorageError");
    assert!(err["message"].as_str().unwrap().contains("Access denied"));
}

#[tokio::test]
async fn test_upstream_http_failure() {
    let api = MockMarketDataApi::new();
    let delivery = OutputDelivery::inline_only();

    let err = parse(&call(&api, &delivery, "commodity", json!({"commodity_type": "copper"})).await);
    assert_eq!(err["error"], "HttpError");
    assert_eq!(api.calls()[0].function, "COPPER");
}
