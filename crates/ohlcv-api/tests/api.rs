//! REST API 통합 테스트.
//!
//! 인메모리 SQLite와 가짜 수집기로 라우터 전체를 `oneshot` 호출합니다.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use ohlcv_api::{create_api_router, AppState};
use ohlcv_collector::{CollectionScheduler, Ingest};
use ohlcv_core::{CandleRow, Interval};
use ohlcv_data::{CandleRepository, Database, StatusRepository, SymbolRecord, SymbolRepository};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// 호출 횟수만 세는 수집기.
#[derive(Default)]
struct NoopIngest {
    calls: AtomicUsize,
}

#[async_trait]
impl Ingest for NoopIngest {
    async fn ingest(
        &self,
        _symbol: &SymbolRecord,
        _interval: &str,
        _now: DateTime<Utc>,
    ) -> ohlcv_collector::Result<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }
}

async fn setup() -> (Database, Router) {
    let db = Database::connect_in_memory().await.unwrap();
    let scheduler = Arc::new(CollectionScheduler::new(
        SymbolRepository::new(db.pool().clone()),
        StatusRepository::new(db.pool().clone()),
        Arc::new(NoopIngest::default()),
        Duration::from_millis(10),
    ));
    let state = Arc::new(AppState::new(db.clone(), scheduler));
    let app = create_api_router().with_state(state);
    (db, app)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health_reports_database_and_collector() {
    let (_db, app) = setup().await;

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "up");
    assert_eq!(body["collector"]["is_running"], false);
}

#[tokio::test]
async fn test_create_and_list_symbols() {
    let (_db, app) = setup().await;

    let (status, created) = send(
        &app,
        "POST",
        "/api/symbols",
        Some(json!({"symbol": " AAPL ", "exchange": "NASDAQ", "timezone": "America/New_York"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["symbol"], "AAPL");
    assert_eq!(created["exchange"], "NASDAQ");
    assert_eq!(created["is_active"], true);

    send(&app, "POST", "/api/symbols", Some(json!({"symbol": "MSFT"}))).await;

    let (status, list) = send(&app, "GET", "/api/symbols", None).await;
    assert_eq!(status, StatusCode::OK);
    let tickers: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["symbol"].as_str().unwrap())
        .collect();
    assert_eq!(tickers, vec!["AAPL", "MSFT"]);
}

#[tokio::test]
async fn test_duplicate_symbol_conflicts() {
    let (_db, app) = setup().await;

    let (status, _) = send(&app, "POST", "/api/symbols", Some(json!({"symbol": "AAPL"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "POST", "/api/symbols", Some(json!({"symbol": "AAPL"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_SYMBOL");

    let (_, list) = send(&app, "GET", "/api/symbols", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_symbol_input_rejected() {
    let (_db, app) = setup().await;

    let (status, body) = send(&app, "POST", "/api/symbols", Some(json!({"symbol": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["details"]["fields"], json!(["symbol"]));

    // 공백만 있는 티커는 정규화 후 비어 있음
    let (status, _) = send(&app, "POST", "/api/symbols", Some(json!({"symbol": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/symbols",
        Some(json!({"symbol": "AAPL", "timezone": "Mars/Olympus"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_update_and_delete_symbol() {
    let (_db, app) = setup().await;

    let (_, created) = send(&app, "POST", "/api/symbols", Some(json!({"symbol": "AAPL"}))).await;
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/symbols/{}", id),
        Some(json!({"is_active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["is_active"], false);

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/symbols/9999",
        Some(json!({"is_active": true})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, deleted) = send(&app, "DELETE", &format!("/api/symbols/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["symbol"], "AAPL");

    let (status, body) = send(&app, "DELETE", &format!("/api/symbols/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_candles() {
    let (db, app) = setup().await;

    let (_, created) = send(&app, "POST", "/api/symbols", Some(json!({"symbol": "AAPL"}))).await;
    let id = created["id"].as_i64().unwrap();

    let t0 = Utc.with_ymd_and_hms(2025, 1, 2, 14, 0, 0).unwrap();
    let rows: Vec<CandleRow> = (0..5)
        .map(|h| {
            let close = 100.0 + h as f64;
            CandleRow::new(t0 + ChronoDuration::hours(h), close, close + 1.0, close - 1.0, close, 10.0)
        })
        .collect();
    CandleRepository::new(db.pool().clone())
        .insert_many(id, Interval::H1, &rows)
        .await
        .unwrap();

    let (status, body) = send(&app, "GET", &format!("/api/symbols/{}/candles?limit=3", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "AAPL");
    assert_eq!(body["interval"], "1h");
    assert_eq!(body["count"], 3);

    // 가장 최근 3개를 오래된 순으로
    let closes: Vec<f64> = body["candles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["close"].as_f64().unwrap())
        .collect();
    assert_eq!(closes, vec![102.0, 103.0, 104.0]);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/symbols/{}/candles?interval=1d", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INTERVAL");

    let (status, _) = send(&app, "GET", &format!("/api/symbols/{}/candles?limit=0", id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/symbols/9999/candles", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_collector_status_includes_never_attempted_symbols() {
    let (_db, app) = setup().await;

    send(&app, "POST", "/api/symbols", Some(json!({"symbol": "AAPL"}))).await;

    let (status, body) = send(&app, "GET", "/api/collector/status", None).await;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["symbol"], "AAPL");
    assert!(rows[0]["last_attempt_at_utc"].is_null());
    assert!(rows[0]["last_success_at_utc"].is_null());
    assert!(rows[0]["last_error"].is_null());
    assert_eq!(rows[0]["consecutive_failures"], 0);
    assert!(rows[0]["updated_at_utc"].is_string());
}

#[tokio::test]
async fn test_collector_start_runtime_stop() {
    let (_db, app) = setup().await;

    let (status, body) = send(&app, "GET", "/api/collector/runtime", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_running"], false);
    assert_eq!(body["tick_count"], 0);

    let (status, body) = send(&app, "POST", "/api/collector/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_running"], true);

    // 이미 실행 중이면 그대로
    let (_, body) = send(&app, "POST", "/api/collector/start", None).await;
    assert_eq!(body["is_running"], true);

    tokio::time::sleep(Duration::from_millis(40)).await;

    let (_, body) = send(&app, "GET", "/api/collector/runtime", None).await;
    assert_eq!(body["is_running"], true);
    assert!(body["tick_count"].as_u64().unwrap() > 0);
    assert!(body["last_run"].is_string());

    let (status, body) = send(&app, "POST", "/api/collector/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_running"], false);

    let (_, body) = send(&app, "POST", "/api/collector/stop", None).await;
    assert_eq!(body["is_running"], false);
}
