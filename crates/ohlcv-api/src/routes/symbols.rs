//! 심볼 API 라우트
//!
//! # 엔드포인트
//!
//! - `GET /api/symbols` - 심볼 목록 (id 오름차순)
//! - `POST /api/symbols` - 심볼 등록 (중복 시 409)
//! - `PATCH /api/symbols/{id}` - 활성 여부 변경
//! - `DELETE /api/symbols/{id}` - 심볼 삭제 (캔들/수집 상태 포함)
//! - `GET /api/symbols/{id}/candles` - 최근 캔들 조회

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use ohlcv_core::Interval;
use ohlcv_data::{CandleRecord, NewSymbol, SymbolRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use crate::error::{
    api_error, core_error, data_error, invalid_interval, not_found, validation_error, ApiResult,
};
use crate::state::AppState;

/// 캔들 조회 기본 개수
const DEFAULT_CANDLE_LIMIT: i64 = 100;
/// 캔들 조회 최대 개수
const MAX_CANDLE_LIMIT: i64 = 5000;

// ================================================================================================
// Request/Response Types
// ================================================================================================

/// 심볼 등록 요청
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSymbolRequest {
    /// 티커 (예: AAPL)
    #[validate(length(min = 1, max = 64, message = "symbol은 1-64자여야 합니다"))]
    pub symbol: String,
    /// 거래소
    #[serde(default)]
    #[validate(length(max = 64, message = "exchange는 64자 이하여야 합니다"))]
    pub exchange: Option<String>,
    /// IANA 타임존 (예: America/New_York)
    #[serde(default)]
    #[validate(length(max = 64, message = "timezone은 64자 이하여야 합니다"))]
    pub timezone: Option<String>,
}

/// 활성 여부 변경 요청
#[derive(Debug, Deserialize)]
pub struct UpdateSymbolRequest {
    pub is_active: bool,
}

/// 캔들 조회 쿼리
#[derive(Debug, Deserialize)]
pub struct CandlesQuery {
    /// 간격 (기본값: 1h)
    #[serde(default = "default_interval")]
    pub interval: String,
    /// 최대 개수 (기본값: 100)
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_interval() -> String {
    Interval::H1.as_str().to_string()
}

fn default_limit() -> i64 {
    DEFAULT_CANDLE_LIMIT
}

/// 캔들 조회 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct CandlesResponse {
    pub symbol_id: i64,
    pub symbol: String,
    pub interval: Interval,
    pub count: usize,
    /// 오래된 순
    pub candles: Vec<CandleRecord>,
}

// ================================================================================================
// Handlers
// ================================================================================================

/// GET /api/symbols - 심볼 목록
async fn list_symbols(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<SymbolRecord>>> {
    let symbols = state.symbols.list().await.map_err(data_error)?;
    Ok(Json(symbols))
}

/// POST /api/symbols - 심볼 등록
async fn create_symbol(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSymbolRequest>,
) -> ApiResult<(StatusCode, Json<SymbolRecord>)> {
    request.validate().map_err(validation_error)?;

    let input = NewSymbol {
        symbol: request.symbol,
        exchange: request.exchange,
        timezone: request.timezone,
    }
    .normalized()
    .map_err(core_error)?;

    info!(symbol = %input.symbol, "심볼 등록 요청");

    let record = state.symbols.create(&input).await.map_err(|e| {
        if e.is_duplicate() {
            api_error(
                StatusCode::CONFLICT,
                "DUPLICATE_SYMBOL",
                format!("이미 등록된 심볼입니다: {}", input.symbol),
            )
        } else {
            data_error(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// PATCH /api/symbols/{id} - 활성 여부 변경
async fn update_symbol(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateSymbolRequest>,
) -> ApiResult<Json<SymbolRecord>> {
    let record = state
        .symbols
        .set_active(id, request.is_active)
        .await
        .map_err(data_error)?
        .ok_or_else(|| not_found(format!("심볼을 찾을 수 없습니다: {}", id)))?;

    info!(id, is_active = record.is_active, "심볼 활성 여부 변경");
    Ok(Json(record))
}

/// DELETE /api/symbols/{id} - 심볼 삭제
async fn delete_symbol(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SymbolRecord>> {
    let record = state
        .symbols
        .delete(id)
        .await
        .map_err(data_error)?
        .ok_or_else(|| not_found(format!("심볼을 찾을 수 없습니다: {}", id)))?;

    Ok(Json(record))
}

/// GET /api/symbols/{id}/candles - 최근 캔들 조회
async fn list_candles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<CandlesQuery>,
) -> ApiResult<Json<CandlesResponse>> {
    let interval = Interval::validate(&query.interval).map_err(invalid_interval)?;

    if !(1..=MAX_CANDLE_LIMIT).contains(&query.limit) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            format!("limit은 1-{} 사이여야 합니다", MAX_CANDLE_LIMIT),
        ));
    }

    let symbol = state
        .symbols
        .get(id)
        .await
        .map_err(data_error)?
        .ok_or_else(|| not_found(format!("심볼을 찾을 수 없습니다: {}", id)))?;

    let candles = state
        .candles
        .list_recent(symbol.id, interval, query.limit)
        .await
        .map_err(data_error)?;

    debug!(symbol = %symbol.symbol, count = candles.len(), "캔들 조회");

    Ok(Json(CandlesResponse {
        symbol_id: symbol.id,
        symbol: symbol.symbol,
        interval,
        count: candles.len(),
        candles,
    }))
}

/// 심볼 라우터 생성.
pub fn symbols_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_symbols).post(create_symbol))
        .route("/{id}", axum::routing::patch(update_symbol).delete(delete_symbol))
        .route("/{id}/candles", get(list_candles))
}
