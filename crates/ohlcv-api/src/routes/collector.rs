//! 수집기 API 라우트
//!
//! # 엔드포인트
//!
//! - `POST /api/collector/start` - 스케줄러 시작 (실행 중이면 무시)
//! - `POST /api/collector/stop` - 스케줄러 중지
//! - `GET /api/collector/runtime` - 스케줄러 실행 상태
//! - `GET /api/collector/status` - 심볼별 수집 상태

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use ohlcv_collector::SchedulerStatus;
use ohlcv_data::SymbolStatusView;
use std::sync::Arc;

use crate::error::{data_error, ApiResult};
use crate::state::AppState;

/// POST /api/collector/start
async fn start_collector(State(state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    Json(state.scheduler.start().await)
}

/// POST /api/collector/stop
async fn stop_collector(State(state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    Json(state.scheduler.stop().await)
}

/// GET /api/collector/runtime
async fn collector_runtime(State(state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status())
}

/// GET /api/collector/status
///
/// 한 번도 수집되지 않은 심볼도 포함합니다 (시도 필드 null, 실패 0).
async fn collector_status(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SymbolStatusView>>> {
    let statuses = state.status.list_symbol_statuses().await.map_err(data_error)?;
    Ok(Json(statuses))
}

/// 수집기 라우터 생성.
pub fn collector_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start", post(start_collector))
        .route("/stop", post(stop_collector))
        .route("/runtime", get(collector_runtime))
        .route("/status", get(collector_status))
}
