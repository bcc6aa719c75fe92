//! API 라우트.

pub mod collector;
pub mod health;
pub mod symbols;

pub use collector::collector_router;
pub use health::{health_router, HealthResponse};
pub use symbols::{symbols_router, CandlesResponse, CreateSymbolRequest, UpdateSymbolRequest};

use axum::http::{header, Method, StatusCode};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::state::AppState;

/// 전체 API 라우터 생성 (상태 미주입).
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/symbols", symbols_router())
        .nest("/api/collector", collector_router())
}

/// 미들웨어를 포함한 전체 라우터 생성.
pub fn create_router(state: Arc<AppState>) -> Router {
    create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 (30초) - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(cors_layer())
}

/// CORS 미들웨어 구성.
///
/// `CORS_ORIGINS` (쉼표 구분)가 설정되어 있으면 해당 origin만 허용하고,
/// 없으면 모든 origin을 허용합니다.
fn cors_layer() -> CorsLayer {
    let origins: Vec<_> = std::env::var("CORS_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        warn!("CORS_ORIGINS 미설정, 모든 origin 허용");
        AllowOrigin::any()
    } else {
        info!(count = origins.len(), "CORS 허용 origin 설정");
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}
