//! 시간봉 OHLCV 수집기 REST API.
//!
//! 심볼 레지스트리 관리, 캔들 조회, 수집 스케줄러 제어를 JSON API로 제공합니다.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, ServerConfig};
pub use error::{ApiErrorResponse, ApiResult};
pub use routes::{create_api_router, create_router};
pub use state::AppState;
