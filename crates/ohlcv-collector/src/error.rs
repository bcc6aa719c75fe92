//! 에러 타입 정의.

use ohlcv_core::InvalidInterval;
use ohlcv_data::DataError;
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 저장소 에러
    #[error("Storage error: {0}")]
    Data(#[from] DataError),

    /// 지원하지 않는 간격
    #[error(transparent)]
    InvalidInterval(#[from] InvalidInterval),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 등록되지 않은 심볼
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
