//! # OHLCV Core
//!
//! 시간봉 수집기의 핵심 도메인 타입을 제공합니다.
//!
//! 이 크레이트는 수집 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 수집 간격 정책 (지원 간격 검증, 버킷 폭)
//! - 캔들 레코드
//! - UTC 정규화 유틸리티
//! - 로깅 인프라

pub mod candle;
pub mod error;
pub mod interval;
pub mod logging;
pub mod time;

pub use candle::CandleRow;
pub use error::{CoreError, CoreResult};
pub use interval::{Interval, InvalidInterval};
pub use logging::*;
pub use time::{floor_to_hour, from_unix_seconds, parse_timezone};
