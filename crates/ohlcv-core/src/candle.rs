//! 캔들(OHLCV) 레코드.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 데이터 제공자에서 받아 정규화한 캔들 한 개.
///
/// `ts_utc`는 버킷 시작 시각이며 항상 UTC입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleRow {
    /// 버킷 시작 시각 (UTC)
    pub ts_utc: DateTime<Utc>,
    /// 시가
    pub open: f64,
    /// 고가
    pub high: f64,
    /// 저가
    pub low: f64,
    /// 종가
    pub close: f64,
    /// 거래량
    pub volume: f64,
}

impl CandleRow {
    /// 새 캔들 생성.
    pub fn new(
        ts_utc: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            ts_utc,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 모든 수치 필드가 유한한지 확인합니다.
    pub fn is_well_formed(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}
