//! 시장 데이터 제공자.
//!
//! 제공자 오류는 호출자에게 전파하지 않습니다. 네트워크/응답 오류는 로그로 남기고
//! 빈 결과를 반환하며, 다음 틱에서 같은 구간을 다시 요청하게 됩니다.

pub mod yahoo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ohlcv_core::{CandleRow, Interval};

/// 캔들 조회 trait.
#[async_trait]
pub trait CandleFetcher: Send + Sync {
    /// `[start, end)` 구간의 캔들을 조회합니다.
    ///
    /// - `start`가 `None`이면 제공자의 기본 백필 구간을 사용합니다.
    /// - 반환되는 타임스탬프는 모두 UTC이며 `end` 이상인 행은 포함되지 않습니다.
    async fn fetch(
        &self,
        ticker: &str,
        interval: Interval,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<CandleRow>;
}
