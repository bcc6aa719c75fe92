//! Yahoo Finance 캔들 제공자.

use super::CandleFetcher;
use crate::error::{DataError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ohlcv_core::{from_unix_seconds, CandleRow, Interval};
use time::OffsetDateTime;
use tracing::{debug, error, warn};

/// 시작 시각이 없을 때 사용하는 기본 조회 범위.
pub const DEFAULT_RANGE: &str = "1mo";

/// Yahoo Finance 응답의 한 봉.
///
/// 라이브러리 `Quote` 타입과 변환 로직을 분리하기 위한 중간 표현입니다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<&yahoo_finance_api::Quote> for RawBar {
    fn from(q: &yahoo_finance_api::Quote) -> Self {
        Self {
            timestamp: q.timestamp as i64,
            open: q.open,
            high: q.high,
            low: q.low,
            close: q.close,
            volume: q.volume as f64,
        }
    }
}

/// 원시 봉을 캔들로 변환합니다.
///
/// 잘못된 행(비유한 값, 표현 불가능한 시각)을 만나면 그 지점에서 중단하고
/// 앞서 변환된 행만 반환합니다. `[start, end)` 밖의 행은 버립니다.
pub fn bars_to_candles(
    ticker: &str,
    bars: &[RawBar],
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<CandleRow> {
    let mut candles = Vec::with_capacity(bars.len());

    for bar in bars {
        let Some(ts_utc) = from_unix_seconds(bar.timestamp) else {
            warn!(ticker, timestamp = bar.timestamp, "잘못된 타임스탬프, 배치 중단");
            break;
        };

        let row = CandleRow::new(ts_utc, bar.open, bar.high, bar.low, bar.close, bar.volume);
        if !row.is_well_formed() {
            warn!(ticker, ts = %ts_utc, "잘못된 OHLCV 값, 배치 중단");
            break;
        }

        if start.is_some_and(|s| ts_utc < s) || end.is_some_and(|e| ts_utc >= e) {
            continue;
        }

        candles.push(row);
    }

    candles.sort_by_key(|c| c.ts_utc);
    candles
}

/// chrono UTC 시각을 `time::OffsetDateTime`으로 변환.
fn to_offset_datetime(ts: DateTime<Utc>) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(ts.timestamp())
        .map_err(|e| DataError::Provider(format!("시각 변환 실패 ({}): {}", ts, e)))
}

/// Yahoo Finance 캔들 제공자.
pub struct YahooFetcher {
    connector: yahoo_finance_api::YahooConnector,
    default_range: String,
}

impl YahooFetcher {
    pub fn new() -> Result<Self> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| DataError::Connection(format!("Yahoo Finance 연결 실패: {}", e)))?;
        Ok(Self {
            connector,
            default_range: DEFAULT_RANGE.to_string(),
        })
    }

    /// 기본 백필 범위를 설정합니다 (예: "5d", "1mo", "3mo").
    pub fn with_default_range(mut self, range: impl Into<String>) -> Self {
        self.default_range = range.into();
        self
    }

    async fn fetch_bars(
        &self,
        ticker: &str,
        interval: Interval,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawBar>> {
        let yahoo_interval = interval.to_yahoo_interval();

        let response = match (start, end) {
            (Some(start), end) => {
                let end = end.unwrap_or_else(Utc::now);
                debug!(ticker, interval = yahoo_interval, start = %start, end = %end, "Yahoo Finance 날짜 범위 호출");
                self.connector
                    .get_quote_history_interval(
                        ticker,
                        to_offset_datetime(start)?,
                        to_offset_datetime(end)?,
                        yahoo_interval,
                    )
                    .await
            }
            (None, _) => {
                debug!(ticker, interval = yahoo_interval, range = %self.default_range, "Yahoo Finance API 호출");
                self.connector
                    .get_quote_range(ticker, yahoo_interval, &self.default_range)
                    .await
            }
        }
        .map_err(|e| DataError::Provider(format!("Yahoo Finance API 오류 ({}): {}", ticker, e)))?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::Provider(format!("Quote 파싱 오류: {}", e)))?;

        Ok(quotes.iter().map(RawBar::from).collect())
    }
}

#[async_trait]
impl CandleFetcher for YahooFetcher {
    async fn fetch(
        &self,
        ticker: &str,
        interval: Interval,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<CandleRow> {
        match self.fetch_bars(ticker, interval, start, end).await {
            Ok(bars) => {
                let candles = bars_to_candles(ticker, &bars, start, end);
                debug!(ticker, received = bars.len(), kept = candles.len(), "캔들 조회 완료");
                candles
            }
            Err(e) => {
                error!(ticker, interval = %interval, error = %e, "캔들 조회 실패");
                Vec::new()
            }
        }
    }
}
