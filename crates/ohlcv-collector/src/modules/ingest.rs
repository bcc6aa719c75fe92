//! (심볼, 간격) 단위 증분 수집.
//!
//! 저장된 마지막 시각 다음 버킷부터 `now`를 시간 단위로 내린 시각 직전까지를
//! 조회해 저장합니다. 같은 `now`로 여러 번 호출해도 두 번째부터는 0건입니다.

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ohlcv_core::{floor_to_hour, CandleRow, Interval};
use ohlcv_data::{CandleFetcher, CandleRepository, InsertOutcome, SymbolRecord};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 수집 작업 trait.
#[async_trait]
pub trait Ingest: Send + Sync {
    /// 새로 저장된 캔들 수를 반환합니다.
    ///
    /// 지원하지 않는 간격이거나 복구할 수 없는 저장소 오류일 때만 실패합니다.
    async fn ingest(&self, symbol: &SymbolRecord, interval: &str, now: DateTime<Utc>)
        -> Result<usize>;
}

/// 증분 수집 엔진.
#[derive(Clone)]
pub struct IngestEngine {
    candles: CandleRepository,
    fetcher: Arc<dyn CandleFetcher>,
}

impl IngestEngine {
    pub fn new(candles: CandleRepository, fetcher: Arc<dyn CandleFetcher>) -> Self {
        Self { candles, fetcher }
    }

    /// 고유 제약 충돌 후 한 행씩 삽입합니다.
    ///
    /// 중복은 건너뛰고, 그 외 저장소 오류가 나면 그때까지의 건수를 반환합니다.
    async fn insert_row_by_row(
        &self,
        symbol: &SymbolRecord,
        interval: Interval,
        rows: &[CandleRow],
    ) -> usize {
        let mut inserted = 0;

        for row in rows {
            match self.candles.insert_one(symbol.id, interval, row).await {
                Ok(InsertOutcome::Inserted(n)) => inserted += n,
                Ok(InsertOutcome::Conflict) => {}
                Err(e) => {
                    warn!(
                        symbol = %symbol.symbol,
                        interval = %interval,
                        ts = %row.ts_utc,
                        error = %e,
                        inserted,
                        "캔들 저장 실패, 부분 저장으로 종료"
                    );
                    return inserted;
                }
            }
        }

        inserted
    }
}

#[async_trait]
impl Ingest for IngestEngine {
    #[instrument(skip(self, symbol), fields(symbol = %symbol.symbol))]
    async fn ingest(
        &self,
        symbol: &SymbolRecord,
        interval: &str,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let interval = Interval::validate(interval)?;
        let step = interval.step();

        let last = self.candles.max_ts(symbol.id, interval).await?;
        let start = last.map(|ts| ts + step);
        let end = floor_to_hour(now);

        if let Some(start) = start {
            if start >= end {
                debug!(start = %start, end = %end, "수집 구간 없음, 건너뜀");
                return Ok(0);
            }
        }

        let fetched = self
            .fetcher
            .fetch(&symbol.symbol, interval, start, Some(end))
            .await;
        if fetched.is_empty() {
            return Ok(0);
        }

        // 아직 닫히지 않은 버킷은 저장하지 않음
        let received = fetched.len();
        let rows: Vec<CandleRow> = fetched.into_iter().filter(|r| r.ts_utc < end).collect();
        if rows.len() < received {
            debug!(dropped = received - rows.len(), end = %end, "종료 시각 이후 행 제외");
        }
        if rows.is_empty() {
            return Ok(0);
        }

        let inserted = match self.candles.insert_many(symbol.id, interval, &rows).await? {
            InsertOutcome::Inserted(n) => n,
            InsertOutcome::Conflict => {
                debug!(rows = rows.len(), "일괄 저장 충돌, 행 단위 저장으로 전환");
                self.insert_row_by_row(symbol, interval, &rows).await
            }
        };

        if inserted > 0 {
            info!(interval = %interval, inserted, "캔들 저장 완료");
        }
        Ok(inserted)
    }
}
