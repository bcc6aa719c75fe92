//! OHLCV 캔들 저장소.
//!
//! `(symbol_id, interval, ts_utc)` 고유 제약이 멱등성의 기준입니다.
//! 삽입 결과는 [`InsertOutcome`]으로 돌려주며, 고유 제약 충돌은 에러가 아니라
//! 예상된 결과로 취급합니다.

use crate::error::Result;
use chrono::{DateTime, Utc};
use ohlcv_core::{CandleRow, Interval};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{Sqlite, SqlitePool};
use sqlx::{FromRow, QueryBuilder};
use tracing::{debug, instrument};

/// 한 번의 INSERT 문에 담을 최대 행 수.
const BULK_CHUNK_SIZE: usize = 500;

/// 캔들 데이터베이스 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CandleRecord {
    pub id: i64,
    pub symbol_id: i64,
    pub interval: String,
    pub ts_utc: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// 삽입 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// 모든 행이 새로 삽입됨 (행 수)
    Inserted(usize),
    /// 고유 제약 충돌로 아무것도 삽입되지 않음 (트랜잭션 롤백)
    Conflict,
}

/// 캔들 저장소.
#[derive(Clone)]
pub struct CandleRepository {
    pool: SqlitePool,
}

impl CandleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// (심볼, 간격)의 가장 최근 저장 시각 (high-water-mark).
    pub async fn max_ts(&self, symbol_id: i64, interval: Interval) -> Result<Option<DateTime<Utc>>> {
        let last: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT MAX(ts_utc) FROM candles WHERE symbol_id = ? AND interval = ?",
        )
        .bind(symbol_id)
        .bind(interval.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(last)
    }

    /// 모든 행을 한 트랜잭션으로 삽입합니다.
    ///
    /// 하나라도 고유 제약에 걸리면 전체를 롤백하고 `Conflict`를 반환합니다.
    /// 그 외 저장소 오류는 `Err`로 전파됩니다.
    #[instrument(skip(self, rows), fields(count = rows.len()))]
    pub async fn insert_many(
        &self,
        symbol_id: i64,
        interval: Interval,
        rows: &[CandleRow],
    ) -> Result<InsertOutcome> {
        if rows.is_empty() {
            return Ok(InsertOutcome::Inserted(0));
        }

        let mut tx = self.pool.begin().await?;

        for chunk in rows.chunks(BULK_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO candles (symbol_id, interval, ts_utc, open, high, low, close, volume) ",
            );
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(symbol_id)
                    .push_bind(interval.as_str())
                    .push_bind(row.ts_utc)
                    .push_bind(row.open)
                    .push_bind(row.high)
                    .push_bind(row.low)
                    .push_bind(row.close)
                    .push_bind(row.volume);
            });

            match builder.build().execute(&mut *tx).await {
                Ok(_) => {}
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    tx.rollback().await?;
                    debug!(symbol_id, "일괄 삽입 고유 제약 충돌, 롤백");
                    return Ok(InsertOutcome::Conflict);
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().await?;
        Ok(InsertOutcome::Inserted(rows.len()))
    }

    /// 한 행을 삽입합니다. 이미 있으면 `Conflict`.
    pub async fn insert_one(
        &self,
        symbol_id: i64,
        interval: Interval,
        row: &CandleRow,
    ) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO candles (symbol_id, interval, ts_utc, open, high, low, close, volume)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(symbol_id)
        .bind(interval.as_str())
        .bind(row.ts_utc)
        .bind(row.open)
        .bind(row.high)
        .bind(row.low)
        .bind(row.close)
        .bind(row.volume)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(InsertOutcome::Inserted(done.rows_affected() as usize)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(InsertOutcome::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 최신 `limit`개의 캔들을 오래된 순으로 반환합니다.
    pub async fn list_recent(
        &self,
        symbol_id: i64,
        interval: Interval,
        limit: i64,
    ) -> Result<Vec<CandleRecord>> {
        let mut records: Vec<CandleRecord> = sqlx::query_as(
            r#"
            SELECT id, symbol_id, interval, ts_utc, open, high, low, close, volume
            FROM candles
            WHERE symbol_id = ? AND interval = ?
            ORDER BY ts_utc DESC
            LIMIT ?
            "#,
        )
        .bind(symbol_id)
        .bind(interval.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        // 시간순 정렬 (오래된 것부터)
        records.reverse();
        Ok(records)
    }

    /// (심볼, 간격)의 저장된 캔들 수.
    pub async fn count(&self, symbol_id: i64, interval: Interval) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM candles WHERE symbol_id = ? AND interval = ?",
        )
        .bind(symbol_id)
        .bind(interval.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
