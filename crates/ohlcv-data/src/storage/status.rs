//! 심볼별 수집 상태 저장소.
//!
//! 모든 쓰기는 upsert로 수행되므로 상태 행이 없는 심볼(마이그레이션 직후 등)도
//! 첫 시도에서 자동으로 생성됩니다.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePool, FromRow};
use tracing::instrument;

/// `last_error`에 저장하는 최대 문자 수.
pub const MAX_ERROR_LEN: usize = 500;

/// 에러 메시지를 `max_chars` 문자로 자릅니다.
pub fn truncate_error(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((idx, _)) => message[..idx].to_string(),
        None => message.to_string(),
    }
}

/// 수집 상태 레코드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CollectorStatusRecord {
    pub symbol_id: i64,
    pub last_attempt_at_utc: Option<DateTime<Utc>>,
    pub last_success_at_utc: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: i64,
    pub updated_at_utc: Option<DateTime<Utc>>,
}

/// 심볼 정보 + 수집 상태 (상태 조회 API용).
///
/// 아직 한 번도 시도되지 않은 심볼은 시도 관련 필드가 모두 `None`, 실패 수 0입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SymbolStatusView {
    pub id: i64,
    pub symbol: String,
    pub exchange: Option<String>,
    pub timezone: Option<String>,
    pub is_active: bool,
    pub last_attempt_at_utc: Option<DateTime<Utc>>,
    pub last_success_at_utc: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: i64,
    pub updated_at_utc: Option<DateTime<Utc>>,
}

/// 수집 상태 저장소.
#[derive(Clone)]
pub struct StatusRepository {
    pool: SqlitePool,
}

impl StatusRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 수집 시도 기록 (수집 전에 호출).
    #[instrument(skip(self))]
    pub async fn record_attempt(&self, symbol_id: i64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO collector_status (symbol_id, last_attempt_at_utc, consecutive_failures, updated_at_utc)
            VALUES (?, ?, 0, ?)
            ON CONFLICT (symbol_id) DO UPDATE SET
                last_attempt_at_utc = excluded.last_attempt_at_utc,
                updated_at_utc = excluded.updated_at_utc
            "#,
        )
        .bind(symbol_id)
        .bind(at)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// 수집 성공 기록: 에러 초기화, 연속 실패 0.
    #[instrument(skip(self))]
    pub async fn record_success(&self, symbol_id: i64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO collector_status (symbol_id, last_success_at_utc, last_error, consecutive_failures, updated_at_utc)
            VALUES (?, ?, NULL, 0, ?)
            ON CONFLICT (symbol_id) DO UPDATE SET
                last_success_at_utc = excluded.last_success_at_utc,
                last_error = NULL,
                consecutive_failures = 0,
                updated_at_utc = excluded.updated_at_utc
            "#,
        )
        .bind(symbol_id)
        .bind(at)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// 수집 실패 기록: 에러 메시지(잘림), 연속 실패 +1.
    #[instrument(skip(self, error))]
    pub async fn record_failure(&self, symbol_id: i64, at: DateTime<Utc>, error: &str) -> Result<()> {
        let message = truncate_error(error, MAX_ERROR_LEN);

        sqlx::query(
            r#"
            INSERT INTO collector_status (symbol_id, last_error, consecutive_failures, updated_at_utc)
            VALUES (?, ?, 1, ?)
            ON CONFLICT (symbol_id) DO UPDATE SET
                last_error = excluded.last_error,
                consecutive_failures = collector_status.consecutive_failures + 1,
                updated_at_utc = excluded.updated_at_utc
            "#,
        )
        .bind(symbol_id)
        .bind(message)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// 심볼의 수집 상태 조회.
    pub async fn get(&self, symbol_id: i64) -> Result<Option<CollectorStatusRecord>> {
        let record = sqlx::query_as(
            r#"
            SELECT symbol_id, last_attempt_at_utc, last_success_at_utc, last_error,
                   consecutive_failures, updated_at_utc
            FROM collector_status
            WHERE symbol_id = ?
            "#,
        )
        .bind(symbol_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// 모든 심볼의 수집 상태 (상태 행이 없는 심볼 포함, id 오름차순).
    pub async fn list_symbol_statuses(&self) -> Result<Vec<SymbolStatusView>> {
        let rows = sqlx::query_as(
            r#"
            SELECT s.id, s.symbol, s.exchange, s.timezone, s.is_active,
                   cs.last_attempt_at_utc, cs.last_success_at_utc, cs.last_error,
                   COALESCE(cs.consecutive_failures, 0) AS consecutive_failures,
                   cs.updated_at_utc
            FROM symbols s
            LEFT JOIN collector_status cs ON cs.symbol_id = s.id
            ORDER BY s.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
