//! 심볼 레지스트리.
//!
//! 심볼 생성 시 같은 트랜잭션 안에서 수집 상태 행을 함께 만들고,
//! 삭제 시에는 외래 키 cascade로 캔들과 수집 상태가 함께 지워집니다.

use crate::error::Result;
use chrono::Utc;
use ohlcv_core::{parse_timezone, CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePool, FromRow};
use tracing::{debug, info, instrument};

/// 심볼 데이터베이스 레코드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SymbolRecord {
    pub id: i64,
    pub symbol: String,
    pub exchange: Option<String>,
    pub timezone: Option<String>,
    pub is_active: bool,
}

/// 티커/거래소/타임존 최대 길이.
pub const MAX_SYMBOL_FIELD_LEN: usize = 64;

/// 새 심볼 입력.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSymbol {
    pub symbol: String,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl NewSymbol {
    /// 티커만으로 입력을 생성합니다.
    pub fn ticker(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// 공백을 정리하고 입력을 검증합니다.
    ///
    /// 빈 거래소/타임존은 `None`으로 취급하며, 타임존은 IANA 이름이어야 합니다.
    pub fn normalized(self) -> CoreResult<Self> {
        let symbol = self.symbol.trim().to_string();
        if symbol.is_empty() || symbol.chars().count() > MAX_SYMBOL_FIELD_LEN {
            return Err(CoreError::InvalidInput(format!(
                "symbol 길이는 1~{}자여야 합니다",
                MAX_SYMBOL_FIELD_LEN
            )));
        }

        let exchange = non_empty(self.exchange);
        if exchange.as_ref().is_some_and(|e| e.chars().count() > MAX_SYMBOL_FIELD_LEN) {
            return Err(CoreError::InvalidInput(format!(
                "exchange는 {}자 이하여야 합니다",
                MAX_SYMBOL_FIELD_LEN
            )));
        }

        let timezone = non_empty(self.timezone);
        if let Some(tz) = timezone.as_deref() {
            parse_timezone(tz)?;
        }

        Ok(Self {
            symbol,
            exchange,
            timezone,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 심볼 저장소.
#[derive(Clone)]
pub struct SymbolRepository {
    pool: SqlitePool,
}

impl SymbolRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 심볼과 수집 상태 행을 함께 생성합니다.
    ///
    /// 이미 존재하는 티커면 [`DataError::Duplicate`](crate::DataError::Duplicate).
    #[instrument(skip(self, input), fields(symbol = %input.symbol))]
    pub async fn create(&self, input: &NewSymbol) -> Result<SymbolRecord> {
        let mut tx = self.pool.begin().await?;

        let record: SymbolRecord = sqlx::query_as(
            r#"
            INSERT INTO symbols (symbol, exchange, timezone, is_active)
            VALUES (?, ?, ?, 1)
            RETURNING id, symbol, exchange, timezone, is_active
            "#,
        )
        .bind(&input.symbol)
        .bind(&input.exchange)
        .bind(&input.timezone)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO collector_status (symbol_id, consecutive_failures, updated_at_utc)
            VALUES (?, 0, ?)
            "#,
        )
        .bind(record.id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(id = record.id, "심볼 등록 완료");
        Ok(record)
    }

    /// 전체 심볼 조회 (id 오름차순).
    pub async fn list(&self) -> Result<Vec<SymbolRecord>> {
        let records = sqlx::query_as(
            "SELECT id, symbol, exchange, timezone, is_active FROM symbols ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// 활성 심볼 조회 (id 오름차순).
    pub async fn list_active(&self) -> Result<Vec<SymbolRecord>> {
        let records: Vec<SymbolRecord> = sqlx::query_as(
            r#"
            SELECT id, symbol, exchange, timezone, is_active
            FROM symbols
            WHERE is_active = 1
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = records.len(), "활성 심볼 조회");
        Ok(records)
    }

    /// id로 심볼 조회.
    pub async fn get(&self, id: i64) -> Result<Option<SymbolRecord>> {
        let record = sqlx::query_as(
            "SELECT id, symbol, exchange, timezone, is_active FROM symbols WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// 티커로 심볼 조회.
    pub async fn find_by_ticker(&self, ticker: &str) -> Result<Option<SymbolRecord>> {
        let record = sqlx::query_as(
            "SELECT id, symbol, exchange, timezone, is_active FROM symbols WHERE symbol = ?",
        )
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// 심볼 삭제. 삭제된 레코드를 반환하며 없으면 `None`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<Option<SymbolRecord>> {
        let record: Option<SymbolRecord> = sqlx::query_as(
            r#"
            DELETE FROM symbols
            WHERE id = ?
            RETURNING id, symbol, exchange, timezone, is_active
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref r) = record {
            info!(id = r.id, symbol = %r.symbol, "심볼 삭제 완료");
        }
        Ok(record)
    }

    /// 활성 플래그 변경. 없는 심볼이면 `None`.
    #[instrument(skip(self))]
    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<Option<SymbolRecord>> {
        let record = sqlx::query_as(
            r#"
            UPDATE symbols
            SET is_active = ?
            WHERE id = ?
            RETURNING id, symbol, exchange, timezone, is_active
            "#,
        )
        .bind(is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }
}
