//! 데이터 crate 오류 타입.

use thiserror::Error;

/// 저장소/제공자 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 연결 또는 연결 옵션 오류
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// 쿼리 실패
    #[error("Query failed: {0}")]
    Query(String),

    /// 대상 레코드 없음
    #[error("Not found: {0}")]
    NotFound(String),

    /// 고유 제약 위반 (중복 티커, 중복 캔들)
    #[error("Unique constraint violated: {0}")]
    Duplicate(String),

    /// 스키마 마이그레이션 실패
    #[error("Migration failed: {0}")]
    Migration(String),

    /// 연결 풀에서 연결을 얻지 못함
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// 시장 데이터 제공자 호출/응답 오류
    #[error("Provider error: {0}")]
    Provider(String),
}

impl DataError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DataError::Duplicate(_))
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DataError::NotFound("row".to_string()),
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DataError::Duplicate(db_err.message().to_string())
            }
            other => DataError::Query(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DataError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DataError::Migration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
