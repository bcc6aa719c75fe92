//! 데이터 관리 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - SQLite 저장소 (심볼, 캔들, 수집 상태)
//! - 버전 관리되는 마이그레이션
//! - 시장 데이터 제공자 (Yahoo Finance)

pub mod error;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};

pub use storage::candles::{CandleRecord, CandleRepository, InsertOutcome};
pub use storage::database::{Database, DatabaseConfig};
pub use storage::status::{
    truncate_error, CollectorStatusRecord, StatusRepository, SymbolStatusView, MAX_ERROR_LEN,
};
pub use storage::symbols::{NewSymbol, SymbolRecord, SymbolRepository, MAX_SYMBOL_FIELD_LEN};

pub use provider::yahoo::YahooFetcher;
pub use provider::CandleFetcher;
