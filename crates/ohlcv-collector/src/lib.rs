//! 시간봉 OHLCV 수집기.
//!
//! 이 crate는 다음을 제공합니다:
//! - 증분 수집 엔진 (저장된 마지막 시각 이후 닫힌 버킷만 조회/저장)
//! - 백그라운드 수집 스케줄러 (시작/중지, 심볼별 다음 실행 시각 관리)
//! - 환경변수 기반 설정
//! - 독립 실행 CLI (`ohlcv-collector`)

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::{CollectorConfig, SchedulerConfig, YahooConfig};
pub use error::{CollectorError, Result};
pub use modules::{
    Clock, CollectionScheduler, Ingest, IngestEngine, SchedulerStatus, SystemClock,
};
pub use stats::TickStats;

use ohlcv_data::{
    CandleFetcher, CandleRepository, Database, StatusRepository, SymbolRepository, YahooFetcher,
};
use std::sync::Arc;

/// 설정으로부터 데이터베이스를 열고 마이그레이션을 적용합니다.
pub async fn open_database(config: &CollectorConfig) -> Result<Database> {
    config.ensure_db_dir()?;
    let db = Database::connect(&config.database).await?;
    db.migrate().await?;
    Ok(db)
}

/// Yahoo Finance 기반 수집 엔진을 생성합니다.
pub fn build_ingest_engine(db: &Database, config: &CollectorConfig) -> Result<IngestEngine> {
    let fetcher: Arc<dyn CandleFetcher> =
        Arc::new(YahooFetcher::new()?.with_default_range(config.yahoo.default_range.clone()));
    Ok(IngestEngine::new(CandleRepository::new(db.pool().clone()), fetcher))
}

/// 수집 엔진과 스케줄러를 조립합니다.
pub fn build_scheduler(
    db: &Database,
    config: &CollectorConfig,
    ingest: Arc<dyn Ingest>,
) -> CollectionScheduler {
    CollectionScheduler::new(
        SymbolRepository::new(db.pool().clone()),
        StatusRepository::new(db.pool().clone()),
        ingest,
        config.scheduler.poll_interval(),
    )
}
