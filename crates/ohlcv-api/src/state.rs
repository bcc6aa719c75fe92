//! 모든 핸들러에서 공유되는 애플리케이션 상태.

use chrono::{DateTime, Utc};
use ohlcv_collector::CollectionScheduler;
use ohlcv_data::{CandleRepository, Database, StatusRepository, SymbolRepository};
use std::sync::Arc;

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 `Arc<AppState>`로 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 데이터베이스 연결 풀
    pub db: Database,
    /// 심볼 레지스트리
    pub symbols: SymbolRepository,
    /// 캔들 저장소
    pub candles: CandleRepository,
    /// 수집 상태 저장소
    pub status: StatusRepository,
    /// 수집 스케줄러 (시작/중지/상태)
    pub scheduler: Arc<CollectionScheduler>,
    /// API 버전
    pub version: String,
    /// 서버 시작 시각
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: Database, scheduler: Arc<CollectionScheduler>) -> Self {
        let pool = db.pool().clone();
        Self {
            symbols: SymbolRepository::new(pool.clone()),
            candles: CandleRepository::new(pool.clone()),
            status: StatusRepository::new(pool),
            db,
            scheduler,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// 데이터베이스 응답 여부.
    pub async fn is_db_healthy(&self) -> bool {
        self.db.health_check().await.unwrap_or(false)
    }
}
