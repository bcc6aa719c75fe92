//! 틱 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 스케줄러 한 틱의 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickStats {
    /// 활성 심볼 수
    pub symbols: usize,
    /// 수집 시도 횟수
    pub attempted: usize,
    /// 성공 횟수
    pub succeeded: usize,
    /// 실패 횟수
    pub failed: usize,
    /// 건너뛴 횟수 (다음 실행 시각 전)
    pub skipped: usize,
    /// 새로 저장된 캔들 수
    pub inserted: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl TickStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, tick: u64) {
        if self.attempted == 0 {
            tracing::debug!(tick, skipped = self.skipped, "수집 대상 없음");
            return;
        }
        tracing::info!(
            tick,
            symbols = self.symbols,
            attempted = self.attempted,
            succeeded = self.succeeded,
            failed = self.failed,
            skipped = self.skipped,
            inserted = self.inserted,
            elapsed = format!("{:.2}s", self.elapsed.as_secs_f64()),
            "틱 완료"
        );
    }
}
