//! 수집 스케줄러.
//!
//! 하나의 tokio 태스크가 틱 루프를 돌며 활성 심볼마다 지원 간격별로 수집을 실행합니다.
//!
//! - `start()`/`stop()`은 하나의 비동기 Mutex로 직렬화됩니다.
//! - 종료는 [`CancellationToken`]으로 알립니다. 대기 중인 sleep은 즉시 깨어나고,
//!   진행 중인 틱은 (심볼, 간격) 사이에서 토큰을 확인하므로 현재 수집은 끝까지 저장됩니다.
//! - 심볼 목록 조회나 상태 기록이 실패하면 루프가 종료되고 `last_error`에 남습니다.
//!   루프는 스스로 재시작하지 않습니다.

use super::ingest::Ingest;
use crate::stats::TickStats;
use crate::Result;
use chrono::{DateTime, Utc};
use ohlcv_core::Interval;
use ohlcv_data::{truncate_error, StatusRepository, SymbolRepository, MAX_ERROR_LEN};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 현재 시각 공급자.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 시스템 시계.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 스케줄러 실행 상태 스냅샷.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub is_running: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub tick_count: u64,
}

/// (심볼, 간격)별 다음 실행 시각.
type DueTimes = HashMap<(i64, Interval), DateTime<Utc>>;

struct LoopHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

struct SchedulerInner {
    symbols: SymbolRepository,
    status: StatusRepository,
    ingest: Arc<dyn Ingest>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    state: RwLock<SchedulerStatus>,
    due: Mutex<DueTimes>,
}

/// 수집 스케줄러.
pub struct CollectionScheduler {
    inner: Arc<SchedulerInner>,
    control: tokio::sync::Mutex<Option<LoopHandle>>,
}

impl CollectionScheduler {
    pub fn new(
        symbols: SymbolRepository,
        status: StatusRepository,
        ingest: Arc<dyn Ingest>,
        poll_interval: Duration,
    ) -> Self {
        Self::with_clock(symbols, status, ingest, poll_interval, Arc::new(SystemClock))
    }

    pub fn with_clock(
        symbols: SymbolRepository,
        status: StatusRepository,
        ingest: Arc<dyn Ingest>,
        poll_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                symbols,
                status,
                ingest,
                clock,
                poll_interval,
                state: RwLock::new(SchedulerStatus::default()),
                due: Mutex::new(HashMap::new()),
            }),
            control: tokio::sync::Mutex::new(None),
        }
    }

    /// 루프를 시작합니다. 이미 실행 중이면 아무것도 하지 않습니다.
    pub async fn start(&self) -> SchedulerStatus {
        let mut control = self.control.lock().await;

        if let Some(running) = control.as_ref() {
            if !running.handle.is_finished() {
                debug!("스케줄러가 이미 실행 중");
                return self.status();
            }
        }

        self.inner.update(|s| {
            s.is_running = true;
            s.last_error = None;
        });

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_loop(self.inner.clone(), token.clone()));
        *control = Some(LoopHandle { token, handle });

        info!(
            poll_interval_ms = self.inner.poll_interval.as_millis() as u64,
            "수집 스케줄러 시작"
        );
        self.status()
    }

    /// 루프를 멈추고 종료를 기다립니다. 시작된 적이 없어도 안전합니다.
    pub async fn stop(&self) -> SchedulerStatus {
        let mut control = self.control.lock().await;

        if let Some(LoopHandle { token, handle }) = control.take() {
            token.cancel();
            if let Err(e) = handle.await {
                if e.is_panic() {
                    error!(error = %e, "수집 루프 비정상 종료");
                    self.inner
                        .update(|s| s.last_error = Some(truncate_error(&e.to_string(), MAX_ERROR_LEN)));
                }
            }
            info!("수집 스케줄러 중지");
        }

        self.inner.update(|s| s.is_running = false);
        self.status()
    }

    /// 현재 상태 스냅샷.
    pub fn status(&self) -> SchedulerStatus {
        self.inner.snapshot()
    }

    /// 루프 밖에서 한 틱을 실행합니다.
    pub async fn run_tick(&self) -> Result<TickStats> {
        self.inner.tick(&CancellationToken::new()).await
    }
}

/// 루프 종료 시 실행 플래그를 내림.
struct RunningGuard(Arc<SchedulerInner>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.update(|s| s.is_running = false);
    }
}

async fn run_loop(inner: Arc<SchedulerInner>, token: CancellationToken) {
    let _guard = RunningGuard(inner.clone());

    while !token.is_cancelled() {
        if let Err(e) = inner.tick(&token).await {
            let message = truncate_error(&e.to_string(), MAX_ERROR_LEN);
            error!(error = %message, "수집 루프 중단");
            inner.update(|s| s.last_error = Some(message));
            return;
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(inner.poll_interval) => {}
        }
    }

    debug!("수집 루프 종료");
}

impl SchedulerInner {
    fn snapshot(&self) -> SchedulerStatus {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn update(&self, f: impl FnOnce(&mut SchedulerStatus)) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        f(&mut state);
    }

    fn due_times(&self) -> std::sync::MutexGuard<'_, DueTimes> {
        self.due.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn tick(&self, token: &CancellationToken) -> Result<TickStats> {
        let started = Instant::now();
        let now = self.clock.now();
        let mut stats = TickStats::new();

        let mut tick = 0;
        self.update(|s| {
            s.last_run = Some(now);
            s.tick_count += 1;
            tick = s.tick_count;
        });

        let symbols = self.symbols.list_active().await?;
        stats.symbols = symbols.len();

        let active: HashSet<i64> = symbols.iter().map(|s| s.id).collect();
        self.due_times().retain(|(id, _), _| active.contains(id));

        'symbols: for symbol in &symbols {
            for &interval in Interval::SUPPORTED {
                if token.is_cancelled() {
                    debug!("중지 요청, 틱 중단");
                    break 'symbols;
                }

                let key = (symbol.id, interval);
                let due = self.due_times().get(&key).copied();
                if due.is_some_and(|at| at > now) {
                    stats.skipped += 1;
                    continue;
                }

                stats.attempted += 1;
                self.status.record_attempt(symbol.id, now).await?;

                let outcome = self.ingest.ingest(symbol, interval.as_str(), now).await;
                self.due_times().insert(key, now + interval.step());

                match outcome {
                    Ok(inserted) => {
                        stats.succeeded += 1;
                        stats.inserted += inserted;
                        self.status.record_success(symbol.id, now).await?;
                    }
                    Err(e) => {
                        let message = truncate_error(&e.to_string(), MAX_ERROR_LEN);
                        warn!(
                            symbol = %symbol.symbol,
                            interval = %interval,
                            error = %message,
                            "수집 실패"
                        );
                        stats.failed += 1;
                        self.update(|s| s.last_error = Some(message.clone()));
                        self.status.record_failure(symbol.id, now, &message).await?;
                    }
                }
            }
        }

        stats.elapsed = started.elapsed();
        stats.log_summary(tick);
        Ok(stats)
    }
}
