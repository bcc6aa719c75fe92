//! 수집 스케줄러 통합 테스트.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use ohlcv_collector::{Clock, CollectionScheduler, CollectorError, Ingest};
use ohlcv_data::{
    Database, NewSymbol, StatusRepository, SymbolRecord, SymbolRepository, MAX_ERROR_LEN,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 호출 횟수를 세고 미리 정한 결과를 순서대로 돌려주는 수집기.
///
/// 스크립트가 비면 항상 0건 성공.
#[derive(Default)]
struct CountingIngest {
    calls: AtomicUsize,
    script: Mutex<VecDeque<Result<usize, String>>>,
}

impl CountingIngest {
    fn scripted(results: Vec<Result<usize, String>>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Mutex::new(results.into()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Ingest for CountingIngest {
    async fn ingest(
        &self,
        _symbol: &SymbolRecord,
        _interval: &str,
        _now: DateTime<Utc>,
    ) -> ohlcv_collector::Result<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(n)) => Ok(n),
            Some(Err(message)) => Err(CollectorError::Config(message)),
            None => Ok(0),
        }
    }
}

/// 호출마다 한 시간씩 전진하는 시계.
struct SteppingClock {
    secs: AtomicI64,
}

impl SteppingClock {
    fn starting_at(at: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            secs: AtomicI64::new(at.timestamp()),
        })
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.secs.fetch_add(3600, Ordering::SeqCst);
        DateTime::from_timestamp(secs, 0).unwrap()
    }
}

/// 고정 시계.
struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 2, 14, 30, 0).unwrap()
}

async fn setup(
    tickers: &[&str],
    ingest: Arc<CountingIngest>,
    clock: Arc<dyn Clock>,
) -> (Database, Vec<SymbolRecord>, CollectionScheduler) {
    let db = Database::connect_in_memory().await.unwrap();
    let symbols = SymbolRepository::new(db.pool().clone());

    let mut records = Vec::new();
    for ticker in tickers {
        records.push(symbols.create(&NewSymbol::ticker(*ticker)).await.unwrap());
    }

    let scheduler = CollectionScheduler::with_clock(
        symbols,
        StatusRepository::new(db.pool().clone()),
        ingest,
        Duration::from_millis(5),
        clock,
    );
    (db, records, scheduler)
}

#[tokio::test]
async fn test_stop_without_start_is_safe() {
    let ingest = Arc::new(CountingIngest::default());
    let (_db, _, scheduler) = setup(&["AAPL"], ingest.clone(), Arc::new(FixedClock(t0()))).await;

    let status = scheduler.stop().await;
    assert!(!status.is_running);
    assert_eq!(status.tick_count, 0);

    // 반복 호출도 안전
    assert!(!scheduler.stop().await.is_running);
    assert_eq!(ingest.calls(), 0);
}

#[tokio::test]
async fn test_start_twice_runs_single_loop() {
    let ingest = Arc::new(CountingIngest::default());
    let clock = SteppingClock::starting_at(t0());
    let (_db, _, scheduler) = setup(&["AAPL"], ingest.clone(), clock).await;

    assert!(scheduler.start().await.is_running);
    assert!(scheduler.start().await.is_running);

    tokio::time::sleep(Duration::from_millis(80)).await;

    let stopped = scheduler.stop().await;
    assert!(!stopped.is_running);
    assert!(stopped.tick_count > 0);

    // 시계가 매 틱 한 시간씩 전진하므로 모든 틱에서 수집 대상
    let calls = ingest.calls() as u64;
    assert!(calls <= stopped.tick_count);
    assert!(calls + 1 >= stopped.tick_count);

    // 중지 후에는 더 이상 틱이 없음
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(scheduler.status().tick_count, stopped.tick_count);
    assert_eq!(ingest.calls() as u64, calls);
}

#[tokio::test]
async fn test_not_due_pairs_are_skipped() {
    let ingest = Arc::new(CountingIngest::default());
    let (_db, _, scheduler) =
        setup(&["AAPL", "MSFT"], ingest.clone(), Arc::new(FixedClock(t0()))).await;

    let first = scheduler.run_tick().await.unwrap();
    assert_eq!(first.attempted, 2);
    assert_eq!(first.skipped, 0);

    let second = scheduler.run_tick().await.unwrap();
    assert_eq!(second.attempted, 0);
    assert_eq!(second.skipped, 2);

    assert_eq!(ingest.calls(), 2);
    let status = scheduler.status();
    assert_eq!(status.tick_count, 2);
    assert_eq!(status.last_run, Some(t0()));
    assert!(!status.is_running);
}

#[tokio::test]
async fn test_failure_then_success_updates_status() {
    let ingest = CountingIngest::scripted(vec![Err("x".repeat(MAX_ERROR_LEN + 50)), Ok(3)]);
    let clock = SteppingClock::starting_at(t0());
    let (db, records, scheduler) = setup(&["AAPL"], ingest.clone(), clock).await;
    let status_repo = StatusRepository::new(db.pool().clone());
    let id = records[0].id;

    let stats = scheduler.run_tick().await.unwrap();
    assert_eq!(stats.failed, 1);

    let st = status_repo.get(id).await.unwrap().unwrap();
    assert_eq!(st.last_attempt_at_utc, Some(t0()));
    assert_eq!(st.consecutive_failures, 1);
    assert!(st.last_success_at_utc.is_none());
    let stored_error = st.last_error.unwrap();
    assert!(stored_error.chars().count() <= MAX_ERROR_LEN);
    assert!(stored_error.contains("xxx"));

    let transient = scheduler.status().last_error.unwrap();
    assert!(transient.chars().count() <= MAX_ERROR_LEN);

    // 다음 틱은 한 시간 뒤라 다시 수집 대상
    let stats = scheduler.run_tick().await.unwrap();
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.inserted, 3);

    let st = status_repo.get(id).await.unwrap().unwrap();
    let second = t0() + ChronoDuration::hours(1);
    assert_eq!(st.last_attempt_at_utc, Some(second));
    assert_eq!(st.last_success_at_utc, Some(second));
    assert_eq!(st.consecutive_failures, 0);
    assert!(st.last_error.is_none());
}

#[tokio::test]
async fn test_one_failure_does_not_abort_tick() {
    let ingest = CountingIngest::scripted(vec![Err("boom".to_string()), Ok(1)]);
    let (db, records, scheduler) =
        setup(&["AAPL", "MSFT"], ingest.clone(), Arc::new(FixedClock(t0()))).await;

    let stats = scheduler.run_tick().await.unwrap();
    assert_eq!(stats.attempted, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.succeeded, 1);

    let status_repo = StatusRepository::new(db.pool().clone());
    let msft = status_repo.get(records[1].id).await.unwrap().unwrap();
    assert_eq!(msft.last_success_at_utc, Some(t0()));
}

#[tokio::test]
async fn test_inactive_symbols_are_not_collected() {
    let ingest = Arc::new(CountingIngest::default());
    let clock = SteppingClock::starting_at(t0());
    let (db, records, scheduler) = setup(&["AAPL", "MSFT"], ingest.clone(), clock).await;

    SymbolRepository::new(db.pool().clone())
        .set_active(records[0].id, false)
        .await
        .unwrap();

    let stats = scheduler.run_tick().await.unwrap();
    assert_eq!(stats.symbols, 1);
    assert_eq!(stats.attempted, 1);

    let status_repo = StatusRepository::new(db.pool().clone());
    let aapl = status_repo.get(records[0].id).await.unwrap().unwrap();
    assert!(aapl.last_attempt_at_utc.is_none());
}

#[tokio::test]
async fn test_reactivated_symbol_is_due_again() {
    let ingest = Arc::new(CountingIngest::default());
    let (db, records, scheduler) =
        setup(&["AAPL"], ingest.clone(), Arc::new(FixedClock(t0()))).await;
    let symbols = SymbolRepository::new(db.pool().clone());
    let id = records[0].id;

    let first = scheduler.run_tick().await.unwrap();
    assert_eq!(first.attempted, 1);

    // 비활성 틱에서 예정 시각이 제거되어야 함
    symbols.set_active(id, false).await.unwrap();
    let inactive = scheduler.run_tick().await.unwrap();
    assert_eq!(inactive.symbols, 0);
    assert_eq!(inactive.attempted, 0);

    // 시계가 멈춰 있으므로 남아 있는 예정 시각이 있었다면 건너뛰었을 것
    symbols.set_active(id, true).await.unwrap();
    let reactivated = scheduler.run_tick().await.unwrap();
    assert_eq!(reactivated.attempted, 1);
    assert_eq!(reactivated.skipped, 0);
    assert_eq!(ingest.calls(), 2);
}

#[tokio::test]
async fn test_storage_failure_stops_loop() {
    let ingest = Arc::new(CountingIngest::default());
    let (db, _, scheduler) = setup(&["AAPL"], ingest.clone(), Arc::new(FixedClock(t0()))).await;

    // 심볼 조회가 실패하도록 연결 풀을 닫음
    db.close().await;

    scheduler.start().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let status = scheduler.status();
    assert!(!status.is_running);
    assert!(status.last_error.is_some());
    assert_eq!(ingest.calls(), 0);

    // 스스로 재시작하지 않음
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(scheduler.status().tick_count, status.tick_count);

    let stopped = scheduler.stop().await;
    assert!(!stopped.is_running);
    assert!(stopped.last_error.is_some());
}

#[tokio::test]
async fn test_restart_after_stop_clears_error() {
    let ingest = CountingIngest::scripted(vec![Err("boom".to_string())]);
    let clock = SteppingClock::starting_at(t0());
    let (_db, _, scheduler) = setup(&["AAPL"], ingest.clone(), clock).await;

    scheduler.run_tick().await.unwrap();
    assert!(scheduler.status().last_error.is_some());

    let started = scheduler.start().await;
    assert!(started.is_running);
    assert!(started.last_error.is_none());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!scheduler.stop().await.is_running);
}
