//! Standalone hourly OHLCV collector CLI.

use chrono::Utc;
use clap::{Parser, Subcommand};
use ohlcv_collector::{
    build_ingest_engine, build_scheduler, open_database, CollectorConfig, CollectorError, Ingest,
};
use ohlcv_core::{init_logging, LogConfig};
use ohlcv_data::{NewSymbol, StatusRepository, SymbolRepository};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ohlcv-collector")]
#[command(about = "Hourly OHLCV candle collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 필터 (예: debug, ohlcv_collector=trace). RUST_LOG보다 우선
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 한 번 수집 (심볼 미지정 시 활성 심볼 전체를 한 틱 실행)
    Ingest {
        /// 티커 (예: AAPL)
        symbol: Option<String>,
        /// 수집 간격
        #[arg(long, default_value = "1h")]
        interval: String,
    },

    /// 데몬 모드: 종료 신호까지 스케줄러 실행
    Daemon,

    /// 심볼 등록
    AddSymbol {
        /// 티커 (예: AAPL)
        symbol: String,
        #[arg(long)]
        exchange: Option<String>,
        /// IANA 타임존 (예: America/New_York)
        #[arg(long)]
        timezone: Option<String>,
    },

    /// 등록된 심볼 목록
    ListSymbols,

    /// 심볼별 수집 상태 (JSON)
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // 로깅 초기화
    let mut log_config = LogConfig::from_env();
    if let Some(level) = cli.log_level.as_deref() {
        log_config = log_config.with_filter(level);
    }
    init_logging(&log_config)?;

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(database_url = %config.database.url, "설정 로드 완료");

    // DB 연결 + 마이그레이션
    let db = open_database(&config).await?;
    tracing::info!("데이터베이스 연결 성공");

    let symbols = SymbolRepository::new(db.pool().clone());

    match cli.command {
        Commands::Ingest {
            symbol: Some(symbol),
            interval,
        } => {
            let record = symbols
                .find_by_ticker(symbol.trim())
                .await?
                .ok_or_else(|| CollectorError::UnknownSymbol(symbol.clone()))?;

            let engine = build_ingest_engine(&db, &config)?;
            let inserted = engine.ingest(&record, &interval, Utc::now()).await?;
            tracing::info!(symbol = %record.symbol, interval = %interval, inserted, "수집 완료");
        }
        Commands::Ingest { symbol: None, .. } => {
            let engine: Arc<dyn Ingest> = Arc::new(build_ingest_engine(&db, &config)?);
            let scheduler = build_scheduler(&db, &config, engine);
            let stats = scheduler.run_tick().await?;
            println!(
                "attempted={} succeeded={} failed={} inserted={}",
                stats.attempted, stats.succeeded, stats.failed, stats.inserted
            );
        }
        Commands::Daemon => {
            let engine: Arc<dyn Ingest> = Arc::new(build_ingest_engine(&db, &config)?);
            let scheduler = build_scheduler(&db, &config, engine);

            tracing::info!(
                poll_interval_secs = config.scheduler.poll_interval_secs,
                "=== 데몬 모드 시작 ==="
            );
            scheduler.start().await;

            shutdown_signal().await;
            tracing::info!("종료 신호 수신, 데몬 종료 중...");

            let status = scheduler.stop().await;
            tracing::info!(ticks = status.tick_count, "=== 데몬 모드 종료 ===");
        }
        Commands::AddSymbol {
            symbol,
            exchange,
            timezone,
        } => {
            let input = NewSymbol {
                symbol,
                exchange,
                timezone,
            }
            .normalized()?;
            let record = symbols.create(&input).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::ListSymbols => {
            for record in symbols.list().await? {
                println!(
                    "{:>4}  {:<12} {:<10} {:<20} {}",
                    record.id,
                    record.symbol,
                    record.exchange.as_deref().unwrap_or("-"),
                    record.timezone.as_deref().unwrap_or("-"),
                    if record.is_active { "active" } else { "inactive" }
                );
            }
        }
        Commands::Status => {
            let statuses = StatusRepository::new(db.pool().clone())
                .list_symbol_statuses()
                .await?;
            println!("{}", serde_json::to_string_pretty(&statuses)?);
        }
    }

    db.close().await;
    Ok(())
}

/// Ctrl+C 또는 SIGTERM 대기.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Ctrl+C 핸들러 설치 실패: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("SIGTERM 핸들러 설치 실패: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
