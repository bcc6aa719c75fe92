//! OHLCV 수집기 API 서버.
//!
//! 심볼 레지스트리, 캔들 조회, 수집 스케줄러 제어 엔드포인트를 제공합니다.

use std::sync::Arc;

use anyhow::Context;
use ohlcv_api::{create_router, ApiConfig, AppState};
use ohlcv_collector::{build_ingest_engine, build_scheduler, open_database, Ingest};
use ohlcv_core::{init_logging, LogConfig};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    init_logging(&LogConfig::from_env())?;

    info!("Starting OHLCV API server...");

    let config = ApiConfig::from_env()?;

    let db = open_database(&config.collector)
        .await
        .context("데이터베이스 초기화 실패")?;
    info!(database_url = %config.collector.database.url, "데이터베이스 연결 성공");

    let engine: Arc<dyn Ingest> = Arc::new(build_ingest_engine(&db, &config.collector)?);
    let scheduler = Arc::new(build_scheduler(&db, &config.collector, engine));

    if config.collector.scheduler.autostart {
        let status = scheduler.start().await;
        info!(is_running = status.is_running, "수집 스케줄러 자동 시작");
    }

    let state = Arc::new(AppState::new(db.clone(), scheduler.clone()));
    info!(version = %state.version, "Application state initialized");

    let app = create_router(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        error!(
            %addr,
            error = %e,
            "바인딩 실패. API_HOST, API_PORT 환경변수를 확인하세요."
        );
        e
    })?;
    info!(%addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown initiated, cleaning up...");

    let status = scheduler.stop().await;
    if let Some(err) = status.last_error {
        warn!(error = %err, "스케줄러 마지막 오류");
    }
    db.close().await;

    info!("Server stopped gracefully");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM 대기.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Ctrl+C 핸들러 설치 실패: {}", e);
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
                error!("SIGTERM 핸들러 설치 실패: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
