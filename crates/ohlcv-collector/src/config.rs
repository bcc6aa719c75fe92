//! 환경변수 기반 설정 모듈.

use crate::error::CollectorError;
use crate::Result;
use ohlcv_data::DatabaseConfig;
use std::path::PathBuf;
use std::time::Duration;

/// 기본 데이터베이스 파일 경로
pub const DEFAULT_DB_PATH: &str = "data/stocks.db";

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 데이터베이스 파일 경로 (`DATABASE_URL` 미설정 시)
    pub db_path: Option<PathBuf>,
    /// 스케줄러 설정
    pub scheduler: SchedulerConfig,
    /// Yahoo Finance 설정
    pub yahoo: YahooConfig,
}

/// 스케줄러 설정
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// 틱 사이 대기 시간 (초)
    pub poll_interval_secs: f64,
    /// API 서버 시작 시 스케줄러 자동 시작
    pub autostart: bool,
}

/// Yahoo Finance 설정
#[derive(Debug, Clone)]
pub struct YahooConfig {
    /// 이력이 없을 때 사용할 조회 범위
    pub default_range: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2.0,
            autostart: false,
        }
    }
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            default_range: ohlcv_data::provider::yahoo::DEFAULT_RANGE.to_string(),
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let (mut database, db_path) = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => (
                DatabaseConfig {
                    url,
                    ..DatabaseConfig::default()
                },
                None,
            ),
            _ => {
                let path = PathBuf::from(
                    std::env::var("DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string()),
                );
                (DatabaseConfig::for_path(&path), Some(path))
            }
        };

        database.max_connections = env_var_parse("DB_MAX_CONNECTIONS", database.max_connections);

        let config = Self {
            database,
            db_path,
            scheduler: SchedulerConfig {
                poll_interval_secs: env_var_parse("COLLECTOR_POLL_INTERVAL_SECS", 2.0),
                autostart: env_var_bool("COLLECTOR_AUTOSTART", false),
            },
            yahoo: YahooConfig {
                default_range: std::env::var("YAHOO_DEFAULT_RANGE")
                    .unwrap_or_else(|_| YahooConfig::default().default_range),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate()?;
        if self.database.max_connections == 0 {
            return Err(CollectorError::Config(
                "DB_MAX_CONNECTIONS는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.yahoo.default_range.trim().is_empty() {
            return Err(CollectorError::Config(
                "YAHOO_DEFAULT_RANGE가 비어 있습니다".to_string(),
            ));
        }
        Ok(())
    }

    /// 데이터베이스 파일의 상위 디렉토리를 생성합니다.
    pub fn ensure_db_dir(&self) -> Result<()> {
        let Some(parent) = self.db_path.as_deref().and_then(|p| p.parent()) else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(parent).map_err(|e| {
            CollectorError::Config(format!("디렉토리 생성 실패 ({}): {}", parent.display(), e))
        })
    }
}

impl SchedulerConfig {
    /// 틱 사이 대기 시간을 Duration으로 반환
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_secs <= 0.0
            || Duration::try_from_secs_f64(self.poll_interval_secs).is_err()
        {
            return Err(CollectorError::Config(format!(
                "COLLECTOR_POLL_INTERVAL_SECS는 0보다 커야 합니다 (got {})",
                self.poll_interval_secs
            )));
        }
        Ok(())
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
pub fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
pub fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert!(!config.autostart);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_poll_interval() {
        for secs in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e30] {
            let config = SchedulerConfig {
                poll_interval_secs: secs,
                autostart: false,
            };
            assert!(matches!(config.validate(), Err(CollectorError::Config(_))));
        }
    }

    #[test]
    fn test_env_helpers() {
        std::env::set_var("OHLCV_TEST_PARSE", " 42 ");
        std::env::set_var("OHLCV_TEST_PARSE_BAD", "abc");
        std::env::set_var("OHLCV_TEST_BOOL", "TRUE");
        std::env::set_var("OHLCV_TEST_BOOL_OFF", "0");

        assert_eq!(env_var_parse("OHLCV_TEST_PARSE", 1u32), 42);
        assert_eq!(env_var_parse("OHLCV_TEST_PARSE_BAD", 7u32), 7);
        assert_eq!(env_var_parse("OHLCV_TEST_MISSING", 0.5f64), 0.5);
        assert!(env_var_bool("OHLCV_TEST_BOOL", false));
        assert!(!env_var_bool("OHLCV_TEST_BOOL_OFF", true));
        assert!(env_var_bool("OHLCV_TEST_BOOL_MISSING", true));
    }

    #[test]
    fn test_ensure_db_dir_creates_parent() {
        let root = std::env::temp_dir().join(format!("ohlcv-config-{}", std::process::id()));
        let path = root.join("nested").join("stocks.db");

        let config = CollectorConfig {
            database: DatabaseConfig::for_path(&path),
            db_path: Some(path.clone()),
            scheduler: SchedulerConfig::default(),
            yahoo: YahooConfig::default(),
        };
        config.ensure_db_dir().unwrap();
        assert!(path.parent().unwrap().is_dir());

        std::fs::remove_dir_all(&root).ok();
    }
}
