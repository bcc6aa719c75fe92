//! API 서버 설정.

use ohlcv_collector::config::env_var_parse;
use ohlcv_collector::{CollectorConfig, Result};

/// HTTP 서버 설정
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// 환경변수에서 로드 (`API_HOST`, `API_PORT`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_var_parse("API_PORT", defaults.port),
        }
    }

    /// 바인딩 주소 (`host:port`).
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// API 서버 전체 설정
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub collector: CollectorConfig,
    pub server: ServerConfig,
}

impl ApiConfig {
    /// 환경변수(.env 포함)에서 설정 로드
    pub fn from_env() -> Result<Self> {
        let collector = CollectorConfig::from_env()?;
        Ok(Self {
            collector,
            server: ServerConfig::from_env(),
        })
    }
}
