//! 수집 시스템의 핵심 에러 타입.

use thiserror::Error;

use crate::interval::InvalidInterval;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 지원하지 않는 간격
    #[error(transparent)]
    InvalidInterval(#[from] InvalidInterval),

    /// 알 수 없는 타임존
    #[error("알 수 없는 타임존: {0}")]
    InvalidTimezone(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// 호출자에게 그대로 보고해야 하는 입력 오류인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidInterval(_) | CoreError::InvalidTimezone(_) | CoreError::InvalidInput(_)
        )
    }
}
