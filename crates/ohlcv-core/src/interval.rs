//! 캔들 수집 간격 정책.
//!
//! 현재는 1시간봉 하나만 지원합니다. 그 외 입력은 모두 [`InvalidInterval`]로 거부되며,
//! API 계층에서는 400 Bad Request로 변환됩니다.

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 지원하지 않는 간격 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Only interval '1h' is supported (got '{0}')")]
pub struct InvalidInterval(pub String);

/// 캔들 수집 간격.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    /// 1시간봉
    #[serde(rename = "1h")]
    H1,
}

impl Interval {
    /// 스케줄러가 순회하는 간격 목록.
    pub const SUPPORTED: &'static [Interval] = &[Interval::H1];

    /// 간격 문자열을 검증합니다.
    pub fn validate(s: &str) -> Result<Self, InvalidInterval> {
        match s {
            "1h" => Ok(Interval::H1),
            other => Err(InvalidInterval(other.to_string())),
        }
    }

    /// 저장소/API에서 사용하는 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::H1 => "1h",
        }
    }

    /// 버킷 폭을 반환합니다.
    pub fn step(&self) -> Duration {
        match self {
            Interval::H1 => Duration::hours(1),
        }
    }

    /// 타임스탬프를 해당 버킷의 시작 시각으로 내림합니다.
    pub fn floor(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        // 시간 단위 절삭은 표현 가능한 범위 안에서 실패하지 않는다
        ts.duration_trunc(self.step()).unwrap_or(ts)
    }

    /// Yahoo Finance 간격 문자열로 변환합니다.
    pub fn to_yahoo_interval(&self) -> &'static str {
        match self {
            Interval::H1 => "60m",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = InvalidInterval;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)
    }
}
