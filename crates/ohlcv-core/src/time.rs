//! UTC 정규화 유틸리티.
//!
//! 저장 계층은 타임존을 신뢰하지 않으므로 모든 시각은 쓰기 전에 여기서 UTC로 맞춥니다.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::{CoreError, CoreResult};
use crate::interval::Interval;

/// Unix 초를 UTC 시각으로 변환합니다.
pub fn from_unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// `now`를 현재 시간 버킷의 시작으로 내림합니다.
///
/// 제공자는 완성된 시간봉만 확정하므로 조회 종료 시각은 항상 이 값을 사용합니다.
pub fn floor_to_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    Interval::H1.floor(now)
}

/// IANA 타임존 이름을 파싱합니다.
pub fn parse_timezone(name: &str) -> CoreResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| CoreError::InvalidTimezone(name.to_string()))
}
