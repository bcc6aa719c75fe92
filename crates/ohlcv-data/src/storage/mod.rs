//! SQLite 저장소.
//!
//! - [`database`]: 연결 풀, 마이그레이션
//! - [`symbols`]: 심볼 레지스트리
//! - [`candles`]: 캔들 저장 (고유 제약 기반 멱등 삽입)
//! - [`status`]: 심볼별 수집 상태

pub mod candles;
pub mod database;
pub mod status;
pub mod symbols;
