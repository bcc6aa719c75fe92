//! 수집 모듈.

pub mod ingest;
pub mod scheduler;

pub use ingest::{Ingest, IngestEngine};
pub use scheduler::{Clock, CollectionScheduler, SchedulerStatus, SystemClock};
