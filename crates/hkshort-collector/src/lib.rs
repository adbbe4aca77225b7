//! 홍콩 沽空 데이터 수집 데몬/CLI.
//!
//! 이 crate는 API 서버와 독립적으로 동작하는 수집 바이너리를 제공합니다:
//! - 일일 수집 (거래 캘린더 기반 스케줄링)
//! - 과거 데이터 백필
//! - 리스크/시장 분석 리포트 출력

pub mod config;
pub mod error;
pub mod scheduler;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use scheduler::{JobResult, ShortSellingScheduler};
