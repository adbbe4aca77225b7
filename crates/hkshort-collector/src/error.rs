//! Collector 오류 타입.

use thiserror::Error;

/// Collector 오류.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 오류
    #[error("Configuration error: {0}")]
    Config(String),

    /// 데이터 레이어 오류
    #[error(transparent)]
    Data(#[from] hkshort_data::DataError),

    /// 도메인 오류
    #[error(transparent)]
    Core(#[from] hkshort_core::CoreError),
}

pub type Result<T> = std::result::Result<T, CollectorError>;
