//! 코어 오류 타입.

use thiserror::Error;

/// 도메인 수준 오류.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 잘못된 날짜 형식 (YYYY-MM-DD 이외)
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// 잘못된 레코드 (음수 지표 등)
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
