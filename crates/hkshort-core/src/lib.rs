//! # HKShort Core
//!
//! 港股 沽空(short-selling) 데이터 파이프라인의 핵심 도메인 모델과 타입을 제공합니다.
//!
//! 이 크레이트는 파이프라인 전반에서 사용되는 기본 타입을 제공합니다:
//! - 沽空 레코드 및 시장 통계 구조체
//! - 리스크/시장 분석 결과 타입
//! - 거래 캘린더 (주말/공휴일 판정)
//! - 설정 관리
//! - 로깅 인프라

pub mod calendar;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use calendar::{HkHolidayCalendar, TradingCalendar};
pub use config::ShortSellingConfig;
pub use domain::*;
pub use error::{CoreError, Result};
pub use logging::{init_logging, init_logging_from_env, LogConfig, LogFormat};
