//! # hkshort-data
//!
//! 홍콩 沽空(short-selling) 데이터의 수집/저장/조회 레이어.
//!
//! - **parser**: HKEX HTML 보고서 파서
//! - **provider**: 東方財富 API + HKEX 폴백 수집 오케스트레이터
//! - **storage**: PostgreSQL repository 및 Redis cache
//! - **analytics**: 리스크/시장 분석
//! - **rate_limit**: 외부 요청 공유 스로틀

pub mod analytics;
pub mod error;
pub mod parser;
pub mod provider;
pub mod rate_limit;
pub mod storage;

pub use analytics::{analyze_market_short_selling, analyze_short_selling_risk};
pub use error::{DataError, Result};
pub use parser::HkexShortSellingParser;
pub use provider::eastmoney::EastmoneyClient;
pub use provider::hkex::HkexFetcher;
pub use provider::{BackfillResult, ShortSellingProvider};
pub use rate_limit::RateLimiter;
pub use storage::postgres::{Database, DatabaseConfig, ShortSellingRepository};
pub use storage::redis::{RedisConfig, ShortSellingCache};
pub use storage::{RecordCache, RecordStore, UpsertOutcome};
