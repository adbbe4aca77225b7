//! 환경변수 기반 설정 모듈.

use crate::error::{CollectorError, Result};
use hkshort_core::ShortSellingConfig;
use hkshort_data::storage::postgres::DatabaseConfig;
use hkshort_data::storage::redis::RedisConfig;

/// Collector 전체 설정.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// Redis 설정
    pub redis: RedisConfig,
    /// 수집 파이프라인 설정 (속도 제한, 재시도, 스케줄 등)
    pub short_selling: ShortSellingConfig,
}

impl CollectorConfig {
    /// 환경변수에서 설정을 로드합니다.
    ///
    /// `DATABASE_URL`은 필수, `REDIS_URL`은 로컬 기본값을 사용합니다.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            CollectorError::Config("DATABASE_URL environment variable is not set".to_string())
        })?;

        let short_selling = ShortSellingConfig::from_env();

        let database = DatabaseConfig {
            url: database_url,
            ..Default::default()
        };

        let redis = RedisConfig {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| RedisConfig::default().url),
            default_ttl_secs: short_selling.cache_ttl_secs,
        };

        Ok(Self {
            database,
            redis,
            short_selling,
        })
    }
}
