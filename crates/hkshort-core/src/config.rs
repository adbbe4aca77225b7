//! 환경변수 기반 설정 모듈.

use std::time::Duration;

/// 沽空 데이터 파이프라인 설정.
///
/// 모든 값은 환경변수에서 읽으며, 없으면 기본값을 사용합니다.
#[derive(Debug, Clone)]
pub struct ShortSellingConfig {
    /// 외부 소스 요청 간 최소 간격 (초)
    pub min_request_interval_secs: f64,
    /// HTTP 요청 타임아웃 (초)
    pub http_timeout_secs: u64,
    /// HTML fallback 최대 재시도 횟수
    pub max_retries: u32,
    /// 캐시 TTL (초)
    pub cache_ttl_secs: u64,
    /// primary API 페이지 크기
    pub page_size: u32,
    /// 일일 수집 시각 (홍콩 시간, 시)
    pub schedule_hour: u32,
    /// 일일 수집 시각 (분)
    pub schedule_minute: u32,
}

impl Default for ShortSellingConfig {
    fn default() -> Self {
        Self {
            min_request_interval_secs: 5.0,
            http_timeout_secs: 30,
            max_retries: 3,
            cache_ttl_secs: 86_400, // 24시간
            page_size: 500,
            schedule_hour: 18, // 마감 후
            schedule_minute: 0,
        }
    }
}

impl ShortSellingConfig {
    /// 환경변수에서 설정을 로드합니다.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            min_request_interval_secs: env_var_parse(
                "HK_SHORT_RATE_LIMIT_SECS",
                defaults.min_request_interval_secs,
            ),
            http_timeout_secs: env_var_parse("HK_SHORT_TIMEOUT_SECS", defaults.http_timeout_secs),
            max_retries: env_var_parse("HK_SHORT_MAX_RETRIES", defaults.max_retries),
            cache_ttl_secs: env_var_parse("HK_SHORT_CACHE_TTL_SECS", defaults.cache_ttl_secs),
            page_size: env_var_parse("HK_SHORT_PAGE_SIZE", defaults.page_size),
            schedule_hour: env_var_parse("HK_SHORT_SCHEDULE_HOUR", defaults.schedule_hour),
            schedule_minute: env_var_parse("HK_SHORT_SCHEDULE_MINUTE", defaults.schedule_minute),
        }
    }

    /// 요청 간 최소 간격을 Duration으로 반환합니다.
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_secs_f64(self.min_request_interval_secs)
    }

    /// HTTP 타임아웃을 Duration으로 반환합니다.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용).
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
