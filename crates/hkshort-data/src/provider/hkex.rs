//! 港交所(HKEX) 沽空 보고서 HTML fetcher.
//!
//! 東方財富 API 실패 시의 백업 소스입니다. 중문/영문 페이지 두 URL을
//! 순서대로 시도하며, URL별로 지수 백오프 재시도를 수행합니다.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{browser_headers, USER_AGENT};
use crate::rate_limit::RateLimiter;
use hkshort_core::compact_date;

const HKEX_URL_TEMPLATES: &[&str] = &[
    "https://www.hkex.com.hk/chi/stat/smstat/ssturnover/ncms/ASHTMAIN_{date}.htm",
    "https://www.hkex.com.hk/eng/stat/smstat/ssturnover/ncms/ASHTMAIN_{date}.htm",
];

/// HKEX HTML fetcher.
#[derive(Clone)]
pub struct HkexFetcher {
    client: reqwest::Client,
    url_templates: Vec<String>,
    max_retries: u32,
    limiter: Arc<RateLimiter>,
}

impl HkexFetcher {
    /// 새로운 fetcher를 생성합니다.
    pub fn new(
        timeout: Duration,
        max_retries: u32,
        limiter: Arc<RateLimiter>,
    ) -> crate::error::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(browser_headers())
            .build()
            .map_err(|e| crate::error::DataError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            url_templates: HKEX_URL_TEMPLATES.iter().map(|s| s.to_string()).collect(),
            max_retries,
            limiter,
        })
    }

    /// 테스트용: URL 템플릿을 교체합니다 (`{date}` 자리표시자 포함).
    #[doc(hidden)]
    pub fn with_url_templates(mut self, templates: Vec<String>) -> Self {
        self.url_templates = templates;
        self
    }

    /// 지정 일자의 보고서 HTML을 가져옵니다.
    ///
    /// 모든 URL/재시도가 실패하면 None을 반환합니다. 404는 해당 URL에
    /// 데이터가 없다는 뜻이므로 재시도 없이 다음 URL로 넘어갑니다.
    pub async fn fetch_html(&self, date: &str) -> Option<String> {
        let url_date = compact_date(date);

        for template in &self.url_templates {
            let url = template.replace("{date}", &url_date);

            for attempt in 0..self.max_retries {
                self.limiter.acquire().await;

                info!(
                    url = %url,
                    attempt = attempt + 1,
                    max = self.max_retries,
                    "Requesting HKEX short-selling report"
                );

                match self.client.get(&url).send().await {
                    Ok(response) if response.status().is_success() => {
                        match response.text().await {
                            Ok(body) => {
                                info!(date = date, "HKEX report fetched");
                                return Some(body);
                            }
                            Err(e) => {
                                warn!(url = %url, error = %e, "Failed to read HKEX response body");
                            }
                        }
                    }
                    Ok(response) if response.status() == reqwest::StatusCode::NOT_FOUND => {
                        warn!(date = date, url = %url, "HKEX report not available");
                        break; // 다음 URL 시도
                    }
                    Ok(response) => {
                        warn!(url = %url, status = %response.status(), "HKEX request failed");
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "HKEX request error");
                    }
                }

                // 지수 백오프: 2s, 4s, 8s, ...
                if attempt + 1 < self.max_retries {
                    let wait = Duration::from_secs(2u64.pow(attempt) * 2);
                    debug!(wait_secs = wait.as_secs(), "Backing off before retry");
                    tokio::time::sleep(wait).await;
                }
            }
        }

        error!(date = date, "All HKEX fetch attempts failed");
        None
    }
}
