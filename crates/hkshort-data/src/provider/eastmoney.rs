//! 東方財富(Eastmoney) 沽空 API 클라이언트.
//!
//! 沽空 데이터의 1차 소스입니다. 구조화된 JSON을 반환하므로
//! HKEX HTML 스크래핑보다 우선 사용합니다.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{browser_headers, USER_AGENT};
use crate::error::{DataError, Result};
use crate::rate_limit::RateLimiter;
use hkshort_core::{normalize_stock_code, ShortSellingRecord};

const EASTMONEY_BASE_URL: &str = "https://datacenter-web.eastmoney.com";
const REPORT_NAME: &str = "RPT_HK_SHORTSELLING";

/// API 응답 래퍼.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    result: Option<ApiResult>,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    #[serde(default)]
    data: Vec<ApiRow>,
}

/// API 응답 행. 숫자 필드가 null이거나 문자열로 오는 경우가 있어
/// Value로 받아 느슨하게 변환합니다.
#[derive(Debug, Deserialize)]
struct ApiRow {
    #[serde(rename = "SECURITY_CODE", default)]
    security_code: String,
    #[serde(rename = "SECURITY_NAME_ABBR", default)]
    security_name: String,
    #[serde(rename = "TRADE_DATE", default)]
    trade_date: String,
    #[serde(rename = "SHORT_SELLING_SHARES", default)]
    short_shares: Value,
    #[serde(rename = "SHORT_SELLING_AMT", default)]
    short_value: Value,
    #[serde(rename = "SHORT_SELLING_RATIO", default)]
    short_ratio: Value,
}

/// 東方財富 API 클라이언트.
#[derive(Clone)]
pub struct EastmoneyClient {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
    limiter: Arc<RateLimiter>,
}

impl EastmoneyClient {
    /// 새로운 클라이언트를 생성합니다.
    pub fn new(timeout: Duration, page_size: u32, limiter: Arc<RateLimiter>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(browser_headers())
            .build()
            .map_err(|e| DataError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: EASTMONEY_BASE_URL.to_string(),
            page_size,
            limiter,
        })
    }

    /// 테스트용: base URL을 교체한 클라이언트를 반환합니다.
    #[doc(hidden)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 沽空 데이터를 조회합니다.
    ///
    /// `date`/`stock_code` 둘 다 선택입니다. 둘 다 None이면 최신 데이터를,
    /// 지정하면 해당 조건으로 필터링한 결과를 반환합니다.
    pub async fn fetch(
        &self,
        date: Option<&str>,
        stock_code: Option<&str>,
    ) -> Result<Vec<ShortSellingRecord>> {
        let mut filters = String::new();
        if let Some(date) = date {
            filters.push_str(&format!("(TRADE_DATE='{}')", date));
        }
        if let Some(code) = stock_code {
            filters.push_str(&format!("(SECURITY_CODE=\"{}\")", normalize_stock_code(code)));
        }

        let page_size = self.page_size.to_string();
        let mut params = vec![
            ("sortColumns", "TRADE_DATE,SHORT_SELLING_RATIO"),
            ("sortTypes", "-1,-1"),
            ("pageSize", page_size.as_str()),
            ("pageNumber", "1"),
            ("reportName", REPORT_NAME),
            ("columns", "ALL"),
        ];
        if !filters.is_empty() {
            params.push(("filter", filters.as_str()));
        }

        self.limiter.acquire().await;

        info!(date = ?date, stock_code = ?stock_code, "Fetching short-selling data from Eastmoney");

        let url = format!("{}/api/data/v1/get", self.base_url);
        let response = self.client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(DataError::FetchError(format!(
                "Eastmoney HTTP {}",
                response.status()
            )));
        }

        let body: ApiResponse = response.json().await?;

        if !body.success {
            return Err(DataError::FetchError(format!(
                "Eastmoney API failure: {}",
                body.message.unwrap_or_default()
            )));
        }

        let rows = body.result.map(|r| r.data).unwrap_or_default();
        let now = Utc::now();
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            match parse_row(&row, now) {
                Some(record) => records.push(record),
                None => {
                    warn!(code = %row.security_code, "Skipping malformed Eastmoney row");
                }
            }
        }

        debug!(count = records.len(), "Parsed Eastmoney records");
        Ok(records)
    }
}

/// API 행을 도메인 레코드로 변환합니다. 숫자 필드가 깨진 행은 버립니다.
fn parse_row(row: &ApiRow, now: chrono::DateTime<Utc>) -> Option<ShortSellingRecord> {
    if row.security_code.is_empty() {
        return None;
    }

    // "2025-03-10 00:00:00" 형식에서 날짜 부분만 사용
    let date = row.trade_date.split(' ').next()?.to_string();
    if date.is_empty() {
        return None;
    }

    let short_shares = value_to_f64(&row.short_shares)? as i64;
    let short_value = value_to_decimal(&row.short_value)?;
    // 백분율로 내려오므로 소수로 변환
    let short_ratio = value_to_f64(&row.short_ratio)? / 100.0;

    let record = ShortSellingRecord {
        stock_code: normalize_stock_code(&row.security_code),
        stock_name: row.security_name.clone(),
        date,
        short_shares,
        short_value,
        short_ratio,
        created_at: now,
        updated_at: now,
    };

    record.validate().ok()?;
    Some(record)
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.is_empty() => Some(0.0),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Null => Some(Decimal::ZERO),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) if s.is_empty() => Some(Decimal::ZERO),
        Value::String(s) => Decimal::from_str(s).ok(),
        _ => None,
    }
}
