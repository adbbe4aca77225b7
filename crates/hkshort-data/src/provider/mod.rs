//! 沽空 데이터 provider.
//!
//! 수집 파이프라인의 오케스트레이터입니다. 소스 우선순위는:
//! 1. 東方財富 API (1차, 구조화된 JSON)
//! 2. HKEX 공식 사이트 (백업, HTML 스크래핑)
//!
//! 조회 경로는 cache → DB read-through이며, 수집 성공 시 해당 일자의
//! cache를 무효화합니다.

pub mod eastmoney;
pub mod hkex;

use chrono::{Datelike, NaiveDate, Weekday};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::error::{DataError, Result};
use crate::parser::HkexShortSellingParser;
use crate::rate_limit::RateLimiter;
use crate::storage::{RecordCache, RecordStore};
use eastmoney::EastmoneyClient;
use hkex::HkexFetcher;
use hkshort_core::{
    normalize_stock_code, MarketStats, ShortSellingConfig, ShortSellingRecord,
};

pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "zh-CN,zh;q=0.9,en;q=0.8";

/// 두 소스 공통의 브라우저 유사 요청 헤더.
pub(crate) fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
    headers
}

/// 백필 진행 콜백: (일자, 현재 순번, 전체 개수).
pub type ProgressCallback<'a> = &'a mut dyn FnMut(&str, usize, usize);

/// 백필 결과 집계.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillResult {
    /// 실패한 일자가 없으면 true
    pub success: bool,
    pub start_date: String,
    pub end_date: String,
    /// 범위 내 평일 수
    pub total_dates: usize,
    /// 실제 수집을 시도한 일자 수
    pub processed_dates: usize,
    /// 기존 데이터가 있어 건너뛴 일자 수
    pub skipped_dates: usize,
    /// 수집에 실패한 일자 목록
    pub failed_dates: Vec<String>,
    /// 저장한 총 레코드 수
    pub total_records: usize,
}

/// 홍콩 沽空 데이터 provider.
///
/// 저장소/캐시는 trait 객체로 주입받으므로 테스트에서는 인메모리
/// 구현으로 대체할 수 있습니다.
pub struct ShortSellingProvider {
    parser: HkexShortSellingParser,
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn RecordCache>,
    eastmoney: EastmoneyClient,
    hkex: HkexFetcher,
}

impl ShortSellingProvider {
    /// 새로운 provider를 생성합니다.
    ///
    /// 두 외부 소스가 하나의 `RateLimiter`를 공유하므로 소스를 바꿔가며
    /// 요청해도 최소 간격이 유지됩니다.
    pub fn new(
        store: Arc<dyn RecordStore>,
        cache: Arc<dyn RecordCache>,
        config: &ShortSellingConfig,
    ) -> Result<Self> {
        let limiter = Arc::new(RateLimiter::new(config.min_request_interval()));

        let eastmoney =
            EastmoneyClient::new(config.http_timeout(), config.page_size, limiter.clone())?;
        let hkex = HkexFetcher::new(config.http_timeout(), config.max_retries, limiter)?;

        Ok(Self {
            parser: HkexShortSellingParser::new(),
            store,
            cache,
            eastmoney,
            hkex,
        })
    }

    /// 테스트용: 東方財富 클라이언트를 교체합니다.
    #[doc(hidden)]
    pub fn with_eastmoney(mut self, client: EastmoneyClient) -> Self {
        self.eastmoney = client;
        self
    }

    /// 테스트용: HKEX fetcher를 교체합니다.
    #[doc(hidden)]
    pub fn with_hkex(mut self, fetcher: HkexFetcher) -> Self {
        self.hkex = fetcher;
        self
    }

    /// 지정 일자의 沽空 데이터를 수집하고 저장합니다.
    ///
    /// 소스 실패는 빈 결과로 강등됩니다 — 휴장일과 장애를 호출자가
    /// 구분할 필요가 없기 때문입니다. 저장 오류만 Err로 반환합니다.
    #[instrument(skip(self))]
    pub async fn fetch_daily_data(&self, date: &str) -> Result<Vec<ShortSellingRecord>> {
        info!(date = date, "Fetching daily short-selling data");

        let mut records = match self.eastmoney.fetch(Some(date), None).await {
            Ok(records) => records,
            Err(e) => {
                warn!(date = date, error = %e, "Eastmoney fetch failed");
                Vec::new()
            }
        };

        // 1차 소스가 비면 HKEX로 폴백
        if records.is_empty() {
            info!(date = date, "No Eastmoney data, falling back to HKEX");
            if let Some(html) = self.hkex.fetch_html(date).await {
                records = self.parser.parse(&html, date);
            }
        }

        if records.is_empty() {
            warn!(date = date, "No short-selling data available");
            return Ok(records);
        }

        let outcome = self.store.upsert_records(&records).await?;

        // 갱신된 일자의 cache는 전부 무효화. best-effort.
        if let Err(e) = self.cache.invalidate_date(date).await {
            warn!(date = date, error = %e, "Cache invalidation failed");
        }

        info!(
            date = date,
            fetched = records.len(),
            written = outcome.total_written(),
            failed = outcome.failed,
            "Stored daily short-selling data"
        );
        Ok(records)
    }

    /// 특정 종목의 특정 일자 沽空 데이터를 조회합니다 (cache → DB).
    pub async fn get_stock_short_data(
        &self,
        stock_code: &str,
        date: &str,
    ) -> Result<Option<ShortSellingRecord>> {
        let code = normalize_stock_code(stock_code);

        match self.cache.get_record(&code, date).await {
            Ok(Some(record)) => return Ok(Some(record)),
            Ok(None) => {}
            // cache 오류는 miss로 처리
            Err(e) => warn!(stock_code = %code, error = %e, "Cache read failed"),
        }

        let record = self.store.find_by_stock_and_date(&code, date).await?;

        if let Some(ref record) = record {
            if let Err(e) = self.cache.set_record(record).await {
                warn!(stock_code = %code, error = %e, "Cache write failed");
            }
        }

        Ok(record)
    }

    /// 특정 종목의 沽空 이력을 조회합니다 (일자 오름차순).
    pub async fn get_stock_short_history(
        &self,
        stock_code: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<ShortSellingRecord>> {
        let code = normalize_stock_code(stock_code);
        self.store
            .find_by_stock_and_date_range(&code, start_date, end_date)
            .await
    }

    /// 지정 일자의 沽空 비율 상위 종목을 조회합니다 (cache → DB).
    pub async fn get_top_short_stocks(
        &self,
        date: &str,
        top_n: i64,
    ) -> Result<Vec<ShortSellingRecord>> {
        match self.cache.get_top(date, top_n).await {
            Ok(Some(records)) => return Ok(records),
            Ok(None) => {}
            Err(e) => warn!(date = date, error = %e, "Cache read failed"),
        }

        let records = self.store.find_top_by_ratio(date, top_n).await?;

        if !records.is_empty() {
            if let Err(e) = self.cache.set_top(date, top_n, &records).await {
                warn!(date = date, error = %e, "Cache write failed");
            }
        }

        Ok(records)
    }

    /// 지정 일자의 시장 전체 沽空 집계를 조회합니다 (cache → DB).
    pub async fn get_market_short_stats(&self, date: &str) -> Result<Option<MarketStats>> {
        match self.cache.get_market_stats(date).await {
            Ok(Some(stats)) => return Ok(Some(stats)),
            Ok(None) => {}
            Err(e) => warn!(date = date, error = %e, "Cache read failed"),
        }

        let stats = self.store.market_stats(date).await?;

        if let Some(ref stats) = stats {
            if let Err(e) = self.cache.set_market_stats(stats).await {
                warn!(date = date, error = %e, "Cache write failed");
            }
        }

        Ok(stats)
    }

    /// 일자 범위의 과거 데이터를 백필합니다.
    ///
    /// 주말은 제외하며, `force`가 아니면 이미 데이터가 있는 일자는
    /// 건너뜁니다. 개별 일자 실패는 기록만 하고 계속 진행합니다.
    #[instrument(skip(self, progress))]
    pub async fn backfill_history(
        &self,
        start_date: &str,
        end_date: &str,
        force: bool,
        mut progress: Option<ProgressCallback<'_>>,
    ) -> Result<BackfillResult> {
        let dates = weekday_range(start_date, end_date)?;

        let mut result = BackfillResult {
            success: true,
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            total_dates: dates.len(),
            processed_dates: 0,
            skipped_dates: 0,
            failed_dates: Vec::new(),
            total_records: 0,
        };

        let existing: HashSet<String> = if force {
            HashSet::new()
        } else {
            self.store
                .dates_with_data(start_date, end_date)
                .await?
                .into_iter()
                .collect()
        };

        for (i, date) in dates.iter().enumerate() {
            if let Some(ref mut cb) = progress {
                cb(date, i + 1, dates.len());
            }

            if existing.contains(date) {
                info!(date = %date, "Skipping date with existing data");
                result.skipped_dates += 1;
                continue;
            }

            match self.fetch_daily_data(date).await {
                Ok(records) => {
                    result.processed_dates += 1;
                    result.total_records += records.len();
                    info!(date = %date, records = records.len(), "Backfilled date");
                }
                Err(e) => {
                    error!(date = %date, error = %e, "Backfill failed for date");
                    result.failed_dates.push(date.clone());
                }
            }
        }

        result.success = result.failed_dates.is_empty();
        Ok(result)
    }
}

/// 범위 내 평일(월~금) 일자 목록을 생성합니다.
fn weekday_range(start_date: &str, end_date: &str) -> Result<Vec<String>> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d")
        .map_err(|e| DataError::InvalidData(format!("Invalid start date: {}", e)))?;
    let end = NaiveDate::parse_from_str(end_date, "%Y-%m-%d")
        .map_err(|e| DataError::InvalidData(format!("Invalid end date: {}", e)))?;

    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(current.format("%Y-%m-%d").to_string());
        }
        current = current.succ_opt().ok_or_else(|| {
            DataError::InvalidData("Date range overflow".to_string())
        })?;
    }

    Ok(dates)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! 인메모리 store/cache 테스트 구현.

    use super::*;
    use crate::storage::UpsertOutcome;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// 인메모리 RecordStore.
    #[derive(Default)]
    pub struct MemoryStore {
        records: Mutex<HashMap<(String, String), ShortSellingRecord>>,
    }

    impl MemoryStore {
        pub fn record_count(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn upsert_records(&self, records: &[ShortSellingRecord]) -> Result<UpsertOutcome> {
            let mut map = self.records.lock().unwrap();
            let mut outcome = UpsertOutcome::default();
            for record in records {
                let key = (record.stock_code.clone(), record.date.clone());
                if let Some(existing) = map.get(&key) {
                    let mut updated = record.clone();
                    updated.created_at = existing.created_at;
                    map.insert(key, updated);
                    outcome.updated += 1;
                } else {
                    map.insert(key, record.clone());
                    outcome.inserted += 1;
                }
            }
            Ok(outcome)
        }

        async fn find_by_stock_and_date(
            &self,
            stock_code: &str,
            date: &str,
        ) -> Result<Option<ShortSellingRecord>> {
            let map = self.records.lock().unwrap();
            Ok(map.get(&(stock_code.to_string(), date.to_string())).cloned())
        }

        async fn find_by_stock_and_date_range(
            &self,
            stock_code: &str,
            start_date: &str,
            end_date: &str,
        ) -> Result<Vec<ShortSellingRecord>> {
            let map = self.records.lock().unwrap();
            let mut records: Vec<_> = map
                .values()
                .filter(|r| {
                    r.stock_code == stock_code
                        && r.date.as_str() >= start_date
                        && r.date.as_str() <= end_date
                })
                .cloned()
                .collect();
            records.sort_by(|a, b| a.date.cmp(&b.date));
            Ok(records)
        }

        async fn find_top_by_ratio(
            &self,
            date: &str,
            limit: i64,
        ) -> Result<Vec<ShortSellingRecord>> {
            let map = self.records.lock().unwrap();
            let mut records: Vec<_> = map.values().filter(|r| r.date == date).cloned().collect();
            records.sort_by(|a, b| b.short_ratio.total_cmp(&a.short_ratio));
            records.truncate(limit as usize);
            Ok(records)
        }

        async fn dates_with_data(&self, start_date: &str, end_date: &str) -> Result<Vec<String>> {
            let map = self.records.lock().unwrap();
            let mut dates: Vec<String> = map
                .values()
                .filter(|r| r.date.as_str() >= start_date && r.date.as_str() <= end_date)
                .map(|r| r.date.clone())
                .collect();
            dates.sort();
            dates.dedup();
            Ok(dates)
        }

        async fn market_stats(&self, date: &str) -> Result<Option<MarketStats>> {
            let map = self.records.lock().unwrap();
            let records: Vec<_> = map.values().filter(|r| r.date == date).collect();
            if records.is_empty() {
                return Ok(None);
            }
            let count = records.len() as i64;
            Ok(Some(MarketStats {
                date: date.to_string(),
                total_short_shares: records.iter().map(|r| r.short_shares).sum(),
                total_short_value: records.iter().map(|r| r.short_value).sum(),
                avg_short_ratio: records.iter().map(|r| r.short_ratio).sum::<f64>()
                    / count as f64,
                max_short_ratio: records
                    .iter()
                    .map(|r| r.short_ratio)
                    .fold(0.0, f64::max),
                stock_count: count,
            }))
        }
    }

    /// 인메모리 RecordCache. 키 형식은 Redis 구현과 동일합니다.
    #[derive(Default)]
    pub struct MemoryCache {
        entries: Mutex<HashMap<String, String>>,
    }

    impl MemoryCache {
        pub fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }

        fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
            let entries = self.entries.lock().unwrap();
            match entries.get(key) {
                Some(json) => Ok(Some(serde_json::from_str(json)?)),
                None => Ok(None),
            }
        }

        fn set_json<T: serde::Serialize>(&self, key: String, value: &T) -> Result<()> {
            let json = serde_json::to_string(value)?;
            self.entries.lock().unwrap().insert(key, json);
            Ok(())
        }
    }

    #[async_trait]
    impl RecordCache for MemoryCache {
        async fn get_record(
            &self,
            stock_code: &str,
            date: &str,
        ) -> Result<Option<ShortSellingRecord>> {
            self.get_json(&format!("hk_short:{}:{}", stock_code, date))
        }

        async fn set_record(&self, record: &ShortSellingRecord) -> Result<()> {
            self.set_json(
                format!("hk_short:{}:{}", record.stock_code, record.date),
                record,
            )
        }

        async fn get_market_stats(&self, date: &str) -> Result<Option<MarketStats>> {
            self.get_json(&format!("hk_short:daily:{}", date))
        }

        async fn set_market_stats(&self, stats: &MarketStats) -> Result<()> {
            self.set_json(format!("hk_short:daily:{}", stats.date), stats)
        }

        async fn get_top(
            &self,
            date: &str,
            limit: i64,
        ) -> Result<Option<Vec<ShortSellingRecord>>> {
            self.get_json(&format!("hk_short:top:{}:{}", date, limit))
        }

        async fn set_top(
            &self,
            date: &str,
            limit: i64,
            records: &[ShortSellingRecord],
        ) -> Result<()> {
            self.set_json(format!("hk_short:top:{}:{}", date, limit), &records.to_vec())
        }

        async fn invalidate_date(&self, date: &str) -> Result<u64> {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|key, _| !key.contains(date));
            Ok((before - entries.len()) as u64)
        }
    }
}
