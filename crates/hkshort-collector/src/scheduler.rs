//! 일일 수집 스케줄러.
//!
//! 매 거래일 마감 후(기본 18:00, 홍콩 시간) 당일 沽空 데이터를
//! 수집합니다. 주말은 다음 실행 시각 계산에서 건너뛰고, 공휴일은
//! 실행 시점에 캘린더로 판정해 no-op으로 처리합니다.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Asia::Hong_Kong;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use hkshort_core::{ShortSellingConfig, TradingCalendar};
use hkshort_data::ShortSellingProvider;

/// 일일 수집 작업 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// 대상 일자 (YYYY-MM-DD)
    pub date: String,
    /// 작업 성공 여부 (비거래일 no-op도 성공)
    pub success: bool,
    /// 거래일 여부
    pub is_trading_day: bool,
    /// 수집한 레코드 수
    pub records_count: usize,
    /// 실패 시 오류 메시지
    pub error: Option<String>,
}

/// 沽空 수집 스케줄러.
pub struct ShortSellingScheduler {
    provider: Arc<ShortSellingProvider>,
    calendar: Arc<dyn TradingCalendar>,
    schedule_hour: u32,
    schedule_minute: u32,
    token: CancellationToken,
}

impl ShortSellingScheduler {
    /// 새로운 스케줄러를 생성합니다.
    pub fn new(
        provider: Arc<ShortSellingProvider>,
        calendar: Arc<dyn TradingCalendar>,
        config: &ShortSellingConfig,
    ) -> Self {
        Self {
            provider,
            calendar,
            schedule_hour: config.schedule_hour,
            schedule_minute: config.schedule_minute,
            token: CancellationToken::new(),
        }
    }

    /// 스케줄러 중지용 토큰을 반환합니다.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// 스케줄러를 중지합니다.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// 스케줄 루프를 실행합니다. `stop` 호출 시까지 반환하지 않습니다.
    pub async fn run(&self) {
        info!(
            hour = self.schedule_hour,
            minute = self.schedule_minute,
            "Short-selling scheduler started (Asia/Hong_Kong)"
        );

        loop {
            let now = Utc::now().with_timezone(&Hong_Kong);
            let next = next_run_after(now, self.schedule_hour, self.schedule_minute);
            let wait = (next - now)
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);

            info!(next_run = %next.format("%Y-%m-%d %H:%M:%S"), "Next collection scheduled");

            tokio::select! {
                _ = self.token.cancelled() => {
                    info!("Scheduler stopped");
                    return;
                }
                _ = tokio::time::sleep(wait) => {
                    let result = self.run_daily_job().await;
                    if !result.success {
                        error!(date = %result.date, error = ?result.error, "Daily job failed");
                    }
                }
            }
        }
    }

    /// 당일 수집 작업을 즉시 실행합니다 (스케줄과 동일한 로직).
    pub async fn trigger_now(&self) -> JobResult {
        info!("Manually triggering daily collection");
        self.run_daily_job().await
    }

    /// 오늘(홍콩 시간)의 수집 작업을 실행합니다.
    pub async fn run_daily_job(&self) -> JobResult {
        let today = Utc::now().with_timezone(&Hong_Kong).date_naive();
        self.run_job_for(today).await
    }

    /// 지정 일자의 수집 작업을 실행합니다.
    ///
    /// 비거래일이면 수집 없이 성공으로 끝납니다 — 휴장은 오류가 아닙니다.
    pub async fn run_job_for(&self, date: NaiveDate) -> JobResult {
        let date_str = date.format("%Y-%m-%d").to_string();

        if !self.calendar.is_trading_day(date) {
            info!(date = %date_str, "Not a trading day, skipping collection");
            return JobResult {
                date: date_str,
                success: true,
                is_trading_day: false,
                records_count: 0,
                error: None,
            };
        }

        match self.provider.fetch_daily_data(&date_str).await {
            Ok(records) => {
                if records.is_empty() {
                    warn!(date = %date_str, "Daily collection returned no records");
                }
                JobResult {
                    date: date_str,
                    success: true,
                    is_trading_day: true,
                    records_count: records.len(),
                    error: None,
                }
            }
            Err(e) => JobResult {
                date: date_str,
                success: false,
                is_trading_day: true,
                records_count: 0,
                error: Some(e.to_string()),
            },
        }
    }
}

/// `now` 이후의 다음 실행 시각을 계산합니다 (평일만).
///
/// 공휴일은 여기서 거르지 않습니다 — 실행 시점에 캘린더로 판정합니다.
fn next_run_after(now: DateTime<Tz>, hour: u32, minute: u32) -> DateTime<Tz> {
    let mut date = now.date_naive();

    // 오늘 실행 시각이 이미 지났으면 다음 날부터
    let today_run = run_at(date, hour, minute);
    if today_run <= now {
        date += ChronoDuration::days(1);
    }

    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date += ChronoDuration::days(1);
    }

    run_at(date, hour, minute)
}

fn run_at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Tz> {
    // 홍콩은 DST가 없으므로 로컬 시각이 항상 유일함
    match Hong_Kong.with_ymd_and_hms(date.year(), date.month(), date.day(), hour, minute, 0) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(dt, _) => dt,
        chrono::LocalResult::None => Hong_Kong
            .with_ymd_and_hms(date.year(), date.month(), date.day(), 12, 0, 0)
            .unwrap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hkshort_core::{HkHolidayCalendar, MarketStats, ShortSellingRecord};
    use hkshort_data::storage::UpsertOutcome;
    use hkshort_data::{RecordCache, RecordStore};

    /// 아무 데이터도 없는 store/cache. 비거래일 경로에서는 호출되지 않습니다.
    struct NullStore;

    #[async_trait]
    impl RecordStore for NullStore {
        async fn upsert_records(
            &self,
            _records: &[ShortSellingRecord],
        ) -> hkshort_data::Result<UpsertOutcome> {
            Ok(UpsertOutcome::default())
        }

        async fn find_by_stock_and_date(
            &self,
            _stock_code: &str,
            _date: &str,
        ) -> hkshort_data::Result<Option<ShortSellingRecord>> {
            Ok(None)
        }

        async fn find_by_stock_and_date_range(
            &self,
            _stock_code: &str,
            _start_date: &str,
            _end_date: &str,
        ) -> hkshort_data::Result<Vec<ShortSellingRecord>> {
            Ok(Vec::new())
        }

        async fn find_top_by_ratio(
            &self,
            _date: &str,
            _limit: i64,
        ) -> hkshort_data::Result<Vec<ShortSellingRecord>> {
            Ok(Vec::new())
        }

        async fn dates_with_data(
            &self,
            _start_date: &str,
            _end_date: &str,
        ) -> hkshort_data::Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn market_stats(&self, _date: &str) -> hkshort_data::Result<Option<MarketStats>> {
            Ok(None)
        }
    }

    struct NullCache;

    #[async_trait]
    impl RecordCache for NullCache {
        async fn get_record(
            &self,
            _stock_code: &str,
            _date: &str,
        ) -> hkshort_data::Result<Option<ShortSellingRecord>> {
            Ok(None)
        }

        async fn set_record(&self, _record: &ShortSellingRecord) -> hkshort_data::Result<()> {
            Ok(())
        }

        async fn get_market_stats(
            &self,
            _date: &str,
        ) -> hkshort_data::Result<Option<MarketStats>> {
            Ok(None)
        }

        async fn set_market_stats(&self, _stats: &MarketStats) -> hkshort_data::Result<()> {
            Ok(())
        }

        async fn get_top(
            &self,
            _date: &str,
            _limit: i64,
        ) -> hkshort_data::Result<Option<Vec<ShortSellingRecord>>> {
            Ok(None)
        }

        async fn set_top(
            &self,
            _date: &str,
            _limit: i64,
            _records: &[ShortSellingRecord],
        ) -> hkshort_data::Result<()> {
            Ok(())
        }

        async fn invalidate_date(&self, _date: &str) -> hkshort_data::Result<u64> {
            Ok(0)
        }
    }

    fn test_scheduler(calendar: Arc<dyn TradingCalendar>) -> ShortSellingScheduler {
        let provider = Arc::new(
            ShortSellingProvider::new(
                Arc::new(NullStore),
                Arc::new(NullCache),
                &ShortSellingConfig::default(),
            )
            .unwrap(),
        );
        ShortSellingScheduler::new(provider, calendar, &ShortSellingConfig::default())
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_holiday_job_is_successful_noop() {
        // 2025-07-01 화요일, 공휴일
        let scheduler = test_scheduler(Arc::new(HkHolidayCalendar::new()));
        let result = scheduler.run_job_for(date("2025-07-01")).await;

        assert!(result.success);
        assert!(!result.is_trading_day);
        assert_eq!(result.records_count, 0);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_weekend_job_is_successful_noop() {
        let scheduler = test_scheduler(Arc::new(HkHolidayCalendar::new()));
        // 2025-03-08 토요일
        let result = scheduler.run_job_for(date("2025-03-08")).await;

        assert!(result.success);
        assert!(!result.is_trading_day);
    }

    #[test]
    fn test_next_run_same_day_before_schedule() {
        // 2025-03-10 월요일 10:00 → 같은 날 18:00
        let now = Hong_Kong.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap();
        let next = next_run_after(now, 18, 0);
        assert_eq!(next, Hong_Kong.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_next_run_after_schedule_moves_to_next_weekday() {
        // 2025-03-07 금요일 19:00 → 다음 월요일 18:00
        let now = Hong_Kong.with_ymd_and_hms(2025, 3, 7, 19, 0, 0).unwrap();
        let next = next_run_after(now, 18, 0);
        assert_eq!(next, Hong_Kong.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_next_run_on_weekend_moves_to_monday() {
        // 2025-03-08 토요일 12:00 → 월요일 18:00
        let now = Hong_Kong.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap();
        let next = next_run_after(now, 18, 0);
        assert_eq!(next, Hong_Kong.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_next_run_exactly_at_schedule_moves_forward() {
        let now = Hong_Kong.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap();
        let next = next_run_after(now, 18, 0);
        assert_eq!(next, Hong_Kong.with_ymd_and_hms(2025, 3, 11, 18, 0, 0).unwrap());
    }
}
