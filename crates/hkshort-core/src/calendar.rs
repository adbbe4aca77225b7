//! 거래 캘린더.
//!
//! 주말과 홍콩 공휴일을 판정합니다. 공휴일 목록은 trait 뒤로 주입되므로
//! 스케줄링 로직을 재컴파일하지 않고 교체할 수 있습니다.
//! 등록되지 않은 연도는 "공휴일 아님"으로 처리합니다 (silent degrade).

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;

/// 거래일 판정 인터페이스.
pub trait TradingCalendar: Send + Sync {
    /// 해당 일자가 공휴일인지 여부.
    fn is_holiday(&self, date: NaiveDate) -> bool;

    /// 거래일 여부: 평일이면서 공휴일이 아닌 날.
    fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }
}

/// 홍콩 공휴일 캘린더.
///
/// 2024–2026년 공휴일이 내장되어 있으며, 운영 중에는 `from_dates`로
/// 갱신된 목록을 주입할 수 있습니다.
#[derive(Debug, Clone)]
pub struct HkHolidayCalendar {
    holidays: HashSet<NaiveDate>,
}

/// 홍콩 공휴일 (연 1회 갱신 필요).
const HK_HOLIDAYS: &[&str] = &[
    // 2024
    "2024-01-01", "2024-02-10", "2024-02-11", "2024-02-12", "2024-02-13",
    "2024-03-29", "2024-04-01", "2024-04-04", "2024-05-01", "2024-05-15",
    "2024-06-10", "2024-07-01", "2024-09-18", "2024-10-01", "2024-10-11",
    "2024-12-25", "2024-12-26",
    // 2025
    "2025-01-01", "2025-01-29", "2025-01-30", "2025-01-31",
    "2025-04-04", "2025-04-18", "2025-04-21", "2025-05-01", "2025-05-05",
    "2025-05-31", "2025-07-01", "2025-10-01", "2025-10-07",
    "2025-12-25", "2025-12-26",
    // 2026
    "2026-01-01", "2026-02-17", "2026-02-18", "2026-02-19",
    "2026-04-03", "2026-04-06", "2026-04-25", "2026-05-01", "2026-05-24",
    "2026-06-19", "2026-07-01", "2026-10-01", "2026-10-26",
    "2026-12-25", "2026-12-26",
];

impl HkHolidayCalendar {
    /// 내장 공휴일 목록으로 캘린더를 생성합니다.
    pub fn new() -> Self {
        let holidays = HK_HOLIDAYS
            .iter()
            .filter_map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .collect();
        Self { holidays }
    }

    /// 임의의 날짜 목록으로 캘린더를 생성합니다 (외부 캘린더 소스용).
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: dates.into_iter().collect(),
        }
    }

    /// 등록된 공휴일 수.
    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }
}

impl Default for HkHolidayCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl TradingCalendar for HkHolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_weekend_is_not_trading_day() {
        let calendar = HkHolidayCalendar::new();
        // 2025-03-08 토요일, 2025-03-09 일요일
        assert!(!calendar.is_trading_day(date("2025-03-08")));
        assert!(!calendar.is_trading_day(date("2025-03-09")));
        // 2025-03-10 월요일
        assert!(calendar.is_trading_day(date("2025-03-10")));
    }

    #[test]
    fn test_holiday_is_not_trading_day() {
        let calendar = HkHolidayCalendar::new();
        // 2025-07-01 화요일, HKSAR 설립일
        assert!(calendar.is_holiday(date("2025-07-01")));
        assert!(!calendar.is_trading_day(date("2025-07-01")));
    }

    #[test]
    fn test_unknown_year_degrades_to_not_holiday() {
        let calendar = HkHolidayCalendar::new();
        // 2030년은 미등록 — 평일이면 거래일로 간주
        assert!(calendar.is_trading_day(date("2030-01-02")));
    }

    #[test]
    fn test_injected_dates() {
        let calendar = HkHolidayCalendar::from_dates([date("2027-05-03")]);
        assert!(calendar.is_holiday(date("2027-05-03")));
        assert!(!calendar.is_trading_day(date("2027-05-03")));
        assert!(!calendar.is_holiday(date("2025-07-01")));
    }
}
