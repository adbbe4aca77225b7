//! 沽空(short-selling) 레코드 도메인 모델.
//!
//! 한 종목의 하루치 沽空 관측치를 표현합니다. `(stock_code, date)` 조합이
//! 자연키이며, 날짜는 항상 canonical `YYYY-MM-DD` 문자열로 저장/비교합니다
//! (문자열 범위 비교가 곧 날짜 범위 비교가 되도록).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// 종목 코드 자릿수 (홍콩거래소 5자리 형식).
pub const STOCK_CODE_WIDTH: usize = 5;

/// 종목 코드를 5자리 zero-padded 형식으로 정규화합니다.
///
/// 숫자 이외의 문자는 제거하고 왼쪽을 0으로 채웁니다.
/// `"700"`, `"0700"`, `"00700"` 모두 `"00700"`이 됩니다.
pub fn normalize_stock_code(code: &str) -> String {
    let digits: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("{:0>width$}", digits, width = STOCK_CODE_WIDTH)
}

/// 한 종목의 하루치 沽空 관측 레코드.
///
/// serde 직렬화가 저장/전송용 flat key-value 표현입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortSellingRecord {
    /// 종목 코드 (5자리 zero-padded, 예: "00700")
    pub stock_code: String,
    /// 종목명 (알 수 없으면 빈 문자열)
    pub stock_name: String,
    /// 데이터 일자 (YYYY-MM-DD)
    pub date: String,
    /// 沽空 주식 수
    pub short_shares: i64,
    /// 沽空 금액 (HKD)
    pub short_value: Decimal,
    /// 沽空 비율 (소수, 0.0523 = 5.23%)
    pub short_ratio: f64,
    /// 최초 저장 시각 (upsert 시 보존)
    pub created_at: DateTime<Utc>,
    /// 마지막 갱신 시각 (upsert마다 갱신)
    pub updated_at: DateTime<Utc>,
}

impl ShortSellingRecord {
    /// 새 레코드를 생성합니다. 코드는 정규화되고 타임스탬프는 현재 시각입니다.
    pub fn new(
        stock_code: &str,
        stock_name: &str,
        date: &str,
        short_shares: i64,
        short_value: Decimal,
        short_ratio: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            stock_code: normalize_stock_code(stock_code),
            stock_name: stock_name.to_string(),
            date: date.to_string(),
            short_shares,
            short_value,
            short_ratio,
            created_at: now,
            updated_at: now,
        }
    }

    /// 불변식 검사: 지표는 모두 0 이상, 비율은 [0, 1] 범위.
    ///
    /// 파서는 이 검사를 통과하지 못하는 행을 저장하지 않고 버립니다.
    pub fn validate(&self) -> Result<()> {
        if self.short_shares < 0 {
            return Err(CoreError::InvalidRecord(format!(
                "negative short_shares: {}",
                self.short_shares
            )));
        }
        if self.short_value < Decimal::ZERO {
            return Err(CoreError::InvalidRecord(format!(
                "negative short_value: {}",
                self.short_value
            )));
        }
        if !(0.0..=1.0).contains(&self.short_ratio) {
            return Err(CoreError::InvalidRecord(format!(
                "short_ratio out of range: {}",
                self.short_ratio
            )));
        }
        parse_record_date(&self.date)?;
        Ok(())
    }
}

/// 특정 일자의 전체 시장 沽空 통계.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    /// 데이터 일자 (YYYY-MM-DD)
    pub date: String,
    /// 沽空 주식 수 합계
    pub total_short_shares: i64,
    /// 沽空 금액 합계 (HKD)
    pub total_short_value: Decimal,
    /// 평균 沽空 비율
    pub avg_short_ratio: f64,
    /// 최대 沽空 비율
    pub max_short_ratio: f64,
    /// 데이터가 있는 종목 수
    pub stock_count: i64,
}

/// canonical `YYYY-MM-DD` 날짜 문자열을 파싱합니다.
pub fn parse_record_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidDate(date.to_string()))
}

/// 날짜를 URL용 compact 형식(YYYYMMDD)으로 변환합니다.
pub fn compact_date(date: &str) -> String {
    date.replace('-', "")
}
