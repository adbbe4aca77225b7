//! 港交所(HKEX) 沽空 보고서 HTML 파서.
//!
//! 반구조화된 HTML 페이지에서 沽空 레코드를 추출합니다. 형식이 깨진 행은
//! 경고만 남기고 건너뛰며, 파싱 자체는 절대 실패하지 않습니다
//! (빈 결과가 곧 "데이터 없음"입니다).

use chrono::Utc;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::str::FromStr;
use tracing::{debug, warn};

use hkshort_core::{normalize_stock_code, ShortSellingRecord};

/// HKEX 沽空 보고서 파서.
///
/// 데이터 행 판정: 셀 5개 이상 + 첫 셀이 숫자로만 구성
/// (말미 소수점은 무시). 그 외 행은 헤더/장식으로 간주합니다.
#[derive(Debug, Default)]
pub struct HkexShortSellingParser;

impl HkexShortSellingParser {
    pub fn new() -> Self {
        Self
    }

    /// HTML에서 沽空 레코드를 추출합니다.
    ///
    /// # 인자
    /// - `html`: 원본 HTML 문자열
    /// - `date`: 데이터 일자 (YYYY-MM-DD)
    pub fn parse(&self, html: &str, date: &str) -> Vec<ShortSellingRecord> {
        let document = Html::parse_document(html);

        // Selector 파싱은 리터럴이므로 실패하지 않음
        let table_selector = Selector::parse("table").expect("static selector");
        let row_selector = Selector::parse("tr").expect("static selector");
        let cell_selector = Selector::parse("td, th").expect("static selector");

        let now = Utc::now();
        let mut records = Vec::new();

        for table in document.select(&table_selector) {
            for row in table.select(&row_selector) {
                let cells: Vec<String> = row
                    .select(&cell_selector)
                    .map(|c| cell_text(&c))
                    .collect();

                // 헤더/장식 행 건너뛰기
                if cells.len() < 5 || !is_numeric_looking(&cells[0]) {
                    continue;
                }

                match self.parse_row(&cells, date, now) {
                    Some(record) => records.push(record),
                    None => {
                        warn!(code = %cells[0], date = date, "Skipping malformed short-selling row");
                    }
                }
            }
        }

        debug!(date = date, count = records.len(), "Parsed short-selling HTML");
        records
    }

    /// 데이터 행 하나를 레코드로 변환합니다.
    ///
    /// 숫자 셀 중 하나라도 파싱에 완전히 실패하면 행 전체를 버립니다 —
    /// 부분 데이터는 저장하지 않습니다 (`-`/빈 셀은 0으로 파싱되는 것과 구분).
    fn parse_row(
        &self,
        cells: &[String],
        date: &str,
        now: chrono::DateTime<Utc>,
    ) -> Option<ShortSellingRecord> {
        let stock_code = normalize_stock_code(&cells[0]);
        let stock_name = cells[1].clone();

        let short_shares = parse_numeric(&cells[2])? as i64;
        let short_value = parse_decimal(&cells[3])?;
        let short_ratio = parse_ratio(&cells[4])?;

        let record = ShortSellingRecord {
            stock_code,
            stock_name,
            date: date.to_string(),
            short_shares,
            short_value,
            short_ratio,
            created_at: now,
            updated_at: now,
        };

        // 음수/범위 밖 지표가 있는 행은 저장하지 않음
        record.validate().ok()?;
        Some(record)
    }
}

/// 셀의 텍스트를 공백 정리해 추출합니다.
fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// 첫 셀이 숫자 형태인지 판정합니다 (소수점 무시).
fn is_numeric_looking(s: &str) -> bool {
    let cleaned: String = s.chars().filter(|c| *c != '.').collect();
    !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_digit())
}

/// 천 단위 구분자가 있는 숫자 문자열을 파싱합니다.
///
/// `-` 또는 빈 문자열은 결측이 아니라 0.0입니다 (합법적인 "沽空 없음" 일자).
/// 그 외 파싱 실패는 `None`입니다.
fn parse_numeric(value: &str) -> Option<f64> {
    let cleaned = value.replace([',', ' '], "");
    if cleaned.is_empty() || cleaned == "-" {
        return Some(0.0);
    }
    cleaned.parse().ok()
}

/// 금액 문자열을 Decimal로 파싱합니다 (`parse_numeric`과 같은 규칙).
fn parse_decimal(value: &str) -> Option<Decimal> {
    let cleaned = value.replace([',', ' '], "");
    if cleaned.is_empty() || cleaned == "-" {
        return Some(Decimal::ZERO);
    }
    Decimal::from_str(&cleaned).ok()
}

/// 백분율 문자열을 소수로 파싱합니다 ("5.23%" → 0.0523).
fn parse_ratio(value: &str) -> Option<f64> {
    let cleaned = value.replace(['%', ' '], "");
    if cleaned.is_empty() || cleaned == "-" {
        return Some(0.0);
    }
    cleaned.parse::<f64>().ok().map(|v| v / 100.0)
}
