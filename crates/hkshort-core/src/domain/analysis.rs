//! 沽空 리스크/시장 분석 결과 타입과 분류 규칙.
//!
//! 분석 결과는 저장되지 않는 파생 데이터입니다. 분류는 단순한 단조 임계값
//! 사다리이며 통계 모델이 아닙니다.

use serde::{Deserialize, Serialize};

/// 기본 리스크 임계값 (沽空 비율 10%).
pub const DEFAULT_RISK_THRESHOLD: f64 = 0.10;

/// 추세 계산에 사용하는 기본 히스토리 일수.
pub const DEFAULT_HISTORY_DAYS: i64 = 20;

/// 리스크 등급.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Extreme,
    /// 데이터 없음 — `short_ratio = 0`인 저위험과는 다른 상태
    Unknown,
}

impl RiskLevel {
    /// 沽空 비율을 리스크 등급으로 분류합니다.
    ///
    /// `> 0.30` → extreme, `> 0.20` → high, `> threshold` → medium, 이외 low.
    pub fn classify(ratio: f64, threshold: f64) -> Self {
        if ratio > 0.30 {
            Self::Extreme
        } else if ratio > 0.20 {
            Self::High
        } else if ratio > threshold {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Extreme => "extreme",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 沽空 비율 추세.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
    /// 히스토리가 부족해 판정 불가
    Unknown,
}

impl Trend {
    /// 현재 비율을 히스토리 평균과 비교해 추세를 분류합니다.
    ///
    /// 평균의 110% 초과 → rising, 90% 미만 → falling, 이외 stable.
    /// 평균이 0 이하이면 판정할 수 없습니다.
    pub fn classify(current: f64, history_avg: f64) -> Self {
        if history_avg <= 0.0 {
            return Self::Unknown;
        }
        let ratio_to_avg = current / history_avg;
        if ratio_to_avg > 1.10 {
            Self::Rising
        } else if ratio_to_avg < 0.90 {
            Self::Falling
        } else {
            Self::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Stable => "stable",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 시장 정서 (5단계).
///
/// 沽空 비율이 높을수록 약세 정서가 강합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    StronglyBearish,
    Bearish,
    Neutral,
    Bullish,
    StronglyBullish,
}

impl Sentiment {
    /// 沽空 비율을 정서로 분류합니다 (임계값 0.25/0.15/0.08/0.03).
    pub fn classify(ratio: f64) -> Self {
        if ratio > 0.25 {
            Self::StronglyBearish
        } else if ratio > 0.15 {
            Self::Bearish
        } else if ratio > 0.08 {
            Self::Neutral
        } else if ratio > 0.03 {
            Self::Bullish
        } else {
            Self::StronglyBullish
        }
    }

    /// [-2, 2] 범위의 정수 점수.
    pub fn score(&self) -> i8 {
        match self {
            Self::StronglyBearish => -2,
            Self::Bearish => -1,
            Self::Neutral => 0,
            Self::Bullish => 1,
            Self::StronglyBullish => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StronglyBearish => "strongly bearish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
            Self::Bullish => "bullish",
            Self::StronglyBullish => "strongly bullish",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 沽空 리스크 분석 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAnalysis {
    /// 종목 코드 (정규화됨)
    pub stock_code: String,
    /// 분석 일자 (YYYY-MM-DD)
    pub date: String,
    /// 해당 일자 데이터 존재 여부
    pub has_data: bool,
    /// 당일 沽空 비율
    pub current_ratio: Option<f64>,
    /// 리스크 임계값 초과 여부
    pub is_high_risk: bool,
    /// 리스크 등급
    pub risk_level: RiskLevel,
    /// 추세
    pub trend: Trend,
    /// 추세 설명 (평균 대비 편차)
    pub trend_description: String,
    /// 히스토리 평균 비율
    pub history_avg: Option<f64>,
    /// 히스토리 최대 비율
    pub history_max: Option<f64>,
    /// 히스토리 최소 비율
    pub history_min: Option<f64>,
    /// 사람이 읽을 수 있는 분석 리포트 (markdown)
    pub analysis_text: String,
}

impl RiskAnalysis {
    /// 데이터가 없는 경우의 결과를 생성합니다.
    pub fn no_data(stock_code: &str, date: &str) -> Self {
        Self {
            stock_code: stock_code.to_string(),
            date: date.to_string(),
            has_data: false,
            current_ratio: None,
            is_high_risk: false,
            risk_level: RiskLevel::Unknown,
            trend: Trend::Unknown,
            trend_description: String::new(),
            history_avg: None,
            history_max: None,
            history_min: None,
            analysis_text: format!(
                "No short-selling data found for {} on {}",
                stock_code, date
            ),
        }
    }
}

/// 沽空 시장 분석 결과 (정서 점수 중심).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketAnalysis {
    /// 종목 코드 (정규화됨)
    pub stock_code: String,
    /// 분석 일자 (YYYY-MM-DD)
    pub date: String,
    /// 해당 일자 데이터 존재 여부
    pub has_data: bool,
    /// 沽空 주식 수
    pub short_shares: Option<i64>,
    /// 沽空 금액 (HKD)
    pub short_value: Option<rust_decimal::Decimal>,
    /// 沽空 비율
    pub short_ratio: Option<f64>,
    /// 추세
    pub trend: Trend,
    /// 시장 정서
    pub market_sentiment: Sentiment,
    /// 정서 점수 [-2, 2]
    pub sentiment_score: i8,
    /// 당일 沽空 비율 순위 (top 50 이내일 때만)
    pub top_rank: Option<usize>,
    /// 사람이 읽을 수 있는 분석 리포트 (markdown)
    pub analysis_text: String,
}

impl MarketAnalysis {
    /// 데이터가 없는 경우의 결과를 생성합니다.
    pub fn no_data(stock_code: &str, date: &str) -> Self {
        Self {
            stock_code: stock_code.to_string(),
            date: date.to_string(),
            has_data: false,
            short_shares: None,
            short_value: None,
            short_ratio: None,
            trend: Trend::Unknown,
            market_sentiment: Sentiment::Neutral,
            sentiment_score: 0,
            top_rank: None,
            analysis_text: format!(
                "No short-selling data found for {} on {}",
                stock_code, date
            ),
        }
    }
}
