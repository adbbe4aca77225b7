//! 沽空 데이터 기반 리스크/시장 분석.
//!
//! provider의 조회 API 위에 얹힌 파생 계산입니다. 저장소 오류는
//! "데이터 없음"과 같은 결과로 강등됩니다 — 분석 호출자는 항상
//! 완결된 리포트를 받습니다.

use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Asia::Hong_Kong;
use tracing::warn;

use crate::provider::ShortSellingProvider;
use hkshort_core::{
    normalize_stock_code, MarketAnalysis, RiskAnalysis, RiskLevel, Sentiment, Trend,
    DEFAULT_HISTORY_DAYS,
};

/// 홍콩 시간 기준 오늘 일자 (YYYY-MM-DD).
fn today_hk() -> String {
    Utc::now().with_timezone(&Hong_Kong).format("%Y-%m-%d").to_string()
}

/// `date`에서 `days`일 전 일자를 계산합니다.
fn history_start(date: &str, days: i64) -> Option<String> {
    let end = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((end - Duration::days(days)).format("%Y-%m-%d").to_string())
}

/// 히스토리 비율 통계: (평균, 최대, 최소). 표본 2개 미만이면 None.
fn history_stats(ratios: &[f64]) -> Option<(f64, f64, f64)> {
    if ratios.len() < 2 {
        return None;
    }
    let avg = ratios.iter().sum::<f64>() / ratios.len() as f64;
    let max = ratios.iter().fold(f64::MIN, |a, &b| a.max(b));
    let min = ratios.iter().fold(f64::MAX, |a, &b| a.min(b));
    Some((avg, max, min))
}

/// 특정 종목의 沽空 리스크를 분석합니다.
///
/// `date`가 None이면 홍콩 시간 기준 오늘을 사용합니다.
/// 추세는 최근 `DEFAULT_HISTORY_DAYS`일 평균 대비로 판정합니다.
pub async fn analyze_short_selling_risk(
    provider: &ShortSellingProvider,
    stock_code: &str,
    date: Option<&str>,
    risk_threshold: f64,
) -> RiskAnalysis {
    let date = date.map(str::to_string).unwrap_or_else(today_hk);
    let code = normalize_stock_code(stock_code);

    let current = match provider.get_stock_short_data(&code, &date).await {
        Ok(data) => data,
        Err(e) => {
            warn!(stock_code = %code, date = %date, error = %e, "Risk analysis lookup failed");
            None
        }
    };

    let Some(current) = current else {
        return RiskAnalysis::no_data(&code, &date);
    };

    let current_ratio = current.short_ratio;
    let risk_level = RiskLevel::classify(current_ratio, risk_threshold);
    let is_high_risk = current_ratio > risk_threshold;

    let mut result = RiskAnalysis {
        stock_code: code.clone(),
        date: date.clone(),
        has_data: true,
        current_ratio: Some(current_ratio),
        is_high_risk,
        risk_level,
        trend: Trend::Unknown,
        trend_description: String::new(),
        history_avg: None,
        history_max: None,
        history_min: None,
        analysis_text: String::new(),
    };

    let history = match history_start(&date, DEFAULT_HISTORY_DAYS) {
        Some(start) => provider
            .get_stock_short_history(&code, &start, &date)
            .await
            .unwrap_or_else(|e| {
                warn!(stock_code = %code, error = %e, "History lookup failed");
                Vec::new()
            }),
        None => Vec::new(),
    };

    let ratios: Vec<f64> = history.iter().map(|r| r.short_ratio).collect();
    if let Some((avg, max, min)) = history_stats(&ratios) {
        result.history_avg = Some(avg);
        result.history_max = Some(max);
        result.history_min = Some(min);

        result.trend = Trend::classify(current_ratio, avg);
        result.trend_description = match result.trend {
            Trend::Rising => format!(
                "Current short ratio is {:.1}% above the historical average",
                (current_ratio / avg - 1.0) * 100.0
            ),
            Trend::Falling => format!(
                "Current short ratio is {:.1}% below the historical average",
                (1.0 - current_ratio / avg) * 100.0
            ),
            Trend::Stable => "Current short ratio is close to the historical average".to_string(),
            Trend::Unknown => String::new(),
        };
    }

    result.analysis_text = render_risk_report(&result, risk_threshold);
    result
}

fn render_risk_report(result: &RiskAnalysis, risk_threshold: f64) -> String {
    let current_ratio = result.current_ratio.unwrap_or(0.0);
    let mut lines = vec![
        format!("## Short-Selling Risk Analysis - {}", result.stock_code),
        String::new(),
        format!("**Date**: {}", result.date),
        format!("**Current short ratio**: {:.2}%", current_ratio * 100.0),
        format!("**Risk level**: {}", result.risk_level),
        format!("**Trend**: {}", result.trend),
    ];

    if let (Some(avg), Some(max), Some(min)) =
        (result.history_avg, result.history_max, result.history_min)
    {
        lines.extend([
            String::new(),
            format!("### History (last {} days)", DEFAULT_HISTORY_DAYS),
            format!("- Average short ratio: {:.2}%", avg * 100.0),
            format!("- Maximum short ratio: {:.2}%", max * 100.0),
            format!("- Minimum short ratio: {:.2}%", min * 100.0),
        ]);
    }

    if result.is_high_risk {
        lines.extend([
            String::new(),
            "### Risk Warning".to_string(),
            format!(
                "Current short ratio ({:.2}%) exceeds the risk threshold ({:.0}%). \
                 Watch for sentiment shifts and potential downside risk.",
                current_ratio * 100.0,
                risk_threshold * 100.0
            ),
        ]);
    }

    if !result.trend_description.is_empty() {
        lines.extend([
            String::new(),
            "### Trend".to_string(),
            result.trend_description.clone(),
        ]);
    }

    lines.join("\n")
}

/// 특정 종목의 沽空 시장 분석 (정서 점수 중심).
///
/// 상위 50개 종목 내 순위와 5단계 정서 판정을 포함합니다.
pub async fn analyze_market_short_selling(
    provider: &ShortSellingProvider,
    stock_code: &str,
    date: Option<&str>,
) -> MarketAnalysis {
    let date = date.map(str::to_string).unwrap_or_else(today_hk);
    let code = normalize_stock_code(stock_code);

    let current = match provider.get_stock_short_data(&code, &date).await {
        Ok(data) => data,
        Err(e) => {
            warn!(stock_code = %code, date = %date, error = %e, "Market analysis lookup failed");
            None
        }
    };

    let Some(current) = current else {
        return MarketAnalysis::no_data(&code, &date);
    };

    let current_ratio = current.short_ratio;
    let sentiment = Sentiment::classify(current_ratio);

    // 상위 50개 내 순위 (없으면 None)
    let top_rank = match provider.get_top_short_stocks(&date, 50).await {
        Ok(top) => top
            .iter()
            .position(|r| r.stock_code == code)
            .map(|i| i + 1),
        Err(e) => {
            warn!(date = %date, error = %e, "Top stocks lookup failed");
            None
        }
    };

    let history = match history_start(&date, DEFAULT_HISTORY_DAYS) {
        Some(start) => provider
            .get_stock_short_history(&code, &start, &date)
            .await
            .unwrap_or_else(|e| {
                warn!(stock_code = %code, error = %e, "History lookup failed");
                Vec::new()
            }),
        None => Vec::new(),
    };

    let ratios: Vec<f64> = history.iter().map(|r| r.short_ratio).collect();
    let trend = match history_stats(&ratios) {
        Some((avg, _, _)) => Trend::classify(current_ratio, avg),
        None => Trend::Unknown,
    };

    let mut result = MarketAnalysis {
        stock_code: code,
        date,
        has_data: true,
        short_shares: Some(current.short_shares),
        short_value: Some(current.short_value),
        short_ratio: Some(current_ratio),
        trend,
        market_sentiment: sentiment,
        sentiment_score: sentiment.score(),
        top_rank,
        analysis_text: String::new(),
    };

    result.analysis_text = render_market_report(&result);
    result
}

fn render_market_report(result: &MarketAnalysis) -> String {
    let current_ratio = result.short_ratio.unwrap_or(0.0);
    let mut lines = vec![
        format!("## Short-Selling Market Analysis - {}", result.stock_code),
        String::new(),
        format!("**Date**: {}", result.date),
        String::new(),
        "### Short-Selling Metrics".to_string(),
        format!(
            "- Short shares: {} shares",
            result.short_shares.unwrap_or(0)
        ),
        format!(
            "- Short value: HK${:.2}",
            result.short_value.unwrap_or_default()
        ),
        format!("- Short ratio: {:.2}%", current_ratio * 100.0),
    ];

    if let Some(rank) = result.top_rank {
        lines.push(format!("- Short-selling rank: #{}", rank));
    }

    lines.extend([
        String::new(),
        "### Market Sentiment".to_string(),
        format!("- Sentiment: {}", result.market_sentiment),
        format!("- Trend: {}", result.trend),
        String::new(),
        "### Interpretation".to_string(),
        sentiment_interpretation(result.market_sentiment).to_string(),
    ]);

    lines.join("\n")
}

fn sentiment_interpretation(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::StronglyBearish => {
            "The market holds a strongly bearish view on this stock. Short-selling \
             activity is very heavy; beware of downside risk."
        }
        Sentiment::Bearish => {
            "The market leans bearish on this stock. The short ratio is elevated; \
             trade with caution."
        }
        Sentiment::Neutral => {
            "Market positioning on this stock is neutral. Short-selling activity \
             is at a normal level."
        }
        Sentiment::Bullish => {
            "The market leans bullish on this stock. The short ratio is low and \
             sentiment is relatively optimistic."
        }
        Sentiment::StronglyBullish => {
            "The market holds a strongly bullish view on this stock. Short-selling \
             activity is minimal and sentiment is very optimistic."
        }
    }
}
