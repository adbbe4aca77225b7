//! 도메인 모델.

pub mod analysis;
pub mod record;

pub use analysis::{
    MarketAnalysis, RiskAnalysis, RiskLevel, Sentiment, Trend, DEFAULT_HISTORY_DAYS,
    DEFAULT_RISK_THRESHOLD,
};
pub use record::{
    compact_date, normalize_stock_code, parse_record_date, MarketStats, ShortSellingRecord,
    STOCK_CODE_WIDTH,
};
