//! Standalone short-selling data collector CLI.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hkshort_collector::{CollectorConfig, ShortSellingScheduler};
use hkshort_core::{HkHolidayCalendar, DEFAULT_RISK_THRESHOLD};
use hkshort_data::{
    analyze_market_short_selling, analyze_short_selling_risk, Database, ShortSellingCache,
    ShortSellingProvider, ShortSellingRepository,
};

#[derive(Parser)]
#[command(name = "hkshort-collector")]
#[command(about = "HK Short-Selling Data Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 지정 일자의 沽空 데이터 수집 (기본: 오늘, 홍콩 시간)
    Fetch {
        /// 대상 일자 (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// 일자 범위의 과거 데이터 백필 (주말 제외)
    Backfill {
        /// 시작 일자 (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// 종료 일자 (YYYY-MM-DD)
        #[arg(long)]
        end: String,
        /// 기존 데이터가 있는 일자도 다시 수집
        #[arg(long)]
        force: bool,
    },

    /// 일일 수집 작업을 즉시 실행 (거래일 판정 포함)
    TriggerNow,

    /// 종목 리스크 분석 리포트 출력
    AnalyzeRisk {
        /// 종목 코드 (예: 700, 00700)
        stock_code: String,
        /// 분석 일자 (기본: 오늘, 홍콩 시간)
        #[arg(long)]
        date: Option<String>,
    },

    /// 종목 시장 정서 분석 리포트 출력
    AnalyzeMarket {
        /// 종목 코드
        stock_code: String,
        /// 분석 일자 (기본: 오늘, 홍콩 시간)
        #[arg(long)]
        date: Option<String>,
    },

    /// 데몬 모드: 매 거래일 마감 후 자동 수집
    Daemon,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hkshort_collector={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("HK Short-Selling Collector starting");

    // 설정 로드 및 연결
    let config = CollectorConfig::from_env()?;

    let db = Database::connect(&config.database).await?;
    db.ensure_schema().await?;

    let cache = ShortSellingCache::connect(&config.redis).await?;

    let provider = Arc::new(ShortSellingProvider::new(
        Arc::new(ShortSellingRepository::new(db)),
        Arc::new(cache),
        &config.short_selling,
    )?);

    match cli.command {
        Commands::Fetch { date } => {
            let date = date.unwrap_or_else(today_hk);
            let records = provider.fetch_daily_data(&date).await?;
            tracing::info!(date = %date, records = records.len(), "Fetch complete");
        }
        Commands::Backfill { start, end, force } => {
            let mut progress = |date: &str, current: usize, total: usize| {
                tracing::info!(date = date, current = current, total = total, "Backfill progress");
            };
            let result = provider
                .backfill_history(&start, &end, force, Some(&mut progress))
                .await?;

            tracing::info!(
                success = result.success,
                total_dates = result.total_dates,
                processed = result.processed_dates,
                skipped = result.skipped_dates,
                failed = result.failed_dates.len(),
                records = result.total_records,
                "Backfill complete"
            );
            if !result.failed_dates.is_empty() {
                tracing::warn!(dates = ?result.failed_dates, "Some dates failed to backfill");
            }
        }
        Commands::TriggerNow => {
            let scheduler = ShortSellingScheduler::new(
                provider,
                Arc::new(HkHolidayCalendar::new()),
                &config.short_selling,
            );
            let result = scheduler.trigger_now().await;
            tracing::info!(
                date = %result.date,
                success = result.success,
                is_trading_day = result.is_trading_day,
                records = result.records_count,
                "Manual trigger complete"
            );
            if let Some(error) = result.error {
                return Err(error.into());
            }
        }
        Commands::AnalyzeRisk { stock_code, date } => {
            let result = analyze_short_selling_risk(
                &provider,
                &stock_code,
                date.as_deref(),
                DEFAULT_RISK_THRESHOLD,
            )
            .await;
            println!("{}", result.analysis_text);
        }
        Commands::AnalyzeMarket { stock_code, date } => {
            let result =
                analyze_market_short_selling(&provider, &stock_code, date.as_deref()).await;
            println!("{}", result.analysis_text);
        }
        Commands::Daemon => {
            let scheduler = ShortSellingScheduler::new(
                provider,
                Arc::new(HkHolidayCalendar::new()),
                &config.short_selling,
            );

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping scheduler");
                    scheduler.stop();
                }
                _ = scheduler.run() => {}
            }
        }
    }

    tracing::info!("HK Short-Selling Collector finished");
    Ok(())
}

/// 홍콩 시간 기준 오늘 일자.
fn today_hk() -> String {
    chrono::Utc::now()
        .with_timezone(&chrono_tz::Asia::Hong_Kong)
        .format("%Y-%m-%d")
        .to_string()
}
