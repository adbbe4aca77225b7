//! Integration tests against live PostgreSQL and Redis.
//!
//! These tests require DATABASE_URL and REDIS_URL to point at running
//! services, so they are ignored by default:
//!
//! ```sh
//! DATABASE_URL=postgresql://... REDIS_URL=redis://... cargo test -p hkshort-data -- --ignored
//! ```

use std::sync::Arc;

use hkshort_core::{ShortSellingConfig, ShortSellingRecord};
use hkshort_data::{
    analyze_short_selling_risk, Database, DatabaseConfig, RecordStore, RedisConfig,
    ShortSellingCache, ShortSellingProvider, ShortSellingRepository,
};
use rust_decimal_macros::dec;

async fn live_provider() -> (ShortSellingProvider, Arc<ShortSellingRepository>) {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL must be set");

    let db = Database::connect(&DatabaseConfig {
        url: database_url,
        ..Default::default()
    })
    .await
    .expect("database connection failed");
    db.ensure_schema().await.expect("schema setup failed");

    let cache = ShortSellingCache::connect(&RedisConfig {
        url: redis_url,
        ..Default::default()
    })
    .await
    .expect("redis connection failed");

    let repo = Arc::new(ShortSellingRepository::new(db));
    let provider = ShortSellingProvider::new(
        repo.clone(),
        Arc::new(cache),
        &ShortSellingConfig {
            min_request_interval_secs: 0.0,
            ..Default::default()
        },
    )
    .expect("provider construction failed");

    (provider, repo)
}

fn record(code: &str, date: &str, ratio: f64) -> ShortSellingRecord {
    ShortSellingRecord::new(code, "Integration Test", date, 1_000, dec!(50000), ratio)
}

#[tokio::test]
#[ignore]
async fn test_read_through_and_analysis_against_live_services() {
    let (provider, repo) = live_provider().await;

    // Seed a short history ending in a spike
    let records = vec![
        record("99700", "2031-03-05", 0.10),
        record("99700", "2031-03-06", 0.10),
        record("99700", "2031-03-07", 0.10),
        record("99700", "2031-03-10", 0.22),
    ];
    repo.upsert_records(&records).await.unwrap();

    // First read goes to the database, second should hit the cache
    let first = provider
        .get_stock_short_data("99700", "2031-03-10")
        .await
        .unwrap()
        .expect("seeded record must be found");
    let second = provider
        .get_stock_short_data("99700", "2031-03-10")
        .await
        .unwrap()
        .expect("cached record must be found");
    assert_eq!(first, second);

    let history = provider
        .get_stock_short_history("99700", "2031-03-01", "2031-03-31")
        .await
        .unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].date, "2031-03-05");

    let analysis =
        analyze_short_selling_risk(&provider, "99700", Some("2031-03-10"), 0.10).await;
    assert!(analysis.has_data);
    assert!(analysis.is_high_risk);
    assert!(analysis.analysis_text.contains("Risk Warning"));
}

#[tokio::test]
#[ignore]
async fn test_market_stats_aggregation_against_live_services() {
    let (provider, repo) = live_provider().await;

    let records = vec![
        record("99001", "2031-04-01", 0.02),
        record("99002", "2031-04-01", 0.08),
        record("99003", "2031-04-01", 0.05),
    ];
    repo.upsert_records(&records).await.unwrap();

    let stats = provider
        .get_market_short_stats("2031-04-01")
        .await
        .unwrap()
        .expect("seeded stats must exist");
    assert_eq!(stats.stock_count, 3);
    assert!((stats.avg_short_ratio - 0.05).abs() < 1e-9);
    assert!((stats.max_short_ratio - 0.08).abs() < 1e-9);

    let top = provider.get_top_short_stocks("2031-04-01", 2).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].stock_code, "99002");
}
