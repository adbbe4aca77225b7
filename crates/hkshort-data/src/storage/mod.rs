//! 저장소 모듈 - PostgreSQL 영속 저장소 및 Redis 캐시.

pub mod postgres;
pub mod redis;

use async_trait::async_trait;

use crate::error::Result;
use hkshort_core::{MarketStats, ShortSellingRecord};

/// upsert 배치 결과.
#[derive(Debug, Clone, Default)]
pub struct UpsertOutcome {
    /// 새로 삽입된 레코드 수
    pub inserted: u64,
    /// 갱신된 레코드 수
    pub updated: u64,
    /// 저장 실패한 레코드 수
    pub failed: u64,
}

impl UpsertOutcome {
    /// 처리에 성공한 총 레코드 수.
    pub fn total_written(&self) -> u64 {
        self.inserted + self.updated
    }
}

/// 沽空 레코드 영속 저장소.
///
/// (stock_code, date)를 유일 키로 하며, upsert는 레코드별로 독립적입니다 —
/// 한 레코드 실패가 배치 전체를 중단시키지 않습니다.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 레코드 배치를 upsert합니다.
    async fn upsert_records(&self, records: &[ShortSellingRecord]) -> Result<UpsertOutcome>;

    /// 특정 종목의 특정 일자 레코드를 조회합니다.
    async fn find_by_stock_and_date(
        &self,
        stock_code: &str,
        date: &str,
    ) -> Result<Option<ShortSellingRecord>>;

    /// 특정 종목의 일자 범위 레코드를 조회합니다 (일자 오름차순).
    async fn find_by_stock_and_date_range(
        &self,
        stock_code: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<ShortSellingRecord>>;

    /// 특정 일자의 沽空 비율 상위 레코드를 조회합니다 (비율 내림차순).
    async fn find_top_by_ratio(&self, date: &str, limit: i64) -> Result<Vec<ShortSellingRecord>>;

    /// 일자 범위 중 데이터가 있는 일자 목록을 반환합니다.
    async fn dates_with_data(&self, start_date: &str, end_date: &str) -> Result<Vec<String>>;

    /// 특정 일자의 시장 전체 집계를 계산합니다.
    async fn market_stats(&self, date: &str) -> Result<Option<MarketStats>>;
}

/// 沽空 조회 결과 캐시.
///
/// 캐시는 항상 best-effort입니다. 구현체는 조회 실패를 miss로 처리할 수
/// 있지만, 쓰기 실패는 오류로 반환해 호출자가 로깅하도록 합니다.
#[async_trait]
pub trait RecordCache: Send + Sync {
    /// 종목+일자 레코드 캐시 조회.
    async fn get_record(&self, stock_code: &str, date: &str)
        -> Result<Option<ShortSellingRecord>>;

    /// 종목+일자 레코드 캐시 저장.
    async fn set_record(&self, record: &ShortSellingRecord) -> Result<()>;

    /// 일자별 시장 집계 캐시 조회.
    async fn get_market_stats(&self, date: &str) -> Result<Option<MarketStats>>;

    /// 일자별 시장 집계 캐시 저장.
    async fn set_market_stats(&self, stats: &MarketStats) -> Result<()>;

    /// 일자별 상위 종목 캐시 조회.
    async fn get_top(&self, date: &str, limit: i64) -> Result<Option<Vec<ShortSellingRecord>>>;

    /// 일자별 상위 종목 캐시 저장.
    async fn set_top(&self, date: &str, limit: i64, records: &[ShortSellingRecord]) -> Result<()>;

    /// 특정 일자와 관련된 캐시 항목을 모두 무효화합니다.
    async fn invalidate_date(&self, date: &str) -> Result<u64>;
}
