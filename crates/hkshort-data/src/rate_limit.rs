//! 외부 소스 요청 속도 제한기.
//!
//! 하나의 소스에 대한 모든 요청이 공유하는 단일 전역 스로틀입니다.
//! 저 QPS 단일 소스 수집 패턴에는 token bucket보다 이 방식이 맞습니다.
//! 마지막 요청 시각 하나를 mutex로 보호하며, 스레드별 상태는 없습니다.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// 최소 요청 간격을 강제하는 속도 제한기.
///
/// `acquire`는 직전 `acquire` 반환 시점으로부터 `min_interval`이 지날 때까지
/// 대기합니다. 인스턴스를 공유하는 모든 호출자에 걸쳐 적용됩니다.
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// 주어진 최소 간격으로 속도 제한기를 생성합니다.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// 설정된 최소 간격.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// 요청 허가를 획득합니다. 필요하면 대기합니다.
    ///
    /// lock을 잡은 채로 대기하므로 동시 호출자는 순서대로 하나씩 통과하며,
    /// 연속한 두 번의 반환 사이에는 항상 `min_interval` 이상이 보장됩니다.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Rate limiter waiting");
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// 저장된 타임스탬프를 초기화합니다.
    pub async fn reset(&self) {
        let mut last = self.last_request.lock().await;
        *last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_sequential_acquires_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_secs(1));

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquires_are_serialized() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(1)));

        let start = Instant::now();
        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        // 3회 획득 → 최소 2 * min_interval 경과
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_timestamp() {
        let limiter = RateLimiter::new(Duration::from_secs(5));

        limiter.acquire().await;
        limiter.reset().await;

        let start = Instant::now();
        limiter.acquire().await;
        // reset 후 첫 acquire는 대기하지 않음
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
