use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::limiter::limited::Admission;
use crate::limiter::queue::Priority;
use crate::limiter::GlobalRateLimiter;

/// Lets everything through. Used when the resource has no global limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlimitedGlobalRateLimiter;

impl UnlimitedGlobalRateLimiter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GlobalRateLimiter for UnlimitedGlobalRateLimiter {
    async fn acquire(&self, _priority: Priority) -> Admission {
        Admission::unrestricted()
    }

    fn notify(&self, retry_after: Duration) {
        warn!("Exceeded global rate-limit! (Retry after: {:?})", retry_after);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::{gated, LimitedGlobalRateLimiter};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_never_queues() {
        let limiter = UnlimitedGlobalRateLimiter::new();
        let held: Vec<_> = futures_util::future::join_all((0..1000).map(|i| limiter.acquire(i))).await;
        assert_eq!(held.len(), 1000);
        limiter.notify(Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_interchangeable_behind_trait() {
        let limiters: Vec<Arc<dyn GlobalRateLimiter>> = vec![
            Arc::new(UnlimitedGlobalRateLimiter::new()),
            Arc::new(LimitedGlobalRateLimiter::new(10).unwrap()),
        ];

        for limiter in limiters {
            let out = gated(limiter.as_ref(), 0, async { 42 }).await;
            assert_eq!(out, 42);
        }
    }
}
