pub mod limited;
pub mod queue;
pub mod timer;
pub mod unlimited;

pub use limited::{
    Admission, LimitedGlobalRateLimiter, LimiterSnapshot, DEFAULT_GLOBAL_LIMIT, DEFAULT_WINDOW,
};
pub use queue::{AdmissionQueue, Priority, QueueEntry, DEFAULT_PRIORITY};
pub use timer::ReplenishmentTimer;
pub use unlimited::UnlimitedGlobalRateLimiter;

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// A limiter shared by every request to one rate-limited resource.
#[async_trait]
pub trait GlobalRateLimiter: Send + Sync {
    /// Wait for permission to start one operation.
    /// The returned guard must live for as long as the operation runs.
    async fn acquire(&self, priority: Priority) -> Admission;

    /// Server told us to back off for `retry_after`.
    fn notify(&self, retry_after: Duration);
}

/// Runs `op` inside an admission scope. Whatever `op` returns is handed back untouched.
pub async fn gated<L, F>(limiter: &L, priority: Priority, op: F) -> F::Output
where
    L: GlobalRateLimiter + ?Sized,
    F: Future,
{
    let _admission = limiter.acquire(priority).await;
    op.await
}
