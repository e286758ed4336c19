use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

#[derive(Debug, Default)]
pub struct LimiterStats {
    pub admitted_immediately: AtomicU64,
    pub queued: AtomicU64,
    pub released: AtomicU64,
    pub completed: AtomicU64,
    // Waiters that went away before (or right after) being released.
    pub abandoned: AtomicU64,
    pub replenishments: AtomicU64,
    pub retry_after_signals: AtomicU64,

    // Last server-reported retry-after, gauge style.
    pub last_retry_after_ms: AtomicU64,
}

impl LimiterStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_admitted_immediately(&self) {
        self.admitted_immediately.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_released(&self, n: u64) {
        self.released.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_abandoned(&self, n: u64) {
        self.abandoned.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_replenishments(&self) {
        self.replenishments.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry_after(&self, ms: u64) {
        self.retry_after_signals.fetch_add(1, Ordering::Relaxed);
        self.last_retry_after_ms.store(ms, Ordering::Relaxed);
    }

    pub fn log_stats(&self) {
        let immediate = self.admitted_immediately.load(Ordering::Relaxed);
        let queued = self.queued.load(Ordering::Relaxed);
        let released = self.released.load(Ordering::Relaxed);
        let completed = self.completed.load(Ordering::Relaxed);
        let abandoned = self.abandoned.load(Ordering::Relaxed);
        let cycles = self.replenishments.load(Ordering::Relaxed);
        let signals = self.retry_after_signals.load(Ordering::Relaxed);

        info!(
            "STATS: Admitted: {} immediate, {} queued ({} released, {} abandoned) | Completed: {} | Cycles: {} | Retry-after signals: {}",
            immediate, queued, released, abandoned, completed, cycles, signals
        );
    }
}
