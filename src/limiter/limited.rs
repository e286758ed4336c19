use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::limiter::queue::{AdmissionQueue, Priority, DEFAULT_PRIORITY};
use crate::limiter::timer::ReplenishmentTimer;
use crate::limiter::GlobalRateLimiter;
use crate::stats::LimiterStats;

pub const DEFAULT_GLOBAL_LIMIT: u32 = 50;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

/// Point-in-time view of the limiter's capacity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterSnapshot {
    pub limit: u32,
    pub remaining: u32,
    pub reserved: u32,
    pub pending_reset: bool,
    /// Raw queue length; abandoned waiters count until the next cycle purges them.
    pub queued: usize,
}

#[derive(Debug)]
struct State {
    limit: u32,
    remaining: u32,
    reserved: u32,
    pending_reset: bool,
    queue: AdmissionQueue,
}

impl State {
    // Saturating, so a negative balance gates like an empty one.
    fn available(&self) -> u32 {
        self.remaining.saturating_sub(self.reserved)
    }

    /// Hands free slots to queued waiters, best priority first.
    /// The slot is reserved here, under the lock, so nobody on the fast path
    /// can take it between the wake-up and the waiter resuming.
    fn release_waiters(&mut self) -> u64 {
        let mut to_release = self.queue.len().min(self.available() as usize);
        let mut released = 0;

        while to_release > 0 {
            let Some(entry) = self.queue.pop() else {
                break;
            };
            if entry.release() {
                self.reserved += 1;
                released += 1;
                to_release -= 1;
            }
        }
        released
    }
}

#[derive(Debug)]
pub(crate) struct Shared {
    state: Mutex<State>,
    stats: LimiterStats,
    timer: ReplenishmentTimer,
}

impl Shared {
    /// Either reserves a slot right away (`None`) or queues the caller.
    fn try_admit(&self, priority: Priority) -> Option<oneshot::Receiver<()>> {
        let mut state = self.state.lock();
        let available = state.available();
        debug!("Calculated remaining: {}", available);
        debug!("Reserved requests: {}", state.reserved);

        if available == 0 {
            let rx = state.queue.push(priority);
            debug!("Added request to queue with priority {}", priority);
            Some(rx)
        } else {
            state.reserved += 1;
            None
        }
    }

    /// Bookkeeping for a finished admission.
    fn complete(self: &Arc<Self>) {
        let arm = {
            let mut state = self.state.lock();
            let arm = !state.pending_reset;
            state.pending_reset = true;
            state.reserved = state.reserved.saturating_sub(1);
            state.remaining = state.remaining.saturating_sub(1);
            arm
        };

        self.stats.inc_completed();
        if arm {
            self.arm_timer();
        }
    }

    /// A waiter was handed a slot but went away before using it.
    fn give_back(&self) {
        let released = {
            let mut state = self.state.lock();
            state.reserved = state.reserved.saturating_sub(1);
            state.release_waiters()
        };

        if released > 0 {
            debug!("Passed returned slot on to {} queued requests", released);
            self.stats.add_released(released);
        }
    }

    fn replenish(self: &Arc<Self>) {
        let (released, rearm) = {
            let mut state = self.state.lock();
            state.pending_reset = false;
            state.remaining = state.limit;

            let released = state.release_waiters();
            state.queue.purge_abandoned();

            let rearm = !state.queue.is_empty();
            if rearm {
                state.pending_reset = true;
            }
            (released, rearm)
        };

        debug!("Releasing {} requests", released);
        self.stats.inc_replenishments();
        self.stats.add_released(released);

        if rearm {
            self.arm_timer();
        }
    }

    fn arm_timer(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.timer.schedule(move || {
            if let Some(shared) = weak.upgrade() {
                shared.replenish();
            }
        });
    }
}

/// Keeps the queued side of `acquire` cancel-safe.
struct Waiter {
    rx: oneshot::Receiver<()>,
    shared: Arc<Shared>,
    settled: bool,
}

impl Waiter {
    /// True when a replenishment cycle handed us a slot.
    async fn wait(&mut self) -> bool {
        let result = (&mut self.rx).await;
        self.settled = true;
        result.is_ok()
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        self.shared.stats.add_abandoned(1);
        self.rx.close();
        // Released before we noticed: the slot is already reserved for us.
        if self.rx.try_recv().is_ok() {
            self.shared.give_back();
        }
    }
}

/// Scope of one admitted request. Dropping it, on any path, records the
/// completion and makes sure a replenishment is scheduled.
#[must_use = "the admission is released as soon as it is dropped"]
#[derive(Debug)]
pub struct Admission {
    shared: Option<Arc<Shared>>,
}

impl Admission {
    fn limited(shared: Arc<Shared>) -> Self {
        Self {
            shared: Some(shared),
        }
    }

    /// Admission with no bookkeeping attached.
    pub(crate) fn unrestricted() -> Self {
        Self { shared: None }
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.complete();
        }
    }
}

/// Global limiter allowing `limit` operations to start per window, queueing
/// everything else by priority.
#[derive(Debug, Clone)]
pub struct LimitedGlobalRateLimiter {
    shared: Arc<Shared>,
}

impl LimitedGlobalRateLimiter {
    pub fn new(limit: u32) -> Result<Self> {
        Self::with_window(limit, DEFAULT_WINDOW)
    }

    /// Must be called from within a Tokio runtime; the replenishment timer
    /// runs on it.
    pub fn with_window(limit: u32, window: Duration) -> Result<Self> {
        if limit == 0 {
            return Err(AppError::InvalidLimit(limit));
        }
        if window.is_zero() {
            return Err(AppError::InvalidWindow(window));
        }

        let timer = ReplenishmentTimer::new(window)?;
        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    limit,
                    remaining: limit,
                    reserved: 0,
                    pending_reset: false,
                    queue: AdmissionQueue::new(),
                }),
                stats: LimiterStats::new(),
                timer,
            }),
        })
    }

    /// Waits until the request may start. Never fails; saturation only adds latency.
    pub async fn acquire(&self, priority: Priority) -> Admission {
        loop {
            let Some(rx) = self.shared.try_admit(priority) else {
                self.shared.stats.inc_admitted_immediately();
                return Admission::limited(self.shared.clone());
            };

            self.shared.stats.inc_queued();
            let mut waiter = Waiter {
                rx,
                shared: self.shared.clone(),
                settled: false,
            };
            if waiter.wait().await {
                debug!("Out of queue, doing request");
                return Admission::limited(self.shared.clone());
            }

            // Entry dropped without a release, go through the gate again.
            debug!("Queue entry dropped without release, retrying");
        }
    }

    pub async fn acquire_default(&self) -> Admission {
        self.acquire(DEFAULT_PRIORITY).await
    }

    /// Surfaces a server-reported retry-after. Capacity is left alone.
    pub fn notify(&self, retry_after: Duration) {
        warn!("Exceeded global rate-limit! (Retry after: {:?})", retry_after);
        self.shared
            .stats
            .record_retry_after(u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX));
    }

    pub fn limit(&self) -> u32 {
        self.shared.state.lock().limit
    }

    pub fn window(&self) -> Duration {
        self.shared.timer.window()
    }

    pub fn snapshot(&self) -> LimiterSnapshot {
        let state = self.shared.state.lock();
        LimiterSnapshot {
            limit: state.limit,
            remaining: state.remaining,
            reserved: state.reserved,
            pending_reset: state.pending_reset,
            queued: state.queue.len(),
        }
    }

    pub fn stats(&self) -> &LimiterStats {
        &self.shared.stats
    }
}

#[async_trait]
impl GlobalRateLimiter for LimitedGlobalRateLimiter {
    async fn acquire(&self, priority: Priority) -> Admission {
        LimitedGlobalRateLimiter::acquire(self, priority).await
    }

    fn notify(&self, retry_after: Duration) {
        LimitedGlobalRateLimiter::notify(self, retry_after)
    }
}
