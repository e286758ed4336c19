use std::time::Duration;
use tokio::runtime::Handle;

use crate::error::Result;

/// One-shot deferred callback used to replenish capacity after a window.
///
/// The timer itself does not deduplicate; callers guard re-arming with their
/// own pending flag so at most one callback is outstanding.
#[derive(Debug, Clone)]
pub struct ReplenishmentTimer {
    handle: Handle,
    window: Duration,
}

impl ReplenishmentTimer {
    /// Binds the timer to the runtime we are currently running on.
    pub fn new(window: Duration) -> Result<Self> {
        Ok(Self {
            handle: Handle::try_current()?,
            window,
        })
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Runs `on_fire` once, one window from now.
    /// Safe to call from `Drop` impls and from threads outside the runtime.
    pub fn schedule<F>(&self, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let window = self.window;
        self.handle.spawn(async move {
            tokio::time::sleep(window).await;
            on_fire();
        });
    }
}
