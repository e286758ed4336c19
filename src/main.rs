use anyhow::Context;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

use global_admission::config::Config;
use global_admission::{gated, LimitedGlobalRateLimiter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load Config
    let config = Config::load().context("loading admission config")?;

    // Initialize logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting global admission demo...");
    info!(
        "Limit: {} per {:?} | Burst of {} requests, {}ms each",
        config.global_limit,
        config.window(),
        config.demo_requests,
        config.demo_work_ms
    );

    let limiter = Arc::new(config.build_limiter()?);
    let started = Instant::now();
    let work = Duration::from_millis(config.demo_work_ms);

    let mut handles = Vec::with_capacity(config.demo_requests);
    for i in 0..config.demo_requests {
        let limiter = limiter.clone();
        // Every third request is urgent
        let priority = if i % 3 == 0 { 0 } else { 10 };

        handles.push(tokio::spawn(async move {
            let result = gated(limiter.as_ref(), priority, simulated_call(i, work)).await;
            if let Err(retry_after) = result {
                limiter.notify(retry_after);
            }
            (i, priority, started.elapsed())
        }));
    }

    for handle in handles {
        match handle.await {
            Ok((i, priority, elapsed)) => {
                info!("Request {} (priority {}) finished after {:?}", i, priority, elapsed)
            }
            Err(e) => error!("Request task failed: {}", e),
        }
    }

    report(&limiter);
    info!("Shutting down...");

    Ok(())
}

/// Stand-in for a downstream call. Every 25th one comes back rate limited.
async fn simulated_call(i: usize, work: Duration) -> Result<(), Duration> {
    tokio::time::sleep(work).await;
    if i % 25 == 24 {
        return Err(Duration::from_millis(500));
    }
    Ok(())
}

fn report(limiter: &LimitedGlobalRateLimiter) {
    limiter.stats().log_stats();
    let snap = limiter.snapshot();
    info!(
        "Final state: remaining {}/{} | reserved {} | queued {} | reset pending: {}",
        snap.remaining, snap.limit, snap.reserved, snap.queued, snap.pending_reset
    );
}
