use serde::Deserialize;
use crate::error::{Result, AppError};
use crate::limiter::{LimitedGlobalRateLimiter, DEFAULT_GLOBAL_LIMIT};
use std::time::Duration;
use config::{Config as ConfigLoader, File, Environment};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // General
    pub log_level: String,

    // Limiter
    pub global_limit: u32,
    pub window_ms: u64,

    // Demo driver
    pub demo_requests: usize,
    pub demo_work_ms: u64,
}

impl Config {
    /// Defaults, then `admission.toml` if present, then `ADMISSION_*` env vars.
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let config: Self = ConfigLoader::builder()
            .set_default("log_level", "info")?
            .set_default("global_limit", i64::from(DEFAULT_GLOBAL_LIMIT))?
            .set_default("window_ms", 1000)?
            .set_default("demo_requests", 120)?
            .set_default("demo_work_ms", 50)?
            .add_source(File::with_name("admission").required(false))
            .add_source(Environment::with_prefix("ADMISSION"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.global_limit == 0 {
            return Err(AppError::InvalidLimit(self.global_limit));
        }
        if self.window_ms == 0 {
            return Err(AppError::InvalidWindow(self.window()));
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn build_limiter(&self) -> Result<LimitedGlobalRateLimiter> {
        LimitedGlobalRateLimiter::with_window(self.global_limit, self.window())
    }
}
