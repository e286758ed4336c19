pub mod config;
pub mod error;
pub mod limiter;
pub mod stats;

pub use error::{AppError, Result};
pub use limiter::{
    gated, Admission, GlobalRateLimiter, LimitedGlobalRateLimiter, LimiterSnapshot, Priority,
    UnlimitedGlobalRateLimiter, DEFAULT_PRIORITY,
};
