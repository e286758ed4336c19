use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid limit: {0} (must be at least 1)")]
    InvalidLimit(u32),

    #[error("Invalid window: {0:?} (must be non-zero)")]
    InvalidWindow(std::time::Duration),

    // The replenishment timer is spawned onto the runtime captured at construction.
    #[error("No Tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

pub type Result<T> = std::result::Result<T, AppError>;
