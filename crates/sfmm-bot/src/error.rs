//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Client error: {0}")]
    Client(#[from] sfmm_client::ClientError),

    #[error("Maker error: {0}")]
    Maker(#[from] sfmm_mm::MakerError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] sfmm_telemetry::TelemetryError),

    #[error("Stopping after {consecutive} consecutive failed iterations")]
    TooManyFailures { consecutive: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
