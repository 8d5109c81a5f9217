//! Error types for sfmm-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid order side: {0}")]
    InvalidSide(String),

    #[error("Invalid order type: {0}")]
    InvalidOrderType(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
