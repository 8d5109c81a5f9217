//! Client error types.
//!
//! Splits failures into the two external kinds the control loop reacts to
//! differently: transport faults (retryable) and business rejections (not).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure, 5xx/429 status or undecodable body.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The venue answered but flagged the request as invalid (`ok: false`).
    #[error("Business error: {0}")]
    Business(String),

    /// Client could not be constructed (missing API key, bad URL).
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Only transport faults are worth retrying with unchanged input.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    #[must_use]
    pub fn is_business(&self) -> bool {
        matches!(self, ClientError::Business(_))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
