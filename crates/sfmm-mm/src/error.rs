//! Quoting core error types.

use sfmm_client::ClientError;
use thiserror::Error;

/// Per-side failure while reconciling or re-quoting.
#[derive(Debug, Error)]
pub enum MakerError {
    /// The order service failed (after any retries).
    #[error("Order service error: {0}")]
    Service(#[from] ClientError),

    /// Internal inconsistency: a bug in the lifecycle, not an external fault.
    #[error("Invariant violation: {0}")]
    Invariant(String),
}

impl MakerError {
    /// Transport fault that survived the retry policy.
    pub fn is_transport(&self) -> bool {
        matches!(self, MakerError::Service(e) if e.is_retryable())
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MakerError::Service(ClientError::Transport(_)) => "transport",
            MakerError::Service(ClientError::Business(_)) => "business",
            MakerError::Service(ClientError::Config(_)) => "config",
            MakerError::Invariant(_) => "invariant",
        }
    }
}

pub type MakerResult<T> = Result<T, MakerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let transport = MakerError::from(ClientError::Transport("reset".into()));
        assert!(transport.is_transport());
        assert_eq!(transport.kind(), "transport");

        let business = MakerError::from(ClientError::Business("no venue".into()));
        assert!(!business.is_transport());
        assert_eq!(business.kind(), "business");

        assert_eq!(MakerError::Invariant("two bids".into()).kind(), "invariant");
    }
}
