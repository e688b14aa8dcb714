//! Sweeper error types

use std::time::Duration;

use chalforge_domain::ChalforgeError;
use thiserror::Error;

/// Sweeper lifecycle errors
#[derive(Debug, Error)]
pub enum SweeperError {
    /// Sweeper is already running
    #[error("Sweeper already running")]
    AlreadyRunning,

    /// Sweeper is not running
    #[error("Sweeper not running")]
    NotRunning,

    /// Shutdown did not complete within the join timeout
    #[error("Operation timed out after {duration:?}")]
    Timeout {
        duration: Duration,
        #[source]
        source: tokio::time::error::Elapsed,
    },

    /// Background task panicked or was aborted
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<SweeperError> for ChalforgeError {
    fn from(err: SweeperError) -> Self {
        match err {
            SweeperError::AlreadyRunning | SweeperError::NotRunning => {
                Self::Config(err.to_string())
            }
            SweeperError::Timeout { .. } | SweeperError::TaskJoinFailed(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

/// Convenience type alias for sweeper operations
pub type SweeperResult<T> = Result<T, SweeperError>;
