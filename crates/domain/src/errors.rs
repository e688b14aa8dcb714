//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Chalforge
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ChalforgeError {
    /// Transport-level failure talking to the control plane
    #[error("Network error: {0}")]
    Network(String),

    /// Application-level error payload returned by the control plane
    #[error("Remote API error: {0}")]
    RemoteApi(String),

    /// Business-level provisioning failure (creation, deployment, proxy)
    #[error("Provisioning error: {0}")]
    Provision(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Chalforge operations
pub type Result<T> = std::result::Result<T, ChalforgeError>;
