//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

/// Railway GraphQL control-plane endpoint
pub const RAILWAY_API_URL: &str = "https://backboard.railway.com/graphql/v2";

/// Interval between deployment status polls
pub const DEPLOYMENT_POLL_INTERVAL_SECS: u64 = 5;

/// Wall-clock ceiling for a deployment to become ACTIVE
pub const DEPLOYMENT_TIMEOUT_SECS: u64 = 300;

/// Interval between expiration sweeps
pub const EXPIRATION_SWEEP_INTERVAL_SECS: u64 = 5;

/// Timeout for a single control-plane request
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Prefix for remote service names
pub const SERVICE_NAME_PREFIX: &str = "chal";
