//! Railway API error types
//!
//! Transport failures, HTTP status errors, and application-level GraphQL
//! error payloads are normalized into one error channel here and converted
//! into `ChalforgeError` at the port boundary.

use std::time::Duration;

use chalforge_domain::ChalforgeError;
use thiserror::Error;

/// Railway API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Application-level error payload from the control plane
    #[error("Railway API: {0}")]
    Api(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    /// 404-class responses; deletion treats these as "already gone"
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl From<ApiError> for ChalforgeError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(msg) => Self::Network(msg),
            ApiError::Timeout(duration) => {
                Self::Network(format!("request timed out after {duration:?}"))
            }
            ApiError::NotFound(msg) => Self::NotFound(msg),
            ApiError::Config(msg) => Self::Config(msg),
            ApiError::Api(msg)
            | ApiError::Auth(msg)
            | ApiError::Server(msg)
            | ApiError::Client(msg) => Self::RemoteApi(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_survives_conversion() {
        let err: ChalforgeError = ApiError::NotFound("service gone".to_string()).into();
        assert!(matches!(err, ChalforgeError::NotFound(_)));
    }

    #[test]
    fn transport_errors_map_to_network() {
        let err: ChalforgeError = ApiError::Network("connection refused".to_string()).into();
        assert!(matches!(err, ChalforgeError::Network(_)));
        let err: ChalforgeError = ApiError::Timeout(Duration::from_secs(30)).into();
        assert!(matches!(err, ChalforgeError::Network(_)));
    }

    #[test]
    fn application_errors_map_to_remote_api() {
        for err in [
            ApiError::Api("bad input".into()),
            ApiError::Auth("unauthorized".into()),
            ApiError::Server("boom".into()),
            ApiError::Client("bad request".into()),
        ] {
            assert!(matches!(ChalforgeError::from(err), ChalforgeError::RemoteApi(_)));
        }
    }
}
