//! Common data types used throughout the application

use serde::{Deserialize, Serialize};

/// One provisioned challenge instance and its owning entities
///
/// `service_id` is assigned by the remote platform and is the primary key:
/// exactly one live remote service corresponds to each record. Timestamps
/// are epoch seconds; `expires_at == 0` means the instance never expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeInstance {
    pub service_id: String,
    pub challenge_id: String,
    pub team_id: String,
    pub user_id: String,
    pub hostname: String,
    pub port: String,
    pub created_at: i64,
    pub expires_at: i64,
}

impl ChallengeInstance {
    /// Whether this instance has an expiry and it has passed
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at > 0 && self.expires_at - now < 0
    }
}

/// Challenge metadata supplied by the host application at creation time
///
/// `volumes` is accepted for interface parity with other backends but has
/// no effect on the remote platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeSpec {
    /// Container image to deploy (e.g. "ctf/pwn:latest")
    pub image: String,
    /// Port the challenge listens on inside the container
    pub port: u16,
    /// Optional start command overriding the image entrypoint
    pub start_command: Option<String>,
    /// Unused on this backend
    pub volumes: Option<String>,
}

/// Connection triple returned to the host application
///
/// Rendered to players as "nc {hostname} {port}".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub service_id: String,
    pub hostname: String,
    pub port: String,
}

/// Public address/port pair handed back by the platform for a TCP proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEndpoint {
    pub domain: String,
    pub proxy_port: u32,
}

/// Status of the latest deployment of a remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentStatus {
    Active,
    Crashed,
    Failed,
    /// Any non-terminal status (DEPLOYING, BUILDING, ...)
    Other(String),
}

impl DeploymentStatus {
    /// Parse a platform status string
    pub fn parse(raw: &str) -> Self {
        match raw {
            "ACTIVE" => Self::Active,
            "CRASHED" => Self::Crashed,
            "FAILED" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Terminal failure states that abort a creation
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Self::Crashed | Self::Failed)
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Crashed => write!(f, "CRASHED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}
