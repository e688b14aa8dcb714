//! Configuration structures
//!
//! `RailwaySettings` is the raw, possibly-incomplete configuration as the
//! host application hands it over. `RailwaySettings::validate` turns it
//! into a `RailwayConfig` or fails fast with a configuration error, so the
//! rest of the system never re-checks individual fields.

use serde::{Deserialize, Serialize};

use crate::errors::{ChalforgeError, Result};

/// Raw control-plane settings as supplied by the host application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RailwaySettings {
    /// Bearer credential for the control-plane API
    #[serde(default)]
    pub api_token: String,
    /// Railway project to provision services into
    #[serde(default)]
    pub project_id: String,
    /// Railway environment within the project
    #[serde(default)]
    pub environment_id: String,
    /// Instance time-to-live in minutes; 0 disables expiration
    #[serde(default)]
    pub expiration_minutes: u64,
}

impl RailwaySettings {
    /// Validate the settings into a usable configuration
    ///
    /// # Errors
    /// Returns `ChalforgeError::Config` naming the first missing field when
    /// the credential, project id, or environment id is absent.
    pub fn validate(&self) -> Result<RailwayConfig> {
        let field = if self.api_token.trim().is_empty() {
            Some("api_token")
        } else if self.project_id.trim().is_empty() {
            Some("project_id")
        } else if self.environment_id.trim().is_empty() {
            Some("environment_id")
        } else {
            None
        };

        if let Some(field) = field {
            return Err(ChalforgeError::Config(format!(
                "railway settings incomplete: missing {field}"
            )));
        }

        Ok(RailwayConfig {
            api_token: self.api_token.clone(),
            project_id: self.project_id.clone(),
            environment_id: self.environment_id.clone(),
            expiration_seconds: self.expiration_minutes * 60,
        })
    }
}

/// Validated control-plane configuration
#[derive(Debug, Clone)]
pub struct RailwayConfig {
    pub api_token: String,
    pub project_id: String,
    pub environment_id: String,
    /// Instance time-to-live in seconds; 0 disables expiration
    pub expiration_seconds: u64,
}

impl RailwayConfig {
    /// Whether provisioned instances carry an expiry
    pub fn expiration_enabled(&self) -> bool {
        self.expiration_seconds > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> RailwaySettings {
        RailwaySettings {
            api_token: "token".into(),
            project_id: "proj".into(),
            environment_id: "env".into(),
            expiration_minutes: 30,
        }
    }

    #[test]
    fn validate_accepts_complete_settings() {
        let config = complete().validate().unwrap();
        assert_eq!(config.expiration_seconds, 1800);
        assert!(config.expiration_enabled());
    }

    #[test]
    fn validate_rejects_each_missing_field() {
        for field in ["api_token", "project_id", "environment_id"] {
            let mut settings = complete();
            match field {
                "api_token" => settings.api_token.clear(),
                "project_id" => settings.project_id.clear(),
                _ => settings.environment_id.clear(),
            }
            let err = settings.validate().unwrap_err();
            assert!(err.to_string().contains(field), "expected {field} in {err}");
        }
    }

    #[test]
    fn zero_expiration_disables_sweeping() {
        let mut settings = complete();
        settings.expiration_minutes = 0;
        let config = settings.validate().unwrap();
        assert!(!config.expiration_enabled());
    }
}
