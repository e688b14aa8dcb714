//! Configuration loader
//!
//! Loads Railway settings from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `CHALFORGE_RAILWAY_API_TOKEN`: Bearer credential for the control plane
//! - `CHALFORGE_RAILWAY_PROJECT_ID`: Railway project id
//! - `CHALFORGE_RAILWAY_ENVIRONMENT_ID`: Railway environment id
//! - `CHALFORGE_EXPIRATION_MINUTES`: Instance TTL in minutes (optional, 0
//!   disables expiration)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml`
//! 2. `./chalforge.json` or `./chalforge.toml`
//!
//! The loaded settings may still be incomplete; completeness is decided by
//! `RailwaySettings::validate` when the manager is constructed.

use std::path::{Path, PathBuf};

use chalforge_domain::{ChalforgeError, RailwaySettings, Result};

/// Load settings with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ChalforgeError::Config` if neither source yields settings.
pub fn load() -> Result<RailwaySettings> {
    match load_from_env() {
        Ok(settings) => {
            tracing::info!("Railway settings loaded from environment variables");
            Ok(settings)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load settings from environment variables
///
/// # Errors
/// Returns `ChalforgeError::Config` if required variables are missing or
/// the expiration value is not a number.
pub fn load_from_env() -> Result<RailwaySettings> {
    let api_token = env_var("CHALFORGE_RAILWAY_API_TOKEN")?;
    let project_id = env_var("CHALFORGE_RAILWAY_PROJECT_ID")?;
    let environment_id = env_var("CHALFORGE_RAILWAY_ENVIRONMENT_ID")?;

    let expiration_minutes = match std::env::var("CHALFORGE_EXPIRATION_MINUTES") {
        Ok(raw) => raw.parse::<u64>().map_err(|e| {
            ChalforgeError::Config(format!("Invalid expiration minutes: {e}"))
        })?,
        Err(_) => 0,
    };

    Ok(RailwaySettings { api_token, project_id, environment_id, expiration_minutes })
}

/// Load settings from a file
///
/// If `path` is `None`, probes the default locations. Supports JSON and
/// TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ChalforgeError::Config` if no file is found or the content
/// cannot be parsed.
pub fn load_from_file(path: Option<&Path>) -> Result<RailwaySettings> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => probe_config_paths().ok_or_else(|| {
            ChalforgeError::Config("no config file found in default locations".to_string())
        })?,
    };

    let content = std::fs::read_to_string(&path).map_err(|e| {
        ChalforgeError::Config(format!("failed to read {}: {e}", path.display()))
    })?;

    let settings = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .map_err(|e| ChalforgeError::Config(format!("invalid JSON config: {e}")))?,
        Some("toml") => toml::from_str(&content)
            .map_err(|e| ChalforgeError::Config(format!("invalid TOML config: {e}")))?,
        other => {
            return Err(ChalforgeError::Config(format!(
                "unsupported config extension: {other:?}"
            )));
        }
    };

    tracing::info!(path = %path.display(), "Railway settings loaded from file");
    Ok(settings)
}

fn probe_config_paths() -> Option<PathBuf> {
    ["config.json", "config.toml", "chalforge.json", "chalforge.toml"]
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| ChalforgeError::Config(format!("missing environment variable {name}")))
}
