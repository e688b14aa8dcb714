//! Challenge manager facade
//!
//! Wires settings into a working provisioning stack, or into an inert
//! variant when the settings are incomplete. Callers hold one type with
//! one interface; the `Unconfigured` variant implements every operation as
//! a safe no-op (false / empty / configuration error) and never starts the
//! background sweeper or touches the network.

use std::sync::Arc;

use chalforge_core::{InstanceStore, ProvisionConfig, ProvisionService};
use chalforge_domain::{
    ChalforgeError, ChallengeInstance, ChallengeSpec, ConnectionInfo, RailwaySettings, Result,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::railway::{RailwayClient, RailwayEndpoint};
use crate::scheduling::{ExpirationSweeper, SweeperConfig, SweeperError};

enum State {
    Configured {
        service: Arc<ProvisionService>,
        sweeper: Mutex<ExpirationSweeper>,
        expiration_enabled: bool,
    },
    Unconfigured,
}

/// Public entry point for the host application
pub struct ChallengeManager {
    state: State,
}

impl ChallengeManager {
    /// Build a manager against the production Railway endpoint
    ///
    /// Incomplete settings yield an inert manager rather than an error;
    /// the host application keeps running with provisioning disabled.
    ///
    /// # Errors
    /// Returns error only when the HTTP client itself cannot be built.
    pub fn new(settings: &RailwaySettings, store: Arc<dyn InstanceStore>) -> Result<Self> {
        Self::with_endpoint(settings, store, RailwayEndpoint::default())
    }

    /// Build a manager against a custom control-plane endpoint
    ///
    /// # Errors
    /// Returns error only when the HTTP client itself cannot be built.
    pub fn with_endpoint(
        settings: &RailwaySettings,
        store: Arc<dyn InstanceStore>,
        endpoint: RailwayEndpoint,
    ) -> Result<Self> {
        let config = match settings.validate() {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "challenge manager disabled");
                return Ok(Self { state: State::Unconfigured });
            }
        };

        let expiration_enabled = config.expiration_enabled();
        let expiration_seconds = config.expiration_seconds;
        let client = Arc::new(RailwayClient::with_endpoint(config, endpoint)?);
        let service = Arc::new(ProvisionService::new(
            client,
            store,
            ProvisionConfig { expiration_seconds, ..ProvisionConfig::default() },
        ));
        let sweeper =
            Mutex::new(ExpirationSweeper::new(Arc::clone(&service), SweeperConfig::default()));

        info!(expiration_enabled, "challenge manager configured");
        Ok(Self { state: State::Configured { service, sweeper, expiration_enabled } })
    }

    /// Start the background expiration sweeper
    ///
    /// No-op when the manager is unconfigured or expiration is disabled.
    ///
    /// # Errors
    /// Returns error if the sweeper is already running.
    pub async fn start(&self) -> Result<()> {
        match &self.state {
            State::Configured { sweeper, expiration_enabled: true, .. } => {
                sweeper.lock().await.start().await.map_err(Into::into)
            }
            State::Configured { expiration_enabled: false, .. } => {
                debug!("expiration disabled; sweeper not started");
                Ok(())
            }
            State::Unconfigured => Ok(()),
        }
    }

    /// Stop the background sweeper; safe to call on all exit paths
    ///
    /// # Errors
    /// Returns error if the sweeper fails to join within its timeout.
    pub async fn shutdown(&self) -> Result<()> {
        match &self.state {
            State::Configured { sweeper, .. } => {
                match sweeper.lock().await.stop().await {
                    Ok(()) | Err(SweeperError::NotRunning) => Ok(()),
                    Err(e) => Err(e.into()),
                }
            }
            State::Unconfigured => Ok(()),
        }
    }

    /// Provision one challenge instance; see `ProvisionService::create_instance`
    ///
    /// # Errors
    /// `ChalforgeError::Config` when unconfigured, `Provision` on failure.
    pub async fn create_instance(
        &self,
        challenge_id: &str,
        team_id: &str,
        user_id: &str,
        spec: &ChallengeSpec,
    ) -> Result<ConnectionInfo> {
        match &self.state {
            State::Configured { service, .. } => {
                service.create_instance(challenge_id, team_id, user_id, spec).await
            }
            State::Unconfigured => Err(ChalforgeError::Config(
                "challenge manager is not configured".to_string(),
            )),
        }
    }

    /// Tear down an instance and its record; idempotent
    ///
    /// # Errors
    /// Propagates control-plane errors other than "not found".
    pub async fn delete_instance(&self, service_id: &str) -> Result<()> {
        match &self.state {
            State::Configured { service, .. } => service.delete_instance(service_id).await,
            State::Unconfigured => Ok(()),
        }
    }

    /// Whether the instance's latest deployment is ACTIVE; never errors
    pub async fn is_active(&self, service_id: &str) -> bool {
        match &self.state {
            State::Configured { service, .. } => service.is_active(service_id).await,
            State::Unconfigured => false,
        }
    }

    /// Whether the control plane is reachable; never errors
    pub async fn is_connected(&self) -> bool {
        match &self.state {
            State::Configured { service, .. } => service.is_connected().await,
            State::Unconfigured => false,
        }
    }

    /// Look up the record for a provisioned instance
    pub async fn get_instance(&self, service_id: &str) -> Option<ChallengeInstance> {
        match &self.state {
            State::Configured { service, .. } => service.get_instance(service_id).await,
            State::Unconfigured => None,
        }
    }

    /// The platform hosts no local image registry
    pub fn get_images(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether the manager holds a validated configuration
    pub fn is_configured(&self) -> bool {
        matches!(self.state, State::Configured { .. })
    }

    /// Whether the background sweeper is currently running
    pub async fn sweeper_running(&self) -> bool {
        match &self.state {
            State::Configured { sweeper, .. } => sweeper.lock().await.is_running(),
            State::Unconfigured => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryInstanceStore;

    fn settings(expiration_minutes: u64) -> RailwaySettings {
        RailwaySettings {
            api_token: "token".into(),
            project_id: "proj".into(),
            environment_id: "env".into(),
            expiration_minutes,
        }
    }

    fn store() -> Arc<MemoryInstanceStore> {
        Arc::new(MemoryInstanceStore::new())
    }

    #[tokio::test]
    async fn incomplete_settings_yield_inert_manager() {
        let manager = ChallengeManager::new(&RailwaySettings::default(), store()).unwrap();
        assert!(!manager.is_configured());

        let spec = ChallengeSpec {
            image: "ctf/pwn:latest".into(),
            port: 1234,
            start_command: None,
            volumes: None,
        };
        let err = manager.create_instance("5", "9", "17", &spec).await.unwrap_err();
        assert!(matches!(err, ChalforgeError::Config(_)));

        assert!(!manager.is_active("svc-1").await);
        assert!(!manager.is_connected().await);
        assert!(manager.get_instance("svc-1").await.is_none());
        assert!(manager.get_images().is_empty());
        manager.delete_instance("svc-1").await.unwrap();

        manager.start().await.unwrap();
        assert!(!manager.sweeper_running().await);
        manager.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sweeper_starts_only_with_positive_expiration() {
        let manager = ChallengeManager::new(&settings(0), store()).unwrap();
        assert!(manager.is_configured());
        manager.start().await.unwrap();
        assert!(!manager.sweeper_running().await);
        manager.shutdown().await.unwrap();

        let manager = ChallengeManager::new(&settings(30), store()).unwrap();
        manager.start().await.unwrap();
        assert!(manager.sweeper_running().await);
        manager.shutdown().await.unwrap();
        assert!(!manager.sweeper_running().await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shutdown_is_safe_when_never_started() {
        let manager = ChallengeManager::new(&settings(30), store()).unwrap();
        manager.shutdown().await.unwrap();
    }
}
