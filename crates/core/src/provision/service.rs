//! Provisioning service: creation orchestration, polling, teardown, reaping
//!
//! Creation is a blocking sequence of control-plane round-trips including a
//! polling wait of up to the deployment timeout, so callers must treat it
//! as a potentially multi-minute operation and must not hold broader locks
//! across it. The expiration reaper and explicit teardown both go through
//! the same deletion primitive, which treats an already-absent remote
//! service as success.

use std::sync::Arc;
use std::time::Duration;

use chalforge_domain::constants::{
    DEPLOYMENT_POLL_INTERVAL_SECS, DEPLOYMENT_TIMEOUT_SECS, SERVICE_NAME_PREFIX,
};
use chalforge_domain::{
    ChalforgeError, ChallengeInstance, ChallengeSpec, ConnectionInfo, DeploymentStatus, Result,
};
use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::ports::{ControlPlane, InstanceStore};

/// Configuration for the provisioning service
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Interval between deployment status polls
    pub poll_interval: Duration,
    /// Wall-clock ceiling for a deployment to become ACTIVE
    pub deployment_timeout: Duration,
    /// Instance time-to-live in seconds; 0 disables expiration
    pub expiration_seconds: u64,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEPLOYMENT_POLL_INTERVAL_SECS),
            deployment_timeout: Duration::from_secs(DEPLOYMENT_TIMEOUT_SECS),
            expiration_seconds: 0,
        }
    }
}

/// Outcome of one deployment polling session
enum PollOutcome {
    Active,
    TerminalFailure(DeploymentStatus),
    TimedOut,
}

/// Orchestrates the lifecycle of remote challenge instances
pub struct ProvisionService {
    control: Arc<dyn ControlPlane>,
    store: Arc<dyn InstanceStore>,
    config: ProvisionConfig,
}

impl ProvisionService {
    /// Create a new provisioning service
    pub fn new(
        control: Arc<dyn ControlPlane>,
        store: Arc<dyn InstanceStore>,
        config: ProvisionConfig,
    ) -> Self {
        Self { control, store, config }
    }

    /// Provision one challenge instance end to end
    ///
    /// Creates the remote service, optionally sets the start command
    /// (non-fatal), triggers a deployment, polls until ACTIVE, exposes the
    /// challenge port through a TCP proxy, and persists the record before
    /// returning the connection triple. Every fatal step after service
    /// creation runs a compensating delete so no half-provisioned service
    /// survives.
    ///
    /// # Errors
    /// Returns `ChalforgeError::Provision` describing the failed step.
    #[instrument(skip(self, spec), fields(challenge_id = %challenge_id, team_id = %team_id))]
    pub async fn create_instance(
        &self,
        challenge_id: &str,
        team_id: &str,
        user_id: &str,
        spec: &ChallengeSpec,
    ) -> Result<ConnectionInfo> {
        let created_at = Utc::now().timestamp();
        // Timestamp suffix keeps names unique across repeated creations for
        // the same team/challenge.
        let service_name =
            format!("{SERVICE_NAME_PREFIX}-{challenge_id}-{team_id}-{created_at}");

        let service_id = self
            .control
            .create_service(&service_name, &spec.image)
            .await
            .map_err(|e| ChalforgeError::Provision(format!("service creation failed: {e}")))?;
        info!(service_id = %service_id, name = %service_name, "remote service created");

        if let Some(command) = spec.start_command.as_deref().filter(|c| !c.is_empty()) {
            // Non-fatal: the image's default entrypoint may still work.
            if let Err(e) = self.control.set_start_command(&service_id, command).await {
                warn!(service_id = %service_id, error = %e, "failed to set start command");
            }
        }

        if let Err(e) = self.control.deploy_service(&service_id).await {
            self.best_effort_delete(&service_id).await;
            return Err(ChalforgeError::Provision(format!("deployment trigger failed: {e}")));
        }

        match self.poll_deployment(&service_id).await {
            Ok(PollOutcome::Active) => {}
            Ok(PollOutcome::TerminalFailure(status)) => {
                self.best_effort_delete(&service_id).await;
                return Err(ChalforgeError::Provision(format!(
                    "deployment failed, status={status}"
                )));
            }
            Ok(PollOutcome::TimedOut) => {
                self.best_effort_delete(&service_id).await;
                return Err(ChalforgeError::Provision(format!(
                    "deployment timed out after {}s",
                    self.config.deployment_timeout.as_secs()
                )));
            }
            Err(e) => {
                self.best_effort_delete(&service_id).await;
                return Err(ChalforgeError::Provision(format!(
                    "deployment status poll failed: {e}"
                )));
            }
        }

        let endpoint = match self.control.create_tcp_proxy(&service_id, spec.port).await {
            Ok(endpoint) if !endpoint.domain.is_empty() => endpoint,
            Ok(_) => {
                self.best_effort_delete(&service_id).await;
                return Err(ChalforgeError::Provision(
                    "tcp proxy returned no domain".to_string(),
                ));
            }
            Err(e) => {
                self.best_effort_delete(&service_id).await;
                return Err(ChalforgeError::Provision(format!(
                    "tcp proxy creation failed: {e}"
                )));
            }
        };

        let expires_at = if self.config.expiration_seconds > 0 {
            created_at + self.config.expiration_seconds as i64
        } else {
            0
        };
        let instance = ChallengeInstance {
            service_id: service_id.clone(),
            challenge_id: challenge_id.to_string(),
            team_id: team_id.to_string(),
            user_id: user_id.to_string(),
            hostname: endpoint.domain.clone(),
            port: endpoint.proxy_port.to_string(),
            created_at,
            expires_at,
        };

        // Persisted before returning control so the reaper can always find
        // the instance; an unpersisted instance would never expire.
        if let Err(e) = self.store.insert(instance).await {
            self.best_effort_delete(&service_id).await;
            return Err(ChalforgeError::Provision(format!(
                "failed to persist instance record: {e}"
            )));
        }

        info!(
            service_id = %service_id,
            hostname = %endpoint.domain,
            port = endpoint.proxy_port,
            "instance provisioned"
        );
        Ok(ConnectionInfo {
            service_id,
            hostname: endpoint.domain,
            port: endpoint.proxy_port.to_string(),
        })
    }

    /// Tear down an instance: delete the remote service, then its record
    ///
    /// Idempotent with respect to the remote side; a service that is
    /// already gone counts as deleted.
    ///
    /// # Errors
    /// Propagates control-plane errors other than "not found".
    #[instrument(skip(self))]
    pub async fn delete_instance(&self, service_id: &str) -> Result<()> {
        self.delete_remote(service_id).await?;
        self.store.remove(service_id).await?;
        info!(service_id = %service_id, "instance deleted");
        Ok(())
    }

    /// Remove every expired instance; returns how many were reaped
    ///
    /// Remote deletion is best-effort: the record is removed regardless of
    /// the outcome so expiration converges even when the control plane is
    /// unreachable (no retry storms against a permanently failing delete).
    pub async fn reap_expired(&self) -> usize {
        let instances = match self.store.all().await {
            Ok(instances) => instances,
            Err(e) => {
                warn!(error = %e, "failed to scan instance records");
                return 0;
            }
        };

        let now = Utc::now().timestamp();
        let mut reaped = 0;
        for instance in instances {
            if !instance.is_expired(now) {
                continue;
            }
            self.best_effort_delete(&instance.service_id).await;
            match self.store.remove(&instance.service_id).await {
                Ok(()) => {
                    info!(
                        service_id = %instance.service_id,
                        challenge_id = %instance.challenge_id,
                        team_id = %instance.team_id,
                        "expired instance reaped"
                    );
                    reaped += 1;
                }
                Err(e) => {
                    warn!(service_id = %instance.service_id, error = %e, "failed to remove record");
                }
            }
        }
        reaped
    }

    /// Whether the instance's latest deployment is ACTIVE
    ///
    /// Never errors; any failure or missing deployment reads as inactive.
    pub async fn is_active(&self, service_id: &str) -> bool {
        match self.control.deployment_status(service_id).await {
            Ok(Some(DeploymentStatus::Active)) => true,
            Ok(_) => false,
            Err(e) => {
                debug!(service_id = %service_id, error = %e, "status probe failed");
                false
            }
        }
    }

    /// Whether the control plane is reachable with the configured project
    ///
    /// Never errors; used for configuration validation and health checks.
    pub async fn is_connected(&self) -> bool {
        match self.control.project_exists().await {
            Ok(exists) => exists,
            Err(e) => {
                debug!(error = %e, "connectivity probe failed");
                false
            }
        }
    }

    /// Look up the record for a provisioned instance
    pub async fn get_instance(&self, service_id: &str) -> Option<ChallengeInstance> {
        self.store.get(service_id).await.ok().flatten()
    }

    /// The platform hosts no local image registry
    pub fn get_images(&self) -> Vec<String> {
        Vec::new()
    }

    /// Delete the remote service, treating "already gone" as success
    async fn delete_remote(&self, service_id: &str) -> Result<()> {
        match self.control.delete_service(service_id).await {
            Ok(()) => Ok(()),
            Err(ChalforgeError::NotFound(_)) => {
                debug!(service_id = %service_id, "remote service already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Compensating delete: attempt cleanup but never mask the primary
    /// failure with a cleanup failure
    async fn best_effort_delete(&self, service_id: &str) {
        if let Err(e) = self.delete_remote(service_id).await {
            warn!(service_id = %service_id, error = %e, "compensating delete failed");
        }
    }

    /// Poll the latest deployment at a fixed interval until a terminal
    /// state or the configured deadline
    ///
    /// No backoff: the loop has a hard ceiling and one in-flight creation
    /// produces at most one poll per interval.
    async fn poll_deployment(&self, service_id: &str) -> Result<PollOutcome> {
        let deadline = Instant::now() + self.config.deployment_timeout;
        loop {
            let status = self.control.deployment_status(service_id).await?;
            debug!(service_id = %service_id, status = ?status, "deployment status");

            match status {
                Some(DeploymentStatus::Active) => return Ok(PollOutcome::Active),
                Some(status) if status.is_terminal_failure() => {
                    return Ok(PollOutcome::TerminalFailure(status));
                }
                _ => {}
            }

            if Instant::now() >= deadline {
                return Ok(PollOutcome::TimedOut);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}
