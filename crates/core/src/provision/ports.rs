//! Port interfaces for instance provisioning
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chalforge_domain::{ChallengeInstance, DeploymentStatus, ProxyEndpoint, Result};

/// Trait for driving the remote control plane
///
/// One method per control-plane operation; implementations normalize
/// transport and application-level failures into `ChalforgeError`.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Create a remote service from a container image; returns the
    /// platform-assigned service id
    async fn create_service(&self, name: &str, image: &str) -> Result<String>;

    /// Override the image entrypoint for a service
    async fn set_start_command(&self, service_id: &str, command: &str) -> Result<()>;

    /// Trigger a deployment of the service's current configuration
    async fn deploy_service(&self, service_id: &str) -> Result<()>;

    /// Status of the service's latest deployment, `None` if it has none yet
    async fn deployment_status(&self, service_id: &str) -> Result<Option<DeploymentStatus>>;

    /// Expose the given application port through a platform TCP proxy
    async fn create_tcp_proxy(&self, service_id: &str, application_port: u16)
        -> Result<ProxyEndpoint>;

    /// Delete a remote service (and its proxies)
    async fn delete_service(&self, service_id: &str) -> Result<()>;

    /// Lightweight read against the configured project, used as a
    /// reachability/credential check
    async fn project_exists(&self) -> Result<bool>;
}

/// Trait for persisting challenge instance records
///
/// The host application supplies a durable implementation; each mutation
/// must be a single atomic operation (see `MemoryInstanceStore` in infra
/// for the reference semantics).
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Insert a record; replaces any existing record with the same id
    async fn insert(&self, instance: ChallengeInstance) -> Result<()>;

    /// Fetch a record by service id
    async fn get(&self, service_id: &str) -> Result<Option<ChallengeInstance>>;

    /// Remove a record by service id; absent records are a no-op
    async fn remove(&self, service_id: &str) -> Result<()>;

    /// Scan all records
    async fn all(&self) -> Result<Vec<ChallengeInstance>>;
}
