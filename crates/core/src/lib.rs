//! # Chalforge Core
//!
//! Business logic for challenge instance provisioning.
//!
//! This crate contains:
//! - Port traits that infrastructure implements (`ControlPlane`,
//!   `InstanceStore`)
//! - The provisioning service: creation orchestration, deployment polling,
//!   explicit teardown, and expiration reaping
//!
//! ## Architecture
//! - Depends only on `chalforge-domain`
//! - No I/O of its own; everything impure enters through the ports

pub mod provision;

// Re-export commonly used items
pub use provision::ports::{ControlPlane, InstanceStore};
pub use provision::service::{ProvisionConfig, ProvisionService};
