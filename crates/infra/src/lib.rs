//! # Chalforge Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The Railway GraphQL control-plane client
//! - The in-memory instance store (reference implementation)
//! - The background expiration sweeper
//! - Configuration loading (environment / file)
//! - The `ChallengeManager` facade wired from settings
//!
//! ## Architecture
//! - Implements traits defined in `chalforge-core`
//! - Contains all "impure" code (HTTP, clocks, background tasks)

pub mod config;
pub mod manager;
pub mod railway;
pub mod scheduling;
pub mod store;

// Re-export commonly used items
pub use manager::ChallengeManager;
pub use railway::{ApiError, RailwayClient, RailwayEndpoint};
pub use scheduling::{ExpirationSweeper, SweeperConfig};
pub use store::MemoryInstanceStore;
