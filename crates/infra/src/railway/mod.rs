//! Railway control-plane integration
//!
//! GraphQL client over the Railway HTTP endpoint, plus the typed
//! operations that implement the `ControlPlane` port.

pub mod client;
pub mod errors;

pub use client::{RailwayClient, RailwayEndpoint};
pub use errors::ApiError;
