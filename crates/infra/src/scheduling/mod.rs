//! Background scheduling
//!
//! The expiration sweeper is the only recurring task: it reaps expired
//! instances on a fixed interval, independently of foreground creation
//! requests.

pub mod error;
pub mod expiration_sweeper;

pub use error::{SweeperError, SweeperResult};
pub use expiration_sweeper::{ExpirationSweeper, SweeperConfig};
