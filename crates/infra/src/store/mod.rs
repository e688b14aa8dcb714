//! Instance record stores
//!
//! The host application normally brings its own durable `InstanceStore`;
//! the in-memory implementation here is the reference semantics and the
//! default for tests and single-process deployments.

pub mod memory;

pub use memory::MemoryInstanceStore;
