//! Challenge instance provisioning
//!
//! The lifecycle of one instance: create remote service → configure →
//! trigger deployment → poll until ACTIVE → expose via TCP proxy → persist
//! the record, with best-effort compensation on every fatal step. Teardown
//! and expiration reaping share the same deletion primitive.

pub mod ports;
pub mod service;
