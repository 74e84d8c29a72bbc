//! Infrastructure module
//!
//! Wraps external dependencies (Secret Manager, Realtime socket)

pub mod realtime;
pub mod secrets;

pub use secrets::SecretClient;
