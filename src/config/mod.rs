//! Configuration module
//!
//! Environment variable parsing and configuration management

pub mod env;

pub use env::EnvConfig;
