//! Service layer module
//!
//! Contains the media bridge logic

pub mod bridge;
