//! Runtime state module
//!
//! Application state and the active call registry

pub mod app_state;
pub mod calls;

pub use app_state::{get_shutdown_token, trigger_shutdown, AppState};
pub use calls::{CallInfo, CallRegistry};
