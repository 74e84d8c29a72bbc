//! Domain model module
//!
//! Pure data structures, no axum/tokio dependencies

pub mod locale;
pub mod realtime;
pub mod twilio;
pub mod twiml;

// Re-exports for convenience
pub use locale::Locale;
pub use twilio::{MediaFormat, MediaPayload, StreamEvent};
pub use twiml::VoiceResponse;
