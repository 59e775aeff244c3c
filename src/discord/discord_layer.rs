// Discord layer - commands and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "voice/voice_events.rs"]
pub mod voice;

// Re-export command types for convenience
pub use commands::voice_time::{Context, Data, Error};
