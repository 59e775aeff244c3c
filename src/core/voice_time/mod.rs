// Voice time tracking: live sessions, accumulated totals and the queries built on them.
// Like the rest of `core/`, nothing in here knows about serenity or poise.

pub mod duration_format;
pub mod session_tracker;
pub mod voice_time_models;
pub mod voice_time_service;
pub mod voice_time_store;

pub use session_tracker::Transition;
pub use voice_time_models::{SessionKey, VoiceTimeRecord};
pub use voice_time_service::VoiceTimeService;
pub use voice_time_store::{VoiceTimeError, VoiceTimeStore};
