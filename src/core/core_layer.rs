// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "voice_time/mod.rs"]
pub mod voice_time;
