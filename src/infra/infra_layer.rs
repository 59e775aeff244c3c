// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "voice_time/voice_time_store.rs"]
pub mod voice_time;
