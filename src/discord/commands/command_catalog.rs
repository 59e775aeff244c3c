// Discord commands module.
// Each feature gets its own command file.

pub mod voice_time;

// Bot presence management
pub mod presence;

pub mod info;
