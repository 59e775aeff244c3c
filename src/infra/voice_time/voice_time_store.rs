// Implementations of the voice time store.

// Only the tests run on the in-memory store; the bot uses SQLite.
#[cfg_attr(not(test), allow(dead_code))]
pub mod in_memory;
pub mod sqlite_store;

// Re-export for convenience
#[allow(unused_imports)]
pub use in_memory::InMemoryVoiceTimeStore;
pub use sqlite_store::SqliteVoiceTimeStore;
