use super::voice_time_models::VoiceTimeRecord;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoiceTimeError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid user or guild ID")]
    InvalidId,
}

/// Trait for persisting accumulated voice time.
///
/// The core only relies on this contract; `infra/` decides whether the
/// totals live in SQLite or in memory.
#[async_trait]
pub trait VoiceTimeStore: Send + Sync {
    /// Add `seconds` to a member's total, creating the record if needed.
    /// Must be a single atomic operation so concurrent calls never lose updates.
    async fn add_time(&self, user_id: u64, guild_id: u64, seconds: u64)
        -> Result<(), VoiceTimeError>;

    /// Returns 0 if the member has no record in this guild.
    async fn get_time(&self, user_id: u64, guild_id: u64) -> Result<u64, VoiceTimeError>;

    /// Top members of a guild, highest total first. Ties go to the lower user id.
    async fn get_leaderboard(
        &self,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<VoiceTimeRecord>, VoiceTimeError>;

    /// Zero one member's total. The record itself is kept.
    async fn reset_user(&self, user_id: u64, guild_id: u64) -> Result<(), VoiceTimeError>;

    /// Delete every record of a guild, returning how many were removed.
    async fn reset_guild(&self, guild_id: u64) -> Result<u64, VoiceTimeError>;
}
