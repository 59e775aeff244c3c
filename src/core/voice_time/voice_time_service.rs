use super::duration_format::format_duration;
use super::session_tracker::SessionTracker;
use super::voice_time_models::{LeaderboardEntry, SessionKey, VoiceProfile};
use super::voice_time_store::{VoiceTimeError, VoiceTimeStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Read side of voice tracking, plus the admin resets.
///
/// Every query settles open sessions first: members still sitting in voice
/// have no closing event yet, and without the settle they'd be undercounted.
pub struct VoiceTimeService<S: VoiceTimeStore> {
    store: Arc<S>,
    tracker: SessionTracker<S>,
}

impl<S: VoiceTimeStore> VoiceTimeService<S> {
    pub fn new(store: S) -> Self {
        let store = Arc::new(store);
        Self {
            tracker: SessionTracker::new(Arc::clone(&store)),
            store,
        }
    }

    /// The session tracker fed by voice state events.
    pub fn tracker(&self) -> &SessionTracker<S> {
        &self.tracker
    }

    fn validate_guild_id(guild_id: u64) -> Result<(), VoiceTimeError> {
        if guild_id == 0 {
            Err(VoiceTimeError::InvalidId)
        } else {
            Ok(())
        }
    }

    /// Top `limit` members of a guild by voice time.
    ///
    /// `resolve` turns a user id into a display name. Members it can't
    /// resolve (left the server, not cached) are left out of the result,
    /// but the ranks of everyone below them don't shift.
    pub async fn leaderboard<F>(
        &self,
        guild_id: u64,
        now: DateTime<Utc>,
        snapshot: &[SessionKey],
        limit: usize,
        resolve: F,
    ) -> Result<Vec<LeaderboardEntry>, VoiceTimeError>
    where
        F: Fn(u64) -> Option<String>,
    {
        Self::validate_guild_id(guild_id)?;

        let report = self.tracker.settle_all(now, snapshot).await;
        tracing::debug!(
            guild_id,
            settled = report.settled,
            failed = report.failed,
            "Settled sessions before leaderboard"
        );

        let records = self.store.get_leaderboard(guild_id, limit).await?;

        let entries = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let display_name = resolve(record.user_id)?;
                Some(LeaderboardEntry {
                    rank: index + 1,
                    user_id: record.user_id,
                    display_name,
                    total_seconds: record.total_seconds,
                    formatted: format_duration(record.total_seconds),
                })
            })
            .collect();

        Ok(entries)
    }

    /// Total, rank and live status for one member.
    ///
    /// Rank is 1 + the number of members with strictly more time, so tied
    /// members share a rank and a member with no record still gets one.
    pub async fn profile(
        &self,
        user_id: u64,
        guild_id: u64,
        now: DateTime<Utc>,
        snapshot: &[SessionKey],
    ) -> Result<VoiceProfile, VoiceTimeError> {
        if user_id == 0 {
            return Err(VoiceTimeError::InvalidId);
        }
        Self::validate_guild_id(guild_id)?;

        self.tracker.settle_all(now, snapshot).await;

        let total_seconds = self.store.get_time(user_id, guild_id).await?;
        let ranking = self.store.get_leaderboard(guild_id, usize::MAX).await?;
        let ahead = ranking
            .iter()
            .filter(|record| record.total_seconds > total_seconds)
            .count();

        Ok(VoiceProfile {
            user_id,
            guild_id,
            total_seconds,
            formatted: format_duration(total_seconds),
            rank: ahead + 1,
            in_voice: self.tracker.is_active(SessionKey::new(user_id, guild_id)),
        })
    }

    /// Zero one member's total. An open session restarts at `now` so time
    /// from before the reset isn't counted later.
    pub async fn reset_user(
        &self,
        user_id: u64,
        guild_id: u64,
        now: DateTime<Utc>,
    ) -> Result<(), VoiceTimeError> {
        if user_id == 0 {
            return Err(VoiceTimeError::InvalidId);
        }
        Self::validate_guild_id(guild_id)?;

        self.store.reset_user(user_id, guild_id).await?;
        self.tracker.rebase(SessionKey::new(user_id, guild_id), now);

        tracing::info!(user_id, guild_id, "Voice time reset for member");
        Ok(())
    }

    /// Wipe a guild's leaderboard. Returns how many records were removed.
    pub async fn reset_guild(
        &self,
        guild_id: u64,
        now: DateTime<Utc>,
    ) -> Result<u64, VoiceTimeError> {
        Self::validate_guild_id(guild_id)?;

        let removed = self.store.reset_guild(guild_id).await?;
        self.tracker.rebase_guild(guild_id, now);

        tracing::info!(guild_id, removed, "Voice leaderboard reset");
        Ok(removed)
    }
}
