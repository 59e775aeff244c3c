// In-memory implementation of VoiceTimeStore.
//
// Nothing survives a restart, so the bot itself runs on the SQLite store.
// This one backs the core tests and keeps the same contract: atomic
// increments, zero for unknown members, deterministic ordering.

use crate::core::voice_time::{VoiceTimeError, VoiceTimeRecord, VoiceTimeStore};
use async_trait::async_trait;
use dashmap::DashMap;

/// A composite key for looking up a member's total.
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
struct UserGuildKey {
    user_id: u64,
    guild_id: u64,
}

/// **DashMap:**
/// `entry()` holds the shard lock for the whole upsert, which gives us the
/// same no-lost-updates guarantee as the SQL `ON CONFLICT` statement.
pub struct InMemoryVoiceTimeStore {
    /// Maps (user_id, guild_id) -> total seconds
    totals: DashMap<UserGuildKey, u64>,
}

impl InMemoryVoiceTimeStore {
    pub fn new() -> Self {
        Self {
            totals: DashMap::new(),
        }
    }
}

impl Default for InMemoryVoiceTimeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VoiceTimeStore for InMemoryVoiceTimeStore {
    async fn add_time(
        &self,
        user_id: u64,
        guild_id: u64,
        seconds: u64,
    ) -> Result<(), VoiceTimeError> {
        let key = UserGuildKey { user_id, guild_id };

        self.totals
            .entry(key)
            .and_modify(|total| *total = total.saturating_add(seconds))
            .or_insert(seconds);

        Ok(())
    }

    async fn get_time(&self, user_id: u64, guild_id: u64) -> Result<u64, VoiceTimeError> {
        let key = UserGuildKey { user_id, guild_id };
        Ok(self.totals.get(&key).map(|total| *total).unwrap_or(0))
    }

    async fn get_leaderboard(
        &self,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<VoiceTimeRecord>, VoiceTimeError> {
        let mut records: Vec<VoiceTimeRecord> = self
            .totals
            .iter()
            .filter(|entry| entry.key().guild_id == guild_id)
            .map(|entry| VoiceTimeRecord {
                user_id: entry.key().user_id,
                guild_id,
                total_seconds: *entry.value(),
            })
            .collect();

        // Highest first, lower user id wins ties (matches the SQL ORDER BY)
        records.sort_by(|a, b| {
            b.total_seconds
                .cmp(&a.total_seconds)
                .then(a.user_id.cmp(&b.user_id))
        });
        records.truncate(limit);

        Ok(records)
    }

    async fn reset_user(&self, user_id: u64, guild_id: u64) -> Result<(), VoiceTimeError> {
        let key = UserGuildKey { user_id, guild_id };
        if let Some(mut total) = self.totals.get_mut(&key) {
            *total = 0;
        }
        Ok(())
    }

    async fn reset_guild(&self, guild_id: u64) -> Result<u64, VoiceTimeError> {
        let mut removed = 0u64;
        self.totals.retain(|key, _| {
            if key.guild_id == guild_id {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn unknown_member_reads_as_zero() {
        let store = InMemoryVoiceTimeStore::new();
        assert_eq!(store.get_time(123, 456).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn add_time_accumulates() {
        let store = InMemoryVoiceTimeStore::new();

        store.add_time(123, 456, 100).await.unwrap();
        store.add_time(123, 456, 50).await.unwrap();

        assert_eq!(store.get_time(123, 456).await.unwrap(), 150);
    }

    #[tokio::test]
    async fn concurrent_adds_are_not_lost() {
        let store = Arc::new(InMemoryVoiceTimeStore::new());

        let handles: Vec<_> = (1..=50u64)
            .map(|seconds| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.add_time(1, 100, seconds).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.get_time(1, 100).await.unwrap(), (1..=50u64).sum::<u64>());
    }

    #[tokio::test]
    async fn leaderboard_is_sorted_and_scoped_to_guild() {
        let store = InMemoryVoiceTimeStore::new();

        store.add_time(1, 100, 500).await.unwrap();
        store.add_time(2, 100, 300).await.unwrap();
        store.add_time(3, 100, 700).await.unwrap();
        store.add_time(4, 200, 900).await.unwrap(); // Different guild

        let leaderboard = store.get_leaderboard(100, 10).await.unwrap();
        let users: Vec<u64> = leaderboard.iter().map(|r| r.user_id).collect();
        assert_eq!(users, vec![3, 1, 2]);
        assert!(leaderboard.iter().all(|r| r.guild_id == 100));
    }

    #[tokio::test]
    async fn leaderboard_breaks_ties_by_user_id_and_respects_limit() {
        let store = InMemoryVoiceTimeStore::new();
        for user_id in [9, 4, 7, 1, 5, 3] {
            store.add_time(user_id, 100, 60).await.unwrap();
        }

        let leaderboard = store.get_leaderboard(100, 5).await.unwrap();
        let users: Vec<u64> = leaderboard.iter().map(|r| r.user_id).collect();
        assert_eq!(users, vec![1, 3, 4, 5, 7]);
    }

    #[tokio::test]
    async fn resets_touch_only_their_scope() {
        let store = InMemoryVoiceTimeStore::new();
        store.add_time(1, 100, 10).await.unwrap();
        store.add_time(1, 200, 20).await.unwrap();
        store.add_time(2, 100, 30).await.unwrap();

        store.reset_user(1, 100).await.unwrap();
        assert_eq!(store.get_time(1, 100).await.unwrap(), 0);
        assert_eq!(store.get_time(1, 200).await.unwrap(), 20);
        assert_eq!(store.get_time(2, 100).await.unwrap(), 30);
        // Zeroed records stay on the board
        assert_eq!(store.get_leaderboard(100, 10).await.unwrap().len(), 2);

        assert_eq!(store.reset_guild(100).await.unwrap(), 2);
        assert!(store.get_leaderboard(100, 10).await.unwrap().is_empty());
        assert_eq!(store.get_time(1, 200).await.unwrap(), 20);
    }
}
