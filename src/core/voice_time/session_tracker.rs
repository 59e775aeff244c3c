// Live voice sessions and the rules that turn them into stored time.
//
// A session is just "this member has been in voice in this guild since T".
// Durations are measured as wall-clock deltas when something closes or
// settles a session, so there are no timers and every event is O(1).

use super::voice_time_models::SessionKey;
use super::voice_time_store::{VoiceTimeError, VoiceTimeStore};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// What a membership transition did to the session map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A new session started.
    Opened,
    /// The member left voice and `seconds` were added to their total.
    Closed { seconds: u64 },
    /// The member moved channels; `seconds` were settled and the session continues.
    Switched { seconds: u64 },
    /// Not a real transition, or one that doesn't match the session map
    /// (duplicate join, leave without a join). Safe to drop.
    Ignored,
}

/// Summary of a `settle_all` pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SettleReport {
    pub settled: usize,
    pub failed: usize,
    pub seconds: u64,
}

pub struct SessionTracker<S: VoiceTimeStore> {
    store: Arc<S>,
    /// (user_id, guild_id) -> when the current session (or its last settlement) started
    sessions: DashMap<SessionKey, DateTime<Utc>>,
}

/// Whole seconds between two instants, never negative.
fn elapsed_seconds(start: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - start).num_seconds().max(0) as u64
}

impl<S: VoiceTimeStore> SessionTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            sessions: DashMap::new(),
        }
    }

    fn validate_ids(user_id: u64, guild_id: u64) -> Result<(), VoiceTimeError> {
        if user_id == 0 || guild_id == 0 {
            Err(VoiceTimeError::InvalidId)
        } else {
            Ok(())
        }
    }

    /// Apply one voice channel change for a member.
    ///
    /// - `None -> Some` opens a session at `now`
    /// - `Some -> None` closes it and stores the elapsed time
    /// - `Some(a) -> Some(b)` settles the elapsed time and keeps the session open
    /// - anything else is ignored
    pub async fn on_transition(
        &self,
        user_id: u64,
        guild_id: u64,
        previous_channel: Option<u64>,
        next_channel: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<Transition, VoiceTimeError> {
        Self::validate_ids(user_id, guild_id)?;
        let key = SessionKey::new(user_id, guild_id);

        match (previous_channel, next_channel) {
            (None, Some(_)) => Ok(if self.open(key, now) {
                Transition::Opened
            } else {
                Transition::Ignored
            }),
            (Some(_), None) => self.close(key, now).await,
            (Some(previous), Some(next)) if previous != next => {
                match self.settle_one(key, now).await? {
                    Some(seconds) => Ok(Transition::Switched { seconds }),
                    None => Ok(Transition::Ignored),
                }
            }
            _ => Ok(Transition::Ignored),
        }
    }

    /// Flush elapsed time for every member in `snapshot` that has an open session.
    ///
    /// `snapshot` is the authoritative list of members currently in voice.
    /// A failure on one key is logged and counted; the rest still settle.
    pub async fn settle_all(&self, now: DateTime<Utc>, snapshot: &[SessionKey]) -> SettleReport {
        let mut report = SettleReport::default();

        for key in snapshot {
            match self.settle_one(*key, now).await {
                Ok(Some(seconds)) => {
                    report.settled += 1;
                    report.seconds += seconds;
                }
                Ok(None) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        user_id = key.user_id,
                        guild_id = key.guild_id,
                        "Failed to settle voice session: {}",
                        e
                    );
                }
            }
        }

        report
    }

    /// Open a session for a member that was already in voice before we saw
    /// any event for them (e.g. after a restart). Returns false if one is open.
    pub fn resume(&self, key: SessionKey, now: DateTime<Utc>) -> bool {
        if Self::validate_ids(key.user_id, key.guild_id).is_err() {
            return false;
        }
        self.open(key, now)
    }

    /// Drop open sessions of a guild whose members are no longer in voice.
    ///
    /// Used when a guild comes back after an outage: a leave we never saw
    /// would otherwise keep the old start time and credit the whole gap on
    /// the member's next leave. Time since the last settle is not stored,
    /// since we don't know when they actually left.
    pub fn drop_missing(&self, guild_id: u64, connected: &[SessionKey]) -> usize {
        let mut dropped = 0;
        self.sessions.retain(|key, _| {
            if key.guild_id == guild_id && !connected.contains(key) {
                dropped += 1;
                false
            } else {
                true
            }
        });
        dropped
    }

    pub fn is_active(&self, key: SessionKey) -> bool {
        self.sessions.contains_key(&key)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Restart an open session at `now` without storing anything.
    pub fn rebase(&self, key: SessionKey, now: DateTime<Utc>) {
        if let Some(mut start) = self.sessions.get_mut(&key) {
            *start = now;
        }
    }

    /// Restart every open session of a guild at `now` without storing anything.
    pub fn rebase_guild(&self, guild_id: u64, now: DateTime<Utc>) {
        for mut session in self.sessions.iter_mut() {
            if session.key().guild_id == guild_id {
                *session.value_mut() = now;
            }
        }
    }

    fn open(&self, key: SessionKey, now: DateTime<Utc>) -> bool {
        match self.sessions.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
        }
    }

    async fn close(&self, key: SessionKey, now: DateTime<Utc>) -> Result<Transition, VoiceTimeError> {
        let Some((_, start)) = self.sessions.remove(&key) else {
            return Ok(Transition::Ignored);
        };

        let seconds = elapsed_seconds(start, now);
        self.store
            .add_time(key.user_id, key.guild_id, seconds)
            .await?;

        Ok(Transition::Closed { seconds })
    }

    /// Move an open session's start to `now` and store the time in between.
    ///
    /// The start is advanced before the write so a close racing with this
    /// call only counts what comes after `now`. If the write fails the old
    /// start is put back, unless something else replaced it meanwhile.
    async fn settle_one(
        &self,
        key: SessionKey,
        now: DateTime<Utc>,
    ) -> Result<Option<u64>, VoiceTimeError> {
        let (start, advanced_to) = {
            let Some(mut current) = self.sessions.get_mut(&key) else {
                return Ok(None);
            };
            let start = *current;
            let advanced_to = start.max(now);
            *current = advanced_to;
            (start, advanced_to)
        };

        let seconds = elapsed_seconds(start, now);
        if let Err(e) = self
            .store
            .add_time(key.user_id, key.guild_id, seconds)
            .await
        {
            if let Some(mut current) = self.sessions.get_mut(&key) {
                if *current == advanced_to {
                    *current = start;
                }
            }
            return Err(e);
        }

        Ok(Some(seconds))
    }
}
