// Gateway events that feed the session tracker.
//
// Everything here translates serenity types into the primitives the core
// expects (user id, guild id, channel ids, timestamps) and logs the outcome.

use crate::core::voice_time::{SessionKey, Transition};
use crate::discord::Data;
use anyhow::Result;
use chrono::Utc;
use poise::serenity_prelude as serenity;

/// Members currently sitting in a voice channel of `guild_id`, according to the cache.
pub fn voice_snapshot(cache: &serenity::Cache, guild_id: serenity::GuildId) -> Vec<SessionKey> {
    let Some(guild) = cache.guild(guild_id) else {
        return Vec::new();
    };

    guild
        .voice_states
        .values()
        .filter(|vs| vs.channel_id.is_some())
        .map(|vs| SessionKey::new(vs.user_id.get(), guild_id.get()))
        .collect()
}

/// Display name of a guild member, from the cache only.
///
/// Returns None for members that left (or were never cached) so the
/// leaderboard can skip them without an HTTP round trip.
pub fn resolve_display_name_cached(
    cache: &serenity::Cache,
    guild_id: serenity::GuildId,
    user_id: u64,
) -> Option<String> {
    let guild = cache.guild(guild_id)?;
    guild
        .members
        .get(&serenity::UserId::new(user_id))
        .map(|member| member.display_name().to_string())
}

pub async fn handle_voice_state_update(
    data: &Data,
    old: Option<&serenity::VoiceState>,
    new: &serenity::VoiceState,
) -> Result<()> {
    let guild_id = match new.guild_id {
        Some(id) => id.get(),
        None => return Ok(()),
    };

    if new.member.as_ref().is_some_and(|m| m.user.bot) {
        return Ok(());
    }

    let user_id = new.user_id.get();
    let old_channel_id = old.and_then(|s| s.channel_id.map(|id| id.get()));
    let new_channel_id = new.channel_id.map(|id| id.get());

    let transition = data
        .voice
        .tracker()
        .on_transition(user_id, guild_id, old_channel_id, new_channel_id, Utc::now())
        .await?;

    match transition {
        Transition::Opened => {
            tracing::debug!(user_id, guild_id, "Voice session opened");
        }
        Transition::Closed { seconds } => {
            tracing::debug!(user_id, guild_id, seconds, "Voice session closed");
        }
        Transition::Switched { seconds } => {
            tracing::debug!(user_id, guild_id, seconds, "Voice channel switched");
        }
        Transition::Ignored => {
            tracing::debug!(
                user_id,
                guild_id,
                ?old_channel_id,
                ?new_channel_id,
                "Voice state update ignored"
            );
        }
    }

    Ok(())
}

/// First known answer wins: the user cache, then the guild's member list,
/// then the member attached to the voice state. Unknown counts as human.
fn first_known_bot_flag(
    cached_user: Option<bool>,
    guild_member: Option<bool>,
    state_member: Option<bool>,
) -> bool {
    cached_user.or(guild_member).or(state_member).unwrap_or(false)
}

fn is_bot_cached(cache: &serenity::Cache, guild: &serenity::Guild, vs: &serenity::VoiceState) -> bool {
    first_known_bot_flag(
        cache.user(vs.user_id).map(|user| user.bot),
        guild.members.get(&vs.user_id).map(|member| member.user.bot),
        vs.member.as_ref().map(|member| member.user.bot),
    )
}

/// Bring the tracker in line with who is in voice when the guild becomes
/// available (bot restart, reconnect).
///
/// Members already connected get a session starting now; without this they'd
/// only start counting after their next channel change. Sessions for members
/// who left while we weren't listening are dropped. Returns how many were resumed.
pub fn handle_guild_create(cache: &serenity::Cache, data: &Data, guild: &serenity::Guild) -> usize {
    let now = Utc::now();
    let guild_id = guild.id.get();

    let connected: Vec<SessionKey> = guild
        .voice_states
        .values()
        .filter(|vs| vs.channel_id.is_some())
        .filter(|vs| !is_bot_cached(cache, guild, vs))
        .map(|vs| SessionKey::new(vs.user_id.get(), guild_id))
        .collect();

    let tracker = data.voice.tracker();
    let dropped = tracker.drop_missing(guild_id, &connected);
    if dropped > 0 {
        tracing::info!(
            guild_id,
            dropped,
            "Dropped voice sessions for members who left while disconnected"
        );
    }

    let resumed = connected
        .iter()
        .filter(|key| tracker.resume(**key, now))
        .count();

    if resumed > 0 {
        tracing::info!(
            guild_id,
            resumed,
            "Resumed voice sessions for members already connected"
        );
    }

    resumed
}

/// Run `handle_guild_create` for every guild already in the cache.
pub fn resume_from_cache(cache: &serenity::Cache, data: &Data) -> usize {
    cache
        .guilds()
        .into_iter()
        .filter_map(|guild_id| {
            let guild = cache.guild(guild_id)?;
            Some(handle_guild_create(cache, data, &guild))
        })
        .sum()
}
