// Discord commands for voice time tracking.
//
// **Same pattern as every command file:**
// 1. Extract primitive data from Discord types
// 2. Call the core service
// 3. Format the response based on the result
//
// No business logic here, just translation.

use crate::config::BotConfig;
use crate::core::voice_time::VoiceTimeService;
use crate::discord::voice::{resolve_display_name_cached, voice_snapshot};
use crate::infra::voice_time::SqliteVoiceTimeStore;
use chrono::Utc;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

const TROPHIES: [&str; 5] = ["🥇", "🥈", "🥉", "4️⃣", "5️⃣"];

/// Show the members who spent the most time in voice channels.
#[poise::command(slash_command, prefix_command, guild_only, aliases("lb"))]
pub async fn leaderboard(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let cache = Arc::clone(&ctx.serenity_context().cache);
    let snapshot = voice_snapshot(&cache, guild_id);
    let limit = ctx.data().config.leaderboard_size;

    let entries = ctx
        .data()
        .voice
        .leaderboard(guild_id.get(), Utc::now(), &snapshot, limit, move |user_id| {
            resolve_display_name_cached(&cache, guild_id, user_id)
        })
        .await?;

    let guild_name = guild_name(&ctx);

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("🏆 Top {} Voice Champions", limit))
        .description("Most active voice chat users")
        .color(0xffd700) // Gold color
        .timestamp(serenity::Timestamp::now())
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Server: {}",
            guild_name
        )));

    if entries.is_empty() {
        embed = embed.description("No voice activity recorded yet!");
    } else {
        for entry in &entries {
            embed = embed.field(
                format!("{} {}", rank_badge(entry.rank), entry.display_name),
                format!("Time: **{}**", entry.formatted),
                false,
            );
        }
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Show voice chat statistics for a member.
#[poise::command(slash_command, prefix_command, guild_only, aliases("p"))]
pub async fn profile(
    ctx: Context<'_>,
    #[description = "Member to check (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target_user = user.as_ref().unwrap_or_else(|| ctx.author());
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    if target_user.bot {
        ctx.say("Bots don't have voice profiles! 🤖").await?;
        return Ok(());
    }

    let snapshot = voice_snapshot(&ctx.serenity_context().cache, guild_id);
    let profile = ctx
        .data()
        .voice
        .profile(target_user.id.get(), guild_id.get(), Utc::now(), &snapshot)
        .await?;

    // Cache first, HTTP fallback. A member that left still gets a profile.
    let member = guild_id
        .member(ctx.serenity_context(), target_user.id)
        .await
        .ok();
    let display_name = member
        .as_ref()
        .map(|m| m.display_name().to_string())
        .unwrap_or_else(|| target_user.name.clone());
    let joined_at = member
        .as_ref()
        .and_then(|m| m.joined_at)
        .map(|ts| format!("<t:{}:D>", ts.unix_timestamp()))
        .unwrap_or_else(|| "Unknown".to_string());

    let rank_emoji = if profile.rank == 1 { "👑" } else { "🏅" };
    let status = if profile.in_voice {
        "🟢 In Voice Channel"
    } else {
        "⚫ Not in Voice"
    };

    let embed = serenity::CreateEmbed::new()
        .title("🎮 Voice Profile")
        .color(0x3498db) // Blue
        .thumbnail(target_user.face())
        .timestamp(serenity::Timestamp::now())
        .field("👤 User", format!("**{}**", display_name), false)
        .field(
            "⏱️ Total Time in Voice",
            format!("**{}**", profile.formatted),
            true,
        )
        .field(
            format!("{} Server Rank", rank_emoji),
            format!("**#{}**", profile.rank),
            true,
        )
        .field("📅 Joined Server", joined_at, true)
        .field("📡 Current Status", status, true)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Server: {}",
            guild_name(&ctx)
        )));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Reset voice time statistics (admin only).
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    subcommands("user", "server")
)]
pub async fn resetvoice(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Reset one member's voice time to zero.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn user(
    ctx: Context<'_>,
    #[description = "Member whose voice time should be reset"] user: serenity::User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    ctx.data()
        .voice
        .reset_user(user.id.get(), guild_id.get(), Utc::now())
        .await?;

    ctx.say(format!("✅ Voice time for <@{}> has been reset.", user.id.get()))
        .await?;
    Ok(())
}

/// Wipe the whole server's voice leaderboard.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn server(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let removed = ctx
        .data()
        .voice
        .reset_guild(guild_id.get(), Utc::now())
        .await?;

    ctx.say(format!(
        "🧹 Voice leaderboard reset ({} records removed).",
        removed
    ))
    .await?;
    Ok(())
}

fn guild_name(ctx: &Context<'_>) -> String {
    ctx.guild()
        .map(|guild| guild.name.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Trophy for the top five, plain rank number after that.
fn rank_badge(rank: usize) -> String {
    TROPHIES
        .get(rank.wrapping_sub(1))
        .map(|trophy| trophy.to_string())
        .unwrap_or_else(|| format!("#{}", rank))
}

/// Type alias for our bot's context.
/// This is what every command receives as its first parameter.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands and event handlers.
pub struct Data {
    pub voice: Arc<VoiceTimeService<SqliteVoiceTimeStore>>,
    pub config: BotConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_five_get_trophies() {
        assert_eq!(rank_badge(1), "🥇");
        assert_eq!(rank_badge(3), "🥉");
        assert_eq!(rank_badge(5), "5️⃣");
    }

    #[test]
    fn lower_ranks_fall_back_to_numbers() {
        assert_eq!(rank_badge(6), "#6");
        assert_eq!(rank_badge(25), "#25");
    }
}
