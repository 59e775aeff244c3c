use crate::discord::{Context, Error};

/// Check that the bot is alive and can answer in this channel.
#[poise::command(slash_command, prefix_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let tracked = ctx.data().voice.tracker().active_sessions();
    ctx.say(format!("Pong! 🏓 Tracking {} live voice sessions.", tracked))
        .await?;
    Ok(())
}
