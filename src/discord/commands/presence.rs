// Bot presence.
//
// Discord-layer glue only: we work with serenity's ActivityData and
// OnlineStatus and keep the logic short.

use poise::serenity_prelude as serenity;

/// Status line shown under the bot's name.
pub fn default_activity() -> serenity::ActivityData {
    serenity::ActivityData::watching("voice channels")
}

/// Called once the bot is ready so the presence is set in one place.
pub fn on_ready(ctx: &serenity::Context) {
    ctx.set_presence(Some(default_activity()), serenity::OnlineStatus::Online);
}
