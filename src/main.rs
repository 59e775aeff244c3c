// This is the entry point of the voice time bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic): sessions, totals, rankings
// - `infra/` = Implementations of core traits (SQLite, in-memory)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::BotConfig;
use crate::core::voice_time::VoiceTimeService;
use crate::discord::commands::presence;
use crate::discord::voice as voice_events;
use crate::discord::{Data, Error};
use crate::infra::voice_time::SqliteVoiceTimeStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events.
/// Voice state changes drive the session tracker.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::VoiceStateUpdate { old, new } => {
            // Never fatal: a missed update costs some seconds, not the bot
            if let Err(e) =
                voice_events::handle_voice_state_update(data, old.as_ref(), new).await
            {
                tracing::error!(
                    user_id = new.user_id.get(),
                    "Error handling voice state update: {}",
                    e
                );
            }
        }
        serenity::FullEvent::GuildCreate { guild, .. } => {
            voice_events::handle_guild_create(&ctx.cache, data, guild);
        }
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!(
                bot = %data_about_bot.user.name,
                guilds = data_about_bot.guilds.len(),
                "Logged in"
            );
        }

        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    let config = BotConfig::from_env();
    tracing::info!(
        database = %config.database_path,
        leaderboard_size = config.leaderboard_size,
        prefix = %config.command_prefix,
        "Configuration loaded"
    );

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    // Create the SQLite-backed voice time store (creates the file and table if needed)
    let voice_store = SqliteVoiceTimeStore::new(&config.database_path)
        .await
        .expect("Failed to initialize SQLite store");

    // The service owns the session tracker; both share the store
    let voice_service = Arc::new(VoiceTimeService::new(voice_store));

    let prefix = config.command_prefix.clone();
    let data = Data {
        voice: Arc::clone(&voice_service),
        config,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_VOICE_STATES // Join/leave/switch events
        | serenity::GatewayIntents::GUILD_MEMBERS // Display names for the leaderboard
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT; // Required for prefix commands

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::voice_time::leaderboard(),
                discord::commands::voice_time::profile(),
                discord::commands::voice_time::resetvoice(),
                discord::commands::info::ping(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                ..Default::default()
            },
            // Event handler for voice state and lifecycle events
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                tracing::info!("Commands registered, bot is ready");
                presence::on_ready(ctx);

                // Guilds that arrived while we were registering commands never
                // reached the event handler, so pick their voice members up here.
                let resumed = voice_events::resume_from_cache(&ctx.cache, &data);
                tracing::info!(resumed, "Voice sessions resumed from cache");

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
