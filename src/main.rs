// This is the entry point of the wallet bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (storage)
// - `discord/` = Discord-specific adapters (commands, components, events)
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

use crate::core::ledger::LedgerService;
use crate::discord::commands::general::build_intro_message;
use crate::discord::commands::presence;
use crate::discord::ledger::manage_buttons;
use crate::discord::{Data, Error};
use crate::infra::ledger::JsonLedgerStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

const DEFAULT_DATA_DIR: &str = "data";

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!(
                user = %data_about_bot.user.name,
                user_id = data_about_bot.user.id.get(),
                shard = ?data_about_bot.shard,
                guilds = data_about_bot.guilds.len(),
                "Logged in"
            );
            // Presence is per shard, so set it on every shard's Ready.
            presence::on_ready(ctx);
        }
        serenity::FullEvent::ShardStageUpdate { event } => {
            tracing::info!(
                shard_id = event.shard_id.0,
                "Shard stage changed: {:?} -> {:?}",
                event.old,
                event.new
            );
        }
        serenity::FullEvent::Message { new_message } => {
            if new_message.author.bot || new_message.guild_id.is_none() {
                return Ok(());
            }

            // Introduce ourselves when mentioned
            let (bot_id, avatar_url) = {
                let me = ctx.cache.current_user();
                (me.id, me.face())
            };
            if new_message.mentions.iter().any(|u| u.id == bot_id) {
                let intro = build_intro_message(bot_id, avatar_url, data.support_url.as_deref())
                    .reference_message(new_message);
                if let Err(e) = new_message.channel_id.send_message(&ctx.http, intro).await {
                    // Usually missing Send Messages in that channel
                    tracing::warn!("Failed to reply to mention: {}", e);
                }
            }
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            if let Err(e) = manage_buttons::handle_interaction(ctx, interaction, data).await {
                tracing::error!("Error handling balance button: {}", e);
            }
        }
        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let token = std::env::var("DISCORD_TOKEN").context(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    )?;

    // One JSON file per guild lives here.
    let data_dir =
        std::env::var("LEDGER_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir))?;

    let support_url = std::env::var("SUPPORT_SERVER_URL")
        .ok()
        .filter(|url| !url.trim().is_empty());

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let ledger_store = JsonLedgerStore::new(&data_dir);
    let ledger_service = Arc::new(LedgerService::new(ledger_store));
    tracing::info!(data_dir = %data_dir, "Ledger store ready");

    let data = Data {
        ledger: Arc::clone(&ledger_service),
        support_url,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    // Mentions are delivered with GUILD_MESSAGES alone; we never read message content.
    let intents = serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_MESSAGES;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::economy::balance(),
                discord::commands::economy::set_name(),
                discord::commands::economy::set_admin(),
                discord::commands::economy::list(),
                discord::commands::general::invite(),
                discord::commands::general::info(),
                discord::commands::general::help(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                // Global registration can take a while to propagate to every guild.
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered");
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client
        .start_autosharded()
        .await
        .context("Error running bot")?;

    Ok(())
}
