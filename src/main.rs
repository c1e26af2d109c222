// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic): command model, loader,
//   registry, synchronizer, guild config
// - `infra/` = Implementations of core traits (SQLite store, Discord REST)
// - `discord/` = Discord-specific adapters (command modules, interaction routing)
//
// This file's job is to:
// 1. Load configuration
// 2. Load and validate the command catalog
// 3. Initialize services (dependency injection)
// 4. Set up the Discord framework and route interactions to the registry

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::commands::{CommandRegistry, CommandSynchronizer, SyncConfig, SyncMode, SyncScope};
use crate::core::guild_config::GuildConfigService;
use crate::discord::interactions::events;
use crate::discord::{Data, Error};
use crate::infra::discord_rest::DiscordRegistrationClient;
use crate::infra::guild_config::SqliteGuildConfigStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Event handler for non-framework Discord events. Commands are not
/// registered with poise; every command interaction lands here.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::InteractionCreate { interaction } => {
            events::handle_interaction(ctx, interaction, data).await;
        }
        serenity::FullEvent::Ratelimit { data: info } => {
            tracing::warn!(
                global = info.global,
                limit = info.limit,
                method = ?info.method,
                path = %info.path,
                timeout_ms = info.timeout.as_millis() as u64,
                "Rate limited"
            );
        }
        _ => {}
    }

    Ok(())
}

/// `OWNER_ID` accepts one id or a comma-separated list. Junk is skipped.
fn parse_owner_ids(raw: &str) -> Vec<u64> {
    raw.split(',')
        .filter_map(|id| id.trim().parse().ok())
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening. RUST_LOG overrides.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").map_err(|_| {
        anyhow::anyhow!(
            "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token."
        )
    })?;

    // Keep runtime databases in a dedicated folder so the repo root stays tidy.
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    std::fs::create_dir_all(&data_dir)?;
    let config_db_path = format!("{}/config.db", data_dir);

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    // A malformed command module is fatal: better to refuse to start than to
    // run with a partial command set.
    let registry = Arc::new(CommandRegistry::new());
    let loaded = registry.initialize(&discord::commands::catalog())?;
    tracing::info!(commands = loaded, "Command catalog loaded");

    let config_store = SqliteGuildConfigStore::connect(&config_db_path).await?;
    let guild_config = Arc::new(GuildConfigService::new(config_store));

    let registration_client = DiscordRegistrationClient::new()?;
    let configured_application_id = std::env::var("DISCORD_APPLICATION_ID").ok();
    let bootstrap_guild_id = std::env::var("BOOTSTRAP_GUILD_ID").ok();
    let configured_owners = parse_owner_ids(&std::env::var("OWNER_ID").unwrap_or_default());
    let sync_token = token.clone();

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents =
        serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_EMOJIS_AND_STICKERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Commands live in our own registry, not in poise.
            commands: vec![],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, _framework| {
            Box::pin(async move {
                tracing::info!(user = %ready.user.name, "Bot is starting up...");

                // Private commands (`build`, `config`) only run for these users.
                let mut owners = configured_owners;
                match ctx.http.get_current_application_info().await {
                    Ok(info) => {
                        owners.extend(info.owner.map(|owner| owner.id.get()));
                        if let Some(team) = info.team {
                            owners.extend(team.members.iter().map(|member| member.user.id.get()));
                        }
                    }
                    Err(e) => tracing::warn!("Couldn't fetch application owners: {}", e),
                }
                if owners.is_empty() {
                    tracing::warn!("No application owners known; private commands are disabled");
                }
                registry.set_owners(owners);

                let application_id = configured_application_id
                    .unwrap_or_else(|| ready.application.id.to_string());
                let synchronizer = Arc::new(CommandSynchronizer::new(
                    Arc::clone(&registry),
                    registration_client,
                    SyncConfig {
                        token: Some(sync_token),
                        application_id,
                    },
                ));

                // Without any registered commands there is no way to reach
                // `/build`, so one guild can be seeded on startup.
                if let Some(guild_id) = bootstrap_guild_id {
                    synchronizer
                        .sync_and_report(SyncScope::Guild(guild_id), SyncMode::Install)
                        .await;
                }

                tracing::info!("Bot is ready!");
                Ok(Data {
                    registry,
                    synchronizer,
                    guild_config,
                })
            })
        })
        .build();

    // Create the client and start the bot
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    client.start().await?;
    Ok(())
}
