// The core module contains all business logic.
// Nothing in here depends on serenity or poise.

#[path = "commands/mod.rs"]
pub mod commands;

#[path = "guild_config/mod.rs"]
pub mod guild_config;

#[path = "formatting/discord_formatting.rs"]
pub mod formatting;
