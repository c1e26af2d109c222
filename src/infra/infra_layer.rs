// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "guild_config/mod.rs"]
pub mod guild_config;

#[path = "discord_rest/mod.rs"]
pub mod discord_rest;
