// Discord layer - serenity adapters, command modules and event routing.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "interactions/mod.rs"]
pub mod interactions;

pub use interactions::slash_context::{Data, Error, Reply, SlashContext};
