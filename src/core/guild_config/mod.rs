pub mod guild_config_models;
pub mod guild_config_service;
pub mod guild_config_store;

pub use guild_config_models::{ConfigKey, GuildConfig};
pub use guild_config_service::{GuildConfigError, GuildConfigService};
pub use guild_config_store::GuildConfigStore;
