use super::guild_config_models::{ConfigKey, GuildConfig};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait GuildConfigStore: Send + Sync {
    async fn get(&self, guild_id: u64) -> Result<Option<GuildConfig>>;
    async fn set_value(&self, guild_id: u64, key: ConfigKey, value: u64) -> Result<()>;
    async fn clear_value(&self, guild_id: u64, key: ConfigKey) -> Result<()>;
}
