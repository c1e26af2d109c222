use super::guild_config_models::{ConfigKey, GuildConfig};
use super::guild_config_store::GuildConfigStore;
use dashmap::DashMap;

#[derive(Debug, thiserror::Error)]
pub enum GuildConfigError {
    #[error(transparent)]
    Store(#[from] anyhow::Error),
    #[error("{} is not set", .0.label())]
    NotSet(ConfigKey),
}

/// Per-guild settings (log channels, muted role).
///
/// Reads are served from an in-memory cache; any write drops the cached
/// entry so the next read goes back to the store.
///
/// Each guild also has a write generation. A read only fills the cache if
/// no write landed while it was waiting on the store, and the check and the
/// fill happen under the generation entry's lock, the same lock writes bump
/// it under.
pub struct GuildConfigService<S: GuildConfigStore> {
    store: S,
    cache: DashMap<u64, GuildConfig>,
    generations: DashMap<u64, u64>,
}

impl<S: GuildConfigStore> GuildConfigService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: DashMap::new(),
            generations: DashMap::new(),
        }
    }

    fn generation(&self, guild_id: u64) -> u64 {
        self.generations.get(&guild_id).map(|g| *g).unwrap_or(0)
    }

    fn invalidate(&self, guild_id: u64) {
        let mut generation = self.generations.entry(guild_id).or_insert(0);
        *generation += 1;
        self.cache.remove(&guild_id);
    }

    /// The full config. A guild with no stored row gets an empty config.
    pub async fn get_all(&self, guild_id: u64) -> Result<GuildConfig, GuildConfigError> {
        if let Some(cached) = self.cache.get(&guild_id) {
            return Ok(cached.value().clone());
        }

        let seen = self.generation(guild_id);
        let config = self
            .store
            .get(guild_id)
            .await?
            .unwrap_or_else(|| GuildConfig::empty(guild_id));

        let generation = self.generations.entry(guild_id).or_insert(0);
        if *generation == seen {
            self.cache.insert(guild_id, config.clone());
        }
        drop(generation);
        Ok(config)
    }

    pub async fn get(&self, guild_id: u64, key: ConfigKey) -> Result<Option<u64>, GuildConfigError> {
        Ok(self.get_all(guild_id).await?.value(key))
    }

    pub async fn set(&self, guild_id: u64, key: ConfigKey, value: u64) -> Result<(), GuildConfigError> {
        self.store.set_value(guild_id, key, value).await?;
        self.invalidate(guild_id);
        tracing::info!(guild_id, key = key.column(), value, "Guild config updated");
        Ok(())
    }

    /// Clears a key. Resetting a key that isn't set is an error so the
    /// caller can tell the user nothing changed.
    pub async fn reset(&self, guild_id: u64, key: ConfigKey) -> Result<(), GuildConfigError> {
        if self.get(guild_id, key).await?.is_none() {
            return Err(GuildConfigError::NotSet(key));
        }

        self.store.clear_value(guild_id, key).await?;
        self.invalidate(guild_id);
        tracing::info!(guild_id, key = key.column(), "Guild config reset");
        Ok(())
    }
}
