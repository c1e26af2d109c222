use crate::core::guild_config::{ConfigKey, GuildConfig, GuildConfigStore};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteGuildConfigStore {
    pool: Pool<Sqlite>,
}

impl SqliteGuildConfigStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database file and runs migrations.
    pub async fn connect(path: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .connect(&format!("sqlite://{}?mode=rwc", path))
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS guild_config (
                guild_id INTEGER PRIMARY KEY,
                bot_log_channel_id INTEGER,
                member_log_channel_id INTEGER,
                mod_log_channel_id INTEGER,
                muted_role_id INTEGER,
                updated_at TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn id_column(row: &sqlx::sqlite::SqliteRow, key: ConfigKey) -> Option<u64> {
    row.get::<Option<i64>, _>(key.column()).map(|id| id as u64)
}

#[async_trait]
impl GuildConfigStore for SqliteGuildConfigStore {
    async fn get(&self, guild_id: u64) -> Result<Option<GuildConfig>> {
        let row = sqlx::query("SELECT * FROM guild_config WHERE guild_id = ?")
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| GuildConfig {
            guild_id,
            bot_log_channel_id: id_column(&row, ConfigKey::BotLogChannel),
            member_log_channel_id: id_column(&row, ConfigKey::MemberLogChannel),
            mod_log_channel_id: id_column(&row, ConfigKey::ModLogChannel),
            muted_role_id: id_column(&row, ConfigKey::MutedRole),
            updated_at: row.get::<Option<DateTime<Utc>>, _>("updated_at"),
        }))
    }

    async fn set_value(&self, guild_id: u64, key: ConfigKey, value: u64) -> Result<()> {
        // `column()` is a fixed identifier, never user input.
        let sql = format!(
            r#"
            INSERT INTO guild_config (guild_id, {column}, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET
                {column} = excluded.{column},
                updated_at = excluded.updated_at
            "#,
            column = key.column()
        );

        sqlx::query(&sql)
            .bind(guild_id as i64)
            .bind(value as i64)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_value(&self, guild_id: u64, key: ConfigKey) -> Result<()> {
        let sql = format!(
            "UPDATE guild_config SET {} = NULL, updated_at = ? WHERE guild_id = ?",
            key.column()
        );

        sqlx::query(&sql)
            .bind(Utc::now())
            .bind(guild_id as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn store() -> (SqliteGuildConfigStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.db");
        let store = SqliteGuildConfigStore::connect(path.to_str().unwrap())
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn missing_guild_has_no_row() {
        let (store, _dir) = store().await;
        assert!(store.get(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_and_clear_round_trip() {
        let (store, _dir) = store().await;

        store
            .set_value(10, ConfigKey::BotLogChannel, 111)
            .await
            .unwrap();
        store.set_value(10, ConfigKey::MutedRole, 222).await.unwrap();

        let config = store.get(10).await.unwrap().unwrap();
        assert_eq!(config.bot_log_channel_id, Some(111));
        assert_eq!(config.muted_role_id, Some(222));
        assert_eq!(config.mod_log_channel_id, None);
        assert!(config.updated_at.is_some());

        store
            .clear_value(10, ConfigKey::BotLogChannel)
            .await
            .unwrap();
        let config = store.get(10).await.unwrap().unwrap();
        assert_eq!(config.bot_log_channel_id, None);
        assert_eq!(config.muted_role_id, Some(222));
    }

    #[tokio::test]
    async fn upsert_overwrites_single_column() {
        let (store, _dir) = store().await;

        store
            .set_value(10, ConfigKey::ModLogChannel, 1)
            .await
            .unwrap();
        store
            .set_value(10, ConfigKey::ModLogChannel, 2)
            .await
            .unwrap();

        let config = store.get(10).await.unwrap().unwrap();
        assert_eq!(config.mod_log_channel_id, Some(2));
    }

    #[tokio::test]
    async fn migrate_is_repeatable() {
        let (store, _dir) = store().await;
        store.migrate().await.unwrap();
    }
}
