use chrono::{DateTime, Utc};

/// One configurable slot of a guild's config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    BotLogChannel,
    MemberLogChannel,
    ModLogChannel,
    MutedRole,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 4] = [
        ConfigKey::BotLogChannel,
        ConfigKey::MemberLogChannel,
        ConfigKey::ModLogChannel,
        ConfigKey::MutedRole,
    ];

    /// Subcommand group that edits this key.
    pub fn group_name(self) -> &'static str {
        match self {
            ConfigKey::BotLogChannel => "bot-log",
            ConfigKey::MemberLogChannel => "member-log",
            ConfigKey::ModLogChannel => "mod-log",
            ConfigKey::MutedRole => "muted-role",
        }
    }

    pub fn from_group_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.group_name() == name)
    }

    /// Human-readable label used in replies.
    pub fn label(self) -> &'static str {
        match self {
            ConfigKey::BotLogChannel => "Bot log channel",
            ConfigKey::MemberLogChannel => "Member log channel",
            ConfigKey::ModLogChannel => "Mod log channel",
            ConfigKey::MutedRole => "Muted role",
        }
    }

    /// Storage column. Only ever one of these fixed names.
    pub fn column(self) -> &'static str {
        match self {
            ConfigKey::BotLogChannel => "bot_log_channel_id",
            ConfigKey::MemberLogChannel => "member_log_channel_id",
            ConfigKey::ModLogChannel => "mod_log_channel_id",
            ConfigKey::MutedRole => "muted_role_id",
        }
    }

    pub fn is_role(self) -> bool {
        matches!(self, ConfigKey::MutedRole)
    }

    /// Mention markup for a stored id.
    pub fn mention(self, id: u64) -> String {
        if self.is_role() {
            format!("<@&{}>", id)
        } else {
            format!("<#{}>", id)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuildConfig {
    pub guild_id: u64,
    pub bot_log_channel_id: Option<u64>,
    pub member_log_channel_id: Option<u64>,
    pub mod_log_channel_id: Option<u64>,
    pub muted_role_id: Option<u64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl GuildConfig {
    pub fn empty(guild_id: u64) -> Self {
        Self {
            guild_id,
            bot_log_channel_id: None,
            member_log_channel_id: None,
            mod_log_channel_id: None,
            muted_role_id: None,
            updated_at: None,
        }
    }

    pub fn value(&self, key: ConfigKey) -> Option<u64> {
        match key {
            ConfigKey::BotLogChannel => self.bot_log_channel_id,
            ConfigKey::MemberLogChannel => self.member_log_channel_id,
            ConfigKey::ModLogChannel => self.mod_log_channel_id,
            ConfigKey::MutedRole => self.muted_role_id,
        }
    }

    /// Keys that currently hold a value, in display order.
    pub fn entries(&self) -> Vec<(ConfigKey, u64)> {
        ConfigKey::ALL
            .into_iter()
            .filter_map(|key| self.value(key).map(|id| (key, id)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
