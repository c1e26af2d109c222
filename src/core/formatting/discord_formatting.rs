// Small text helpers shared by command replies. Pure functions only, so
// they can be tested without a Discord connection.

use chrono::{DateTime, Utc};

/// `1 channel`, `3 channels`, `no channels`.
pub fn count_noun(count: u64, noun: &str) -> String {
    if count == 0 {
        format!("no {}s", noun)
    } else {
        format!("{} {}", count, pluralize(noun, count))
    }
}

pub fn pluralize(noun: &str, count: u64) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{}s", noun)
    }
}

/// Discord timestamp markup, rendered client-side in the reader's timezone.
/// `style` is one of Discord's format letters (`R` for relative, `F` full).
pub fn discord_timestamp(time: DateTime<Utc>, style: char) -> String {
    format!("<t:{}:{}>", time.timestamp(), style)
}

/// Owned snapshot of the guild fields the `server` command shows. Built
/// from the cache by the Discord layer so no cache guard outlives it.
#[derive(Debug, Clone, Default)]
pub struct GuildOverview {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub member_count: u64,
    pub role_count: u64,
    pub text_channels: u64,
    pub voice_channels: u64,
    pub total_channels: u64,
    pub static_emojis: u64,
    pub animated_emojis: u64,
    pub stickers: u64,
    pub boosts: u64,
    pub boost_tier: u8,
    pub partnered: bool,
    pub verified: bool,
    pub vanity_code: Option<String>,
}

impl GuildOverview {
    /// Verified/partner blurb, if the guild is either.
    pub fn headline(&self) -> Option<String> {
        let vanity = self
            .vanity_code
            .as_deref()
            .map(|code| format!(" with vanity `{}`", code))
            .unwrap_or_default();

        if self.verified {
            Some(format!("A verified server{}", vanity))
        } else if self.partnered {
            Some(format!("A Discord partner{}", vanity))
        } else {
            None
        }
    }

    pub fn members_line(&self) -> String {
        format!(
            "**{}** {}",
            self.member_count,
            pluralize("member", self.member_count)
        )
    }

    pub fn channels_line(&self) -> String {
        format!(
            "**{}** {} in total\n{} and {}",
            self.total_channels,
            pluralize("channel", self.total_channels),
            count_noun(self.text_channels, "text channel"),
            count_noun(self.voice_channels, "voice channel"),
        )
    }

    pub fn emojis_line(&self) -> String {
        let total = self.static_emojis + self.animated_emojis;
        let stickers = count_noun(self.stickers, "sticker");
        if total == 0 {
            return format!("No emojis and {}", stickers);
        }

        format!(
            "**{}** {} in total\n{}, {}, and {}",
            total,
            pluralize("emoji", total),
            count_noun(self.static_emojis, "emoji"),
            count_noun(self.animated_emojis, "animated emoji"),
            stickers
        )
    }

    pub fn boost_line(&self) -> String {
        if self.boosts == 0 {
            return "No boosts".to_string();
        }
        let tier = match self.boost_tier {
            0 => "no level".to_string(),
            n => format!("level {}", n),
        };
        format!(
            "Server has {} with **{}** {}",
            tier,
            self.boosts,
            pluralize("boost", self.boosts)
        )
    }
}
