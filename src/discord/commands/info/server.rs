use crate::core::commands::{CommandDescriptor, CommandHandler};
use crate::core::formatting::{discord_timestamp, GuildOverview};
use crate::discord::{Reply, SlashContext};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

pub fn command() -> CommandDescriptor<SlashContext> {
    CommandDescriptor::chat_input("server", "Sends information about this server", ServerInfo)
        .guild_only()
}

struct ServerInfo;

#[async_trait]
impl CommandHandler<SlashContext> for ServerInfo {
    async fn execute(&self, ctx: &SlashContext) -> anyhow::Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("This command only works in a server").await?;
            return Ok(());
        };

        // Copy what we need out of the cache; the guard must not live across an await.
        let snapshot = ctx
            .ctx
            .cache
            .guild(guild_id)
            .map(|guild| (overview_of(&guild), guild.icon_url()));

        let Some((overview, icon)) = snapshot else {
            ctx.say("I couldn't find this server in my cache").await?;
            return Ok(());
        };

        let created = overview
            .created_at
            .map(|time| discord_timestamp(time, 'R'))
            .unwrap_or_else(|| "Unknown".to_string());

        let mut embed = ctx
            .default_embed()
            .title(&overview.name)
            .field("Roles", format!("**{}**", overview.role_count), true)
            .field("Created", created, true)
            .field("Members", overview.members_line(), true)
            .field("Channels", overview.channels_line(), false)
            .field("Emojis", overview.emojis_line(), false)
            .field("Boosting", overview.boost_line(), false);
        if let Some(headline) = overview.headline() {
            embed = embed.description(headline);
        }
        if let Some(icon) = icon {
            embed = embed.thumbnail(icon);
        }

        ctx.send(Reply::embed(embed)).await?;
        tracing::info!(guild_id = guild_id.get(), "Sent info of {}", overview.name);
        Ok(())
    }
}

fn overview_of(guild: &serenity::Guild) -> GuildOverview {
    let count_channels = |kinds: &[serenity::ChannelType]| {
        guild
            .channels
            .values()
            .filter(|channel| kinds.contains(&channel.kind))
            .count() as u64
    };
    let animated_emojis = guild.emojis.values().filter(|emoji| emoji.animated).count() as u64;
    let has_feature = |name: &str| guild.features.iter().any(|feature| feature == name);

    GuildOverview {
        name: guild.name.clone(),
        created_at: chrono::DateTime::from_timestamp(guild.id.created_at().unix_timestamp(), 0),
        member_count: guild.member_count,
        role_count: guild.roles.len() as u64,
        text_channels: count_channels(&[serenity::ChannelType::Text, serenity::ChannelType::News]),
        voice_channels: count_channels(&[serenity::ChannelType::Voice, serenity::ChannelType::Stage]),
        total_channels: guild.channels.len() as u64,
        static_emojis: guild.emojis.len() as u64 - animated_emojis,
        animated_emojis,
        stickers: guild.stickers.len() as u64,
        boosts: guild.premium_subscription_count.unwrap_or(0),
        boost_tier: boost_tier(guild.premium_tier),
        partnered: has_feature("PARTNERED"),
        verified: has_feature("VERIFIED"),
        vanity_code: guild.vanity_url_code.clone(),
    }
}

fn boost_tier(tier: serenity::PremiumTier) -> u8 {
    match tier {
        serenity::PremiumTier::Tier1 => 1,
        serenity::PremiumTier::Tier2 => 2,
        serenity::PremiumTier::Tier3 => 3,
        _ => 0,
    }
}
