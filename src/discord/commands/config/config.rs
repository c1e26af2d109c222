use crate::core::commands::{
    Branch, CommandDescriptor, CommandHandler, CommandOption, InvocationContext, OptionKind,
    Subcommand, SubcommandGroup,
};
use crate::core::guild_config::{ConfigKey, GuildConfigError};
use crate::discord::{Reply, SlashContext};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

const VIEW_CONFIG: &str = "view-config";

pub fn command() -> CommandDescriptor<SlashContext> {
    let mut branches: Vec<Branch> = ConfigKey::ALL
        .iter()
        .map(|key| Branch::Group(key_group(*key)))
        .collect();
    branches.push(Branch::Subcommand(Subcommand::new(
        VIEW_CONFIG,
        "Sends the full config",
    )));

    CommandDescriptor::chat_input("config", "Manages this server's config", Config)
        .admin_only()
        .private()
        .guild_only()
        .branches(branches)
}

/// `set`/`view`/`reset` for one key, taking a channel or a role.
fn key_group(key: ConfigKey) -> SubcommandGroup {
    let (option, kind) = if key.is_role() {
        ("role", OptionKind::Role)
    } else {
        ("channel", OptionKind::Channel)
    };
    let label = key.label().to_lowercase();

    SubcommandGroup::new(
        key.group_name(),
        format!("Options for this server's {}", label),
    )
    .subcommand(
        Subcommand::new("set", format!("Sets the {}", label)).option(
            CommandOption::new(option, format!("The new {}", label), kind).required(),
        ),
    )
    .subcommand(Subcommand::new("view", format!("Shows the {}", label)))
    .subcommand(Subcommand::new("reset", format!("Resets the {}", label)))
}

struct Config;

#[async_trait]
impl CommandHandler<SlashContext> for Config {
    async fn execute(&self, ctx: &SlashContext) -> anyhow::Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("This command only works in a server").await?;
            return Ok(());
        };

        match (ctx.subcommand_group(), ctx.subcommand()) {
            (None, Some(VIEW_CONFIG)) => view_config(ctx, guild_id).await,
            (Some(group), Some(method)) => match ConfigKey::from_group_name(group) {
                Some(key) => run_method(ctx, guild_id.get(), key, method).await,
                None => Err(anyhow::anyhow!("unknown config group `{}`", group)),
            },
            (group, method) => Err(anyhow::anyhow!(
                "unroutable config invocation: group={:?} subcommand={:?}",
                group,
                method
            )),
        }
    }
}

async fn view_config(ctx: &SlashContext, guild_id: serenity::GuildId) -> anyhow::Result<()> {
    let config = ctx.data.guild_config.get_all(guild_id.get()).await?;
    if config.is_empty() {
        ctx.say("This server has no config yet").await?;
        return Ok(());
    }

    let mut embed = ctx.default_embed().title("Your config");
    for (key, id) in config.entries() {
        let value = if resolves(ctx, guild_id, key, id) {
            key.mention(id)
        } else {
            format!("Couldn't find anything with id: {}", id)
        };
        embed = embed.field(key.label(), value, false);
    }

    ctx.send(Reply::embed(embed)).await?;
    tracing::info!(guild_id = guild_id.get(), "Sent full config");
    Ok(())
}

async fn run_method(
    ctx: &SlashContext,
    guild_id: u64,
    key: ConfigKey,
    method: &str,
) -> anyhow::Result<()> {
    let service = &ctx.data.guild_config;

    let reply = match method {
        "set" => {
            let option = if key.is_role() { "role" } else { "channel" };
            let id = ctx
                .option_id(option)
                .ok_or_else(|| anyhow::anyhow!("missing required option `{}`", option))?;
            service.set(guild_id, key, id).await?;
            format!("{} set to {}", key.label(), key.mention(id))
        }
        "view" => match service.get(guild_id, key).await? {
            Some(id) => format!("{} is {}", key.label(), key.mention(id)),
            None => format!("{} is not set", key.label()),
        },
        "reset" => match service.reset(guild_id, key).await {
            Ok(()) => format!("{} has been reset", key.label()),
            Err(err @ GuildConfigError::NotSet(_)) => err.to_string(),
            Err(err) => return Err(err.into()),
        },
        other => return Err(anyhow::anyhow!("unknown config method `{}`", other)),
    };

    ctx.say(reply).await?;
    Ok(())
}

/// Whether the stored id still points at something in this guild.
fn resolves(ctx: &SlashContext, guild_id: serenity::GuildId, key: ConfigKey, id: u64) -> bool {
    if id == 0 {
        return false;
    }
    let Some(guild) = ctx.ctx.cache.guild(guild_id) else {
        // Without a cached guild there's nothing to check against.
        return true;
    };
    if key.is_role() {
        guild.roles.contains_key(&serenity::RoleId::new(id))
    } else {
        guild.channels.contains_key(&serenity::ChannelId::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commands::descriptor::CommandSchema;

    #[test]
    fn every_key_gets_a_group_plus_view_config() {
        let descriptor = command();
        let CommandSchema::Branches(branches) = &descriptor.schema else {
            panic!("config should route to subcommands");
        };

        let names: Vec<_> = branches.iter().map(Branch::name).collect();
        assert_eq!(
            names,
            vec!["bot-log", "member-log", "mod-log", "muted-role", "view-config"]
        );
    }

    #[test]
    fn muted_role_takes_a_role() {
        let group = key_group(ConfigKey::MutedRole);
        let set = &group.subcommands[0];
        assert_eq!(set.name, "set");
        assert_eq!(set.options[0].name, "role");
        assert_eq!(set.options[0].kind, OptionKind::Role);
        assert!(set.options[0].required);
    }
}
