// Adapter between serenity's command interactions and the core registry.
//
// A `SlashContext` owns everything a handler needs: the serenity context for
// talking to Discord, the raw interaction, the shared services, and the
// options already flattened into a `CommandInvocation`.

use crate::core::commands::descriptor::CommandInvocation;
use crate::core::commands::{
    CommandRegistry, CommandSynchronizer, InvocationContext, OptionValue, VisibilityQuery,
};
use crate::core::guild_config::GuildConfigService;
use crate::infra::discord_rest::DiscordRegistrationClient;
use crate::infra::guild_config::SqliteGuildConfigStore;
use poise::serenity_prelude as serenity;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

pub type Registry = CommandRegistry<SlashContext>;
pub type Synchronizer = CommandSynchronizer<SlashContext, DiscordRegistrationClient>;

/// Services shared across all commands. Cheap to clone.
#[derive(Clone)]
pub struct Data {
    pub registry: Arc<Registry>,
    pub synchronizer: Arc<Synchronizer>,
    pub guild_config: Arc<GuildConfigService<SqliteGuildConfigStore>>,
}

const EMBED_COLOR: u32 = 0x5865F2; // Blurple

/// Body of a reply. Either part may be empty, not both.
#[derive(Default)]
pub struct Reply {
    content: Option<String>,
    embed: Option<serenity::CreateEmbed>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embed: None,
        }
    }

    pub fn embed(embed: serenity::CreateEmbed) -> Self {
        Self {
            content: None,
            embed: Some(embed),
        }
    }
}

pub struct SlashContext {
    pub ctx: serenity::Context,
    pub interaction: serenity::CommandInteraction,
    pub data: Data,
    invocation: CommandInvocation,
    responded: AtomicBool,
}

impl SlashContext {
    pub fn new(
        ctx: serenity::Context,
        interaction: serenity::CommandInteraction,
        data: Data,
    ) -> Self {
        let invocation = invocation_from(&interaction.data);
        Self {
            ctx,
            interaction,
            data,
            invocation,
            responded: AtomicBool::new(false),
        }
    }

    pub fn guild_id(&self) -> Option<serenity::GuildId> {
        self.interaction.guild_id
    }

    pub fn user(&self) -> &serenity::User {
        &self.interaction.user
    }

    /// Whether replies should be ephemeral for this invocation.
    pub fn hidden(&self) -> bool {
        self.data
            .registry
            .resolve_visibility(VisibilityQuery::Invocation(self))
    }

    /// Embed with the bot's standard color, footer and timestamp.
    pub fn default_embed(&self) -> serenity::CreateEmbed {
        serenity::CreateEmbed::new()
            .color(EMBED_COLOR)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Requested by {}",
                self.user().name
            )))
            .timestamp(serenity::Timestamp::now())
    }

    /// Acknowledge now and reply later. Use before anything slow; Discord
    /// drops interactions that aren't acknowledged within three seconds.
    pub async fn defer(&self) -> anyhow::Result<()> {
        let response = serenity::CreateInteractionResponse::Defer(
            serenity::CreateInteractionResponseMessage::new().ephemeral(self.hidden()),
        );
        self.interaction.create_response(&self.ctx, response).await?;
        self.responded.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub async fn say(&self, content: impl Into<String>) -> anyhow::Result<()> {
        self.send(Reply::text(content)).await
    }

    /// Sends the reply, editing the deferred response if there is one.
    pub async fn send(&self, reply: Reply) -> anyhow::Result<()> {
        if self.responded.load(Ordering::SeqCst) {
            let mut edit = serenity::EditInteractionResponse::new();
            if let Some(content) = reply.content {
                edit = edit.content(content);
            }
            if let Some(embed) = reply.embed {
                edit = edit.embed(embed);
            }
            self.interaction.edit_response(&self.ctx, edit).await?;
            return Ok(());
        }

        let mut message = serenity::CreateInteractionResponseMessage::new().ephemeral(self.hidden());
        if let Some(content) = reply.content {
            message = message.content(content);
        }
        if let Some(embed) = reply.embed {
            message = message.embed(embed);
        }
        self.interaction
            .create_response(&self.ctx, serenity::CreateInteractionResponse::Message(message))
            .await?;
        self.responded.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl InvocationContext for SlashContext {
    fn command_name(&self) -> &str {
        self.invocation.command_name()
    }

    fn subcommand_group(&self) -> Option<&str> {
        self.invocation.subcommand_group()
    }

    fn subcommand(&self) -> Option<&str> {
        self.invocation.subcommand()
    }

    fn option(&self, name: &str) -> Option<&OptionValue> {
        self.invocation.option(name)
    }

    fn invoker_id(&self) -> Option<u64> {
        Some(self.interaction.user.id.get())
    }
}

/// Flattens the interaction's option tree. Discord nests at most
/// group -> subcommand -> options, so this walks exactly those levels.
fn invocation_from(data: &serenity::CommandData) -> CommandInvocation {
    let mut invocation = CommandInvocation::new(data.name.clone());

    for option in &data.options {
        match &option.value {
            serenity::CommandDataOptionValue::SubCommandGroup(subcommands) => {
                invocation.group = Some(option.name.clone());
                for subcommand in subcommands {
                    if let serenity::CommandDataOptionValue::SubCommand(options) =
                        &subcommand.value
                    {
                        invocation.subcommand = Some(subcommand.name.clone());
                        collect_values(&mut invocation, options);
                    }
                }
            }
            serenity::CommandDataOptionValue::SubCommand(options) => {
                invocation.subcommand = Some(option.name.clone());
                collect_values(&mut invocation, options);
            }
            _ => collect_values(&mut invocation, std::slice::from_ref(option)),
        }
    }

    invocation
}

fn collect_values(invocation: &mut CommandInvocation, options: &[serenity::CommandDataOption]) {
    for option in options {
        if let Some(value) = option_value(&option.value) {
            invocation.options.insert(option.name.clone(), value);
        }
    }
}

fn option_value(value: &serenity::CommandDataOptionValue) -> Option<OptionValue> {
    use serenity::CommandDataOptionValue as V;

    Some(match value {
        V::Boolean(value) => OptionValue::Boolean(*value),
        V::String(value) => OptionValue::String(value.clone()),
        V::Integer(value) => OptionValue::Integer(*value),
        V::Number(value) => OptionValue::Number(*value),
        V::User(id) => OptionValue::User(id.get()),
        V::Channel(id) => OptionValue::Channel(id.get()),
        V::Role(id) => OptionValue::Role(id.get()),
        V::Mentionable(id) => OptionValue::Mentionable(id.get()),
        V::Attachment(id) => OptionValue::Attachment(id.get()),
        _ => return None,
    })
}
