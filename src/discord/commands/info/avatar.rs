use crate::core::commands::{CommandDescriptor, CommandHandler, CommandKind};
use crate::discord::{Reply, SlashContext};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

pub fn command() -> CommandDescriptor<SlashContext> {
    CommandDescriptor::context_menu(CommandKind::User, "Avatar", Avatar)
}

struct Avatar;

#[async_trait]
impl CommandHandler<SlashContext> for Avatar {
    async fn execute(&self, ctx: &SlashContext) -> anyhow::Result<()> {
        let Some(serenity::ResolvedTarget::User(user, _)) = ctx.interaction.data.target() else {
            ctx.say("I couldn't find that user").await?;
            return Ok(());
        };

        let url = user.face();
        let embed = ctx
            .default_embed()
            .title(format!("{}'s avatar", user.name))
            .url(&url)
            .image(url);

        ctx.send(Reply::embed(embed)).await?;
        Ok(())
    }
}
