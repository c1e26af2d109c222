use crate::core::commands::{
    is_snowflake, Branch, CommandDescriptor, CommandHandler, CommandOption, InvocationContext,
    OptionKind, Subcommand, SyncMode, SyncScope,
};
use crate::discord::SlashContext;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

pub fn command() -> CommandDescriptor<SlashContext> {
    let clear = || {
        CommandOption::new(
            "clear",
            "Clear commands instead of building",
            OptionKind::Boolean,
        )
    };

    CommandDescriptor::chat_input("build", "Build commands", Build)
        .admin_only()
        .private()
        .branches(vec![
            Branch::Subcommand(Subcommand::new("global", "Build global commands").option(clear())),
            Branch::Subcommand(
                Subcommand::new("guild", "Build guild commands")
                    .option(CommandOption::new(
                        "guild",
                        "A specific guild to build to",
                        OptionKind::String,
                    ))
                    .option(clear()),
            ),
        ])
}

struct Build;

#[async_trait]
impl CommandHandler<SlashContext> for Build {
    async fn execute(&self, ctx: &SlashContext) -> anyhow::Result<()> {
        ctx.defer().await?;

        let mode = if ctx.option_bool("clear").unwrap_or(false) {
            SyncMode::Clear
        } else {
            SyncMode::Install
        };

        let scope = match ctx.subcommand() {
            Some("guild") => {
                let guild_id = ctx
                    .option_str("guild")
                    .map(str::to_string)
                    .or_else(|| ctx.guild_id().map(|id| id.to_string()))
                    .unwrap_or_default();

                // Malformed ids fall through so the synchronizer can report them.
                if is_snowflake(&guild_id) && !guild_known(ctx, &guild_id) {
                    ctx.say("I couldn't find the guild").await?;
                    return Ok(());
                }
                SyncScope::Guild(guild_id)
            }
            _ => SyncScope::Global,
        };

        let (ok, report) = ctx.data.synchronizer.sync_and_report(scope, mode).await;
        let reply = if ok {
            report
        } else {
            format!("Couldn't update commands: {}", report)
        };
        ctx.say(reply).await?;
        Ok(())
    }
}

fn guild_known(ctx: &SlashContext, guild_id: &str) -> bool {
    guild_id
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .is_some_and(|id| ctx.ctx.cache.guild(serenity::GuildId::new(id)).is_some())
}
