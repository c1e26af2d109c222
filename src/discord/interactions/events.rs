use super::slash_context::{Data, SlashContext};
use crate::core::commands::DispatchOutcome;
use poise::serenity_prelude as serenity;

const FAILURE_NOTICE: &str = "Something went wrong while running that command.";
const OWNER_ONLY_NOTICE: &str = "Only the bot owner can use this command.";

/// Routes an application command interaction through the registry.
///
/// Handler errors never reach the gateway loop: they are logged here and
/// the invoker gets a short ephemeral notice instead.
pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::Interaction,
    data: &Data,
) {
    let serenity::Interaction::Command(command) = interaction else {
        return;
    };

    let slash = SlashContext::new(ctx.clone(), command.clone(), data.clone());
    let name = command.data.name.as_str();
    let guild_id = command.guild_id.map(|id| id.get());

    match data.registry.dispatch(&slash).await {
        Ok(DispatchOutcome::Handled) => {
            tracing::debug!(command = name, ?guild_id, "Command handled");
        }
        Ok(DispatchOutcome::Missed) => {}
        Ok(DispatchOutcome::Forbidden) => {
            notify(ctx, command, OWNER_ONLY_NOTICE).await;
        }
        Err(e) => {
            tracing::error!(command = name, ?guild_id, error = %e, "Command failed");
            notify(ctx, command, FAILURE_NOTICE).await;
        }
    }
}

/// Ephemeral notice to the invoker.
async fn notify(ctx: &serenity::Context, command: &serenity::CommandInteraction, notice: &str) {
    let message = serenity::CreateInteractionResponseMessage::new()
        .content(notice)
        .ephemeral(true);

    // The handler may already have acknowledged; fall back to a followup.
    if command
        .create_response(ctx, serenity::CreateInteractionResponse::Message(message))
        .await
        .is_err()
    {
        let followup = serenity::CreateInteractionResponseFollowup::new()
            .content(notice)
            .ephemeral(true);
        if let Err(e) = command.create_followup(ctx, followup).await {
            tracing::warn!("Failed to send notice: {}", e);
        }
    }
}

