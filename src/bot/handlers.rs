//! Discord event handlers: link auto-detection and the `/tiktok` command.

use crate::bot::discord::create_message;
use crate::bot::pipeline::resolve;
use crate::bot::reply::{Attachments, Reply};
use crate::config::{
    Settings, COMMAND_DESCRIPTION, COMMAND_NAME, COMMAND_OPTION, COMMAND_OPTION_DESCRIPTION,
};
use crate::tiktok::TiktokApi;
use serenity::all::{
    Command, CommandId, CommandInteraction, CommandOptionType, Context, CreateCommand,
    CreateCommandOption, CreateInteractionResponse, CreateInteractionResponseMessage,
    EditInteractionResponse, EventHandler, Interaction, Message, Ready, UserId,
};
use serenity::async_trait;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info};

/// Definition of the `/tiktok` slash command.
#[must_use]
pub fn tiktok_command() -> CreateCommand {
    CreateCommand::new(COMMAND_NAME)
        .description(COMMAND_DESCRIPTION)
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                COMMAND_OPTION,
                COMMAND_OPTION_DESCRIPTION,
            )
            .required(true),
        )
}

/// Value of the `link` option of a command interaction.
fn link_option(command: &CommandInteraction) -> Option<&str> {
    command
        .data
        .options
        .iter()
        .find(|option| option.name == COMMAND_OPTION)
        .and_then(|option| option.value.as_str())
}

/// What to do with a chat message once its link has been resolved.
#[derive(Debug)]
pub enum MessageAction {
    /// Nothing is sent and the message stays
    Ignore,
    /// Send the reply, then delete the original message
    ReplaceWith(Reply),
}

/// Decides how to answer a chat message.
///
/// The bot's own messages are never resolved. Messages from other bots are.
pub async fn plan_message<A: TiktokApi + ?Sized>(
    api: &A,
    author: UserId,
    bot_user: UserId,
    content: &str,
) -> MessageAction {
    if author == bot_user {
        return MessageAction::Ignore;
    }

    let requester = author.to_string();
    match resolve(api, content, Some(requester.as_str()), Attachments::Include).await {
        Some(reply) => MessageAction::ReplaceWith(reply),
        None => MessageAction::Ignore,
    }
}

/// How a deferred slash command response is completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFollowup {
    /// Replace the "thinking" placeholder with this text
    Edit(String),
    /// Nothing to say; remove the placeholder
    Delete,
}

/// Resolves the `link` option of a slash command into its followup.
pub async fn plan_command<A: TiktokApi + ?Sized>(api: &A, link: &str) -> CommandFollowup {
    match resolve(api, link, None, Attachments::Omit).await {
        Some(reply) => CommandFollowup::Edit(reply.text_or_link().to_string()),
        None => CommandFollowup::Delete,
    }
}

/// Event handler holding the shared HTTP client and settings.
pub struct Handler {
    api: Arc<dyn TiktokApi>,
    settings: Arc<Settings>,
    command_id: Arc<OnceLock<CommandId>>,
}

impl Handler {
    /// Create a new handler.
    ///
    /// `command_id` is filled once the slash command is registered, so the
    /// shutdown path can deregister it.
    #[must_use]
    pub fn new(
        api: Arc<dyn TiktokApi>,
        settings: Arc<Settings>,
        command_id: Arc<OnceLock<CommandId>>,
    ) -> Self {
        Self {
            api,
            settings,
            command_id,
        }
    }

    async fn handle_message(&self, ctx: &Context, msg: &Message) {
        let bot_user = ctx.cache.current_user().id;
        let action = plan_message(self.api.as_ref(), msg.author.id, bot_user, &msg.content).await;
        let MessageAction::ReplaceWith(reply) = action else {
            return;
        };

        info!(channel_id = %msg.channel_id, "Detected a TikTok link in a message, replying to it");
        let builder = create_message(reply, self.settings.max_attachment_bytes).await;
        if let Err(e) = msg.channel_id.send_message(&ctx.http, builder).await {
            error!("Couldn't send message: {}", e);
        }

        if let Err(e) = msg.delete(&ctx.http).await {
            error!("Couldn't delete message: {}", e);
        }
    }

    async fn handle_command(&self, ctx: &Context, command: &CommandInteraction) {
        let Some(link) = link_option(command) else {
            debug!("Slash command without a link option");
            return;
        };

        // The interaction token expires after 3 seconds without an answer
        let defer = CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new());
        if let Err(e) = command.create_response(&ctx.http, defer).await {
            error!("Couldn't defer slash command: {}", e);
            return;
        }

        match plan_command(self.api.as_ref(), link).await {
            CommandFollowup::Edit(text) => {
                let edit = EditInteractionResponse::new().content(text);
                if let Err(e) = command.edit_response(&ctx.http, edit).await {
                    error!("Couldn't respond to slash command: {}", e);
                }
            }
            CommandFollowup::Delete => {
                if let Err(e) = command.delete_response(&ctx.http).await {
                    error!("Couldn't remove deferred response: {}", e);
                }
            }
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Logged in as {}", ready.user.name);

        info!("Adding command");
        match Command::create_global_command(&ctx.http, tiktok_command()).await {
            Ok(command) => {
                // Reconnects fire `ready` again with the same command id
                let _ = self.command_id.set(command.id);
            }
            Err(e) => {
                error!("Couldn't add command {}: {}", COMMAND_NAME, e);
                std::process::exit(1);
            }
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        self.handle_message(&ctx, &msg).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            if command.data.name == COMMAND_NAME {
                self.handle_command(&ctx, &command).await;
            }
        }
    }
}
