// Telegram transport: long-polls updates and routes commands through the gate

use common::commands::{CommandHandler, CommandInvocation, Reply, ReplyFormat};
use common::gate::{CommandGate, GateDecision};
use common::models::ChatKind;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, warn};

/// Shared handles given to every update handler
pub struct BotState {
    /// This bot's username, used to skip commands meant for other bots
    username: String,
    gate: CommandGate,
    handler: CommandHandler,
}

impl BotState {
    pub fn new(username: String, gate: CommandGate, handler: CommandHandler) -> Self {
        Self {
            username,
            gate,
            handler,
        }
    }
}

/// Run the update dispatcher until Ctrl+C.
///
/// teloxide handles updates from different chats concurrently and keeps
/// updates from one chat in order.
pub async fn run_dispatcher(bot: Bot, state: Arc<BotState>) {
    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(invocation) = CommandInvocation::parse(text, &state.username) else {
        return Ok(());
    };
    let Some(kind) = invocation.kind() else {
        debug!(command = %invocation.name, "Ignoring unknown command");
        return Ok(());
    };

    let chat_id = msg.chat.id.0;
    let chat_kind = if matches!(msg.chat.kind, teloxide::types::ChatKind::Private(_)) {
        ChatKind::Private
    } else {
        ChatKind::Group
    };

    let reply = match state.gate.check(chat_kind, chat_id, kind.as_str()).await {
        GateDecision::Allow => state.handler.handle(chat_id, kind, &invocation.args).await,
        GateDecision::Deny { notice } => Reply::plain(notice),
    };

    let request = bot.send_message(msg.chat.id, reply.text);
    let sent = match reply.format {
        ReplyFormat::Html => request.parse_mode(ParseMode::Html).await,
        ReplyFormat::Plain => request.await,
    };

    // A failed reply is not retried; the user can simply re-issue the command
    if let Err(e) = sent {
        warn!(chat_id, command = %kind, error = %e, "Failed to send command reply");
    }
    Ok(())
}
