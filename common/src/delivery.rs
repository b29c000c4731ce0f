// Delivery sink: the chat transport used by the reminder engine

use crate::errors::DeliveryError;
use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::instrument;

/// Sends one text message to one chat. Exactly one attempt per call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError>;
}

/// Delivery through the Telegram Bot API
#[derive(Clone)]
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl DeliverySink for TelegramSink {
    #[instrument(skip(self, text))]
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::SendFailed {
                chat_id,
                reason: e.to_string(),
            })
    }
}
