//! Outbound messaging with automatic retry.
//!
//! Telegram API flakiness must never take down a handler, so every send
//! goes through exponential backoff with jitter, and edit failures for
//! already-gone messages degrade to a log line.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId};
use thiserror::Error;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

const INITIAL_BACKOFF_MS: u64 = 250;
const MAX_BACKOFF_MS: u64 = 4_000;
const MAX_RETRIES: usize = 3;

const ERROR_NOT_MODIFIED: &str = "message is not modified";
const ERROR_NOT_FOUND: &str = "message to edit not found";

/// Outbound delivery failure after all retries were exhausted.
#[derive(Debug, Error)]
pub enum OutboundError {
    #[error("telegram api error: {0}")]
    Telegram(String),
}

/// Message-sending seam between the checkout flow and the Telegram API.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), OutboundError>;

    /// Send a message with an inline keyboard attached.
    async fn send_inline(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), OutboundError>;

    /// Remove the inline keyboard from an already-sent message.
    async fn clear_keyboard(&self, chat: ChatId, message: MessageId) -> Result<(), OutboundError>;
}

/// Production [`Messenger`] backed by a live bot.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

async fn with_retry<T, F, Fut>(operation: F) -> Result<T, OutboundError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, teloxide::RequestError>>,
{
    let strategy = ExponentialBackoff::from_millis(INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(MAX_BACKOFF_MS))
        .map(jitter)
        .take(MAX_RETRIES);

    Retry::spawn(strategy, operation).await.map_err(|e| {
        warn!("Telegram operation failed after {MAX_RETRIES} retries: {e}");
        OutboundError::Telegram(e.to_string())
    })
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), OutboundError> {
        with_retry(|| async {
            self.bot.send_message(chat, text.to_owned()).await?;
            Ok(())
        })
        .await
    }

    async fn send_inline(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), OutboundError> {
        with_retry(|| {
            let keyboard = keyboard.clone();
            async {
                self.bot
                    .send_message(chat, text.to_owned())
                    .reply_markup(keyboard)
                    .await?;
                Ok(())
            }
        })
        .await
    }

    async fn clear_keyboard(&self, chat: ChatId, message: MessageId) -> Result<(), OutboundError> {
        let result = with_retry(|| async {
            self.bot.edit_message_reply_markup(chat, message).await?;
            Ok(())
        })
        .await;

        // An already-cleared or deleted prompt is not worth failing over.
        if let Err(OutboundError::Telegram(ref reason)) = result
            && (reason.contains(ERROR_NOT_MODIFIED) || reason.contains(ERROR_NOT_FOUND))
        {
            debug!("keyboard removal skipped: {reason}");
            return Ok(());
        }
        result
    }
}
