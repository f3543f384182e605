//! Telegram adapter (teloxide).
//!
//! This crate implements the `rpb-core` ChannelTransport over the Telegram Bot
//! API and wires the dispatcher to the core scheduler and selector.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode},
    ApiError, RequestError,
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

#[cfg(test)]
mod test_support;

use rpb_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    transport::{
        port::ChannelTransport,
        types::{InlineKeyboard, TransportErrorKind},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    /// The bot's own private chat; probes forward here.
    self_chat: teloxide::types::ChatId,
}

impl TelegramTransport {
    pub fn new(bot: Bot, bot_user_id: i64) -> Self {
        Self {
            bot,
            self_chat: teloxide::types::ChatId(bot_user_id),
        }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: RequestError) -> Error {
        Error::transport(classify(&e), format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

/// Map a teloxide error onto the core's structured kinds.
///
/// Telegram's wording for the bot-to-bot refusal has changed over time, so
/// unrecognized API errors are matched on their text as a last resort.
pub fn classify(e: &RequestError) -> TransportErrorKind {
    match e {
        RequestError::Api(ApiError::CantTalkWithBots) => TransportErrorKind::BotRecipient,
        RequestError::Api(ApiError::MessageToForwardNotFound) => {
            TransportErrorKind::SourceNotFound
        }
        RequestError::Api(ApiError::Unknown(text)) => classify_api_text(text),
        RequestError::RetryAfter(_) => TransportErrorKind::RateLimited,
        _ => TransportErrorKind::Other,
    }
}

fn classify_api_text(text: &str) -> TransportErrorKind {
    let lower = text.to_lowercase();
    if lower.contains("can't send messages to bots") {
        return TransportErrorKind::BotRecipient;
    }
    if lower.contains("message to forward not found") || lower.contains("message to copy not found")
    {
        return TransportErrorKind::SourceNotFound;
    }
    TransportErrorKind::Other
}

fn tg_keyboard(keyboard: InlineKeyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|b| InlineKeyboardButton::callback(b.label, b.callback_data))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl ChannelTransport for TelegramTransport {
    async fn send_silent(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
                    .disable_notification(true)
            })
            .await?;

        Ok(MessageRef::new(chat_id, MessageId(msg.id.0)))
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .delete_message(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
        })
        .await?;
        Ok(())
    }

    async fn forward_to_self(&self, msg: MessageRef) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .forward_message(
                    self.self_chat,
                    Self::tg_chat(msg.chat_id),
                    Self::tg_msg_id(msg.message_id),
                )
                .disable_notification(true)
        })
        .await?;
        Ok(())
    }

    async fn copy_message(&self, to: ChatId, msg: MessageRef) -> Result<MessageId> {
        let id = self
            .with_retry(|| {
                self.bot.copy_message(
                    Self::tg_chat(to),
                    Self::tg_chat(msg.chat_id),
                    Self::tg_msg_id(msg.message_id),
                )
            })
            .await?;
        Ok(MessageId(id.0))
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await?;

        Ok(MessageRef::new(chat_id, MessageId(msg.id.0)))
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        let markup = tg_keyboard(keyboard);

        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
                    .reply_markup(markup.clone())
            })
            .await?;

        Ok(MessageRef::new(chat_id, MessageId(msg.id.0)))
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }
}
