use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    transport::types::InlineKeyboard,
    Result,
};

/// Everything the core needs from the chat transport.
///
/// Failures carry a [`crate::transport::types::TransportErrorKind`] via
/// [`crate::Error::Transport`] so callers can classify them.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Send a plain message without a notification sound.
    async fn send_silent(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    /// Forward `msg` to the bot's own identity.
    async fn forward_to_self(&self, msg: MessageRef) -> Result<()>;

    /// Copy `msg` into `to` without the "forwarded from" header.
    async fn copy_message(&self, to: ChatId, msg: MessageRef) -> Result<MessageId>;

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
