//! Telegram update handlers.
//!
//! - private-chat commands (`/start`, `/status`, `/update`, `/help`)
//! - inline-button callbacks (`random_post`, `update`)
//! - `my_chat_member` updates announcing the bot became a channel admin

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, ChatMemberUpdated, Message},
};
use tracing::warn;

use rpb_core::domain::ChatId;

use crate::router::AppState;
mod callback;
mod commands;
mod membership;

/// Callback data of the "random post" button.
pub const CB_RANDOM_POST: &str = "random_post";
/// Callback data of the "update" button.
pub const CB_UPDATE: &str = "update";

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_my_chat_member(
    bot: Bot,
    upd: ChatMemberUpdated,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    membership::handle_my_chat_member(bot, upd, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Channel posts and group chatter are not for us.
    if !msg.chat.is_private() {
        return Ok(());
    }

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(bot, msg, state).await;
        }
    }

    let chat_id = ChatId(msg.chat.id.0);
    if let Err(e) = state
        .transport
        .send_html(chat_id, "Send /start to get the menu.")
        .await
    {
        warn!(%chat_id, "failed to send menu hint: {e}");
    }

    Ok(())
}
