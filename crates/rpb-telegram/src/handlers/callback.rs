use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};

use rpb_core::{
    domain::{ChatId, UserId},
    formatting::{update_outcomes_html, NO_CHANNELS_TEXT},
    selector::Selection,
};

use crate::router::AppState;

use super::{CB_RANDOM_POST, CB_UPDATE};

const NO_POSTS_TEXT: &str = "No posts available for the picked channel yet. Try again later.";
const COPY_FAILED_TEXT: &str = "Could not send the post. Please try again.";

pub async fn handle_callback(
    _bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let cb_id = q.id.clone();
    let requester = UserId(q.from.id.0 as i64);
    // Reply where the button was pressed; fall back to the user's private chat.
    let chat_id = q
        .message
        .as_ref()
        .map(|m| ChatId(m.chat.id.0))
        .unwrap_or_else(|| ChatId::from(requester));
    let data = q.data.clone().unwrap_or_default();

    // Always answer the callback so the button stops spinning.
    let _ = state.transport.answer_callback_query(&cb_id, None).await;

    let reply = match data.as_str() {
        CB_RANDOM_POST => random_post(&state, requester).await,
        CB_UPDATE => {
            let outcomes = state.scheduler.request_update().await;
            Some(update_outcomes_html(&outcomes))
        }
        _ => None,
    };

    if let Some(html) = reply {
        if let Err(e) = state.transport.send_html(chat_id, &html).await {
            warn!(%chat_id, "failed to answer button press: {e}");
        }
    }

    Ok(())
}

/// Copy a random cached post to the requester. Returns a reply if the post
/// could not be delivered.
async fn random_post(state: &AppState, requester: UserId) -> Option<String> {
    match state.selector.select_random_post().await {
        Selection::NoChannelsAvailable => Some(NO_CHANNELS_TEXT.to_string()),
        Selection::NoMessagesAvailable(channel) => {
            info!(%channel, "random post requested but channel has no cached posts");
            Some(NO_POSTS_TEXT.to_string())
        }
        Selection::Post(post) => {
            match state
                .transport
                .copy_message(ChatId::from(requester), post)
                .await
            {
                Ok(copied) => {
                    info!(
                        channel = %post.chat_id,
                        message = %post.message_id,
                        copied = %copied,
                        "random post delivered"
                    );
                    None
                }
                Err(e) => {
                    warn!(
                        channel = %post.chat_id,
                        message = %post.message_id,
                        "failed to copy post: {e}"
                    );
                    Some(COPY_FAILED_TEXT.to_string())
                }
            }
        }
    }
}
