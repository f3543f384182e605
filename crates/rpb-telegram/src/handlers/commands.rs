use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, warn};

use rpb_core::{
    domain::ChatId,
    formatting::{escape_html, status_html, NO_CHANNELS_TEXT},
    transport::types::{InlineButton, InlineKeyboard},
};

use crate::router::AppState;

use super::{CB_RANDOM_POST, CB_UPDATE};

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// `/update` argument: empty means every channel.
fn parse_update_target(arg: &str) -> Result<Option<ChatId>, String> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Ok(None);
    }
    arg.parse::<i64>()
        .map(|id| Some(ChatId(id)))
        .map_err(|_| format!("Not a channel id: {arg}"))
}

pub(crate) fn menu_keyboard() -> InlineKeyboard {
    InlineKeyboard::single_row(vec![
        InlineButton::new("🎲 Random post", CB_RANDOM_POST),
        InlineButton::new("🔄 Update", CB_UPDATE),
    ])
}

async fn reply(state: &AppState, chat_id: ChatId, html: &str) {
    if let Err(e) = state.transport.send_html(chat_id, html).await {
        warn!(%chat_id, "failed to send reply: {e}");
    }
}

pub async fn handle_command(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = ChatId(msg.chat.id.0);
    let (cmd, arg) = parse_command(text);
    debug!(%chat_id, cmd = %cmd, "command received");

    match cmd.as_str() {
        "start" => {
            // Whoever opened the menu last receives refresh notices.
            state.operator.remember(chat_id).await;
            if let Err(e) = state
                .transport
                .send_inline_keyboard(chat_id, "Press a button to get a post!", menu_keyboard())
                .await
            {
                warn!(%chat_id, "failed to send menu: {e}");
            }
            Ok(())
        }

        "help" => {
            let body = "🎲 <b>Random channel post bot</b>\n\n\
Add me as an administrator to a channel and I will serve random posts from it.\n\n\
<b>Commands:</b>\n\
/start - Show the buttons\n\
/status - Cached posts per channel\n\
/update [channel_id] - Force a cache refresh\n\
/help - Show this message";
            reply(&state, chat_id, body).await;
            Ok(())
        }

        "status" => {
            let lines = state.scheduler.status_lines().await;
            let body = status_html(&lines, state.scheduler.interval());
            reply(&state, chat_id, &body).await;
            Ok(())
        }

        "update" => {
            let target = match parse_update_target(&arg) {
                Ok(t) => t,
                Err(e) => {
                    reply(&state, chat_id, &escape_html(&e)).await;
                    return Ok(());
                }
            };

            let started = state.scheduler.force_update(target).await;
            let body = match (target, started.len()) {
                (Some(id), 0) => format!("Channel <code>{id}</code> is not one of my channels."),
                (None, 0) => NO_CHANNELS_TEXT.to_string(),
                (_, n) => format!("🔄 Refresh started for {n} channel(s)."),
            };
            reply(&state, chat_id, &body).await;
            Ok(())
        }

        _ => {
            let msg = format!("Unknown command: /{}", escape_html(&cmd));
            reply(&state, chat_id, &msg).await;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_bot_suffix() {
        assert_eq!(
            parse_command("/Update@random_post_bot -100123"),
            ("update".to_string(), "-100123".to_string())
        );
        assert_eq!(parse_command("/start"), ("start".to_string(), String::new()));
    }

    #[test]
    fn update_target_parsing() {
        assert_eq!(parse_update_target(""), Ok(None));
        assert_eq!(parse_update_target(" -100123 "), Ok(Some(ChatId(-100123))));
        assert!(parse_update_target("memes").is_err());
    }

    #[test]
    fn menu_has_both_triggers() {
        let kb = menu_keyboard();
        let data: Vec<_> = kb.rows[0].iter().map(|b| b.callback_data.as_str()).collect();
        assert_eq!(data, vec![CB_RANDOM_POST, CB_UPDATE]);
    }
}
