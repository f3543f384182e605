use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{ChatMemberKind, ChatMemberUpdated},
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use rpb_core::{domain::ChatId, formatting::escape_html, refresher::RefreshReport};

use crate::router::AppState;

/// How the bot's own admin status in a channel changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AdminChange {
    Promoted,
    /// Admin before and after (permissions or title edited).
    Edited,
    Demoted,
    Unchanged,
}

fn admin_change(was_admin: bool, is_admin: bool) -> AdminChange {
    match (was_admin, is_admin) {
        (false, true) => AdminChange::Promoted,
        (true, true) => AdminChange::Edited,
        (true, false) => AdminChange::Demoted,
        (false, false) => AdminChange::Unchanged,
    }
}

fn is_admin(kind: &ChatMemberKind) -> bool {
    kind.is_owner() || kind.is_administrator()
}

/// The bot's own membership changed somewhere.
///
/// Becoming an administrator of a channel registers the channel and refreshes
/// it right away, even if it was configured or seen before.
pub async fn handle_my_chat_member(
    _bot: Bot,
    upd: ChatMemberUpdated,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let channel = ChatId(upd.chat.id.0);
    if !upd.chat.is_channel() {
        debug!(chat = %channel, "membership change outside a channel, ignoring");
        return Ok(());
    }

    let change = admin_change(
        is_admin(&upd.old_chat_member.kind),
        is_admin(&upd.new_chat_member.kind),
    );
    let title = upd.chat.title().map(|t| t.to_string());
    on_admin_change(&state, channel, title, change).await;

    Ok(())
}

async fn on_admin_change(
    state: &AppState,
    channel: ChatId,
    title: Option<String>,
    change: AdminChange,
) -> Option<JoinHandle<RefreshReport>> {
    match change {
        AdminChange::Promoted => {
            info!(%channel, title = title.as_deref().unwrap_or(""), "added as channel administrator");
            let label = title.clone().unwrap_or_else(|| channel.to_string());
            let refresh = state.scheduler.channel_added(channel, title).await;
            announce(state, &label).await;
            Some(refresh)
        }
        AdminChange::Edited => {
            debug!(%channel, "administrator rights edited");
            state.scheduler.channels().register(channel, title).await;
            None
        }
        AdminChange::Demoted => {
            warn!(%channel, "no longer an administrator, channel stays registered");
            None
        }
        AdminChange::Unchanged => {
            debug!(%channel, "not an administrator of channel, ignoring");
            None
        }
    }
}

async fn announce(state: &AppState, label: &str) {
    let Some(op) = state.operator.get().await else {
        return;
    };
    let html = format!(
        "➕ Added to channel <b>{}</b>, building its post cache...",
        escape_html(label)
    );
    if let Err(e) = state.transport.send_html(op, &html).await {
        warn!(chat = %op, "failed to announce new channel: {e}");
    }
}
