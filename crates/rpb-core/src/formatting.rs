//! Telegram HTML for notices and status replies.

use std::time::Duration;

use crate::{
    refresher::ChannelState,
    registry::AdminChannel,
    scheduler::{UpdateAction, UpdateOutcome},
};

pub const NO_CHANNELS_TEXT: &str =
    "I am not an administrator of any channel yet. Add me to a channel and try again.";

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn refresh_done_html(label: &str, count: usize, unknown: usize) -> String {
    let mut out = format!(
        "✅ Cache updated for <b>{}</b>: {count} posts",
        escape_html(label)
    );
    if unknown > 0 {
        out.push_str(&format!(" ({unknown} slots could not be checked)"));
    }
    out
}

pub fn refresh_failed_html(label: &str, error: &str) -> String {
    let mut err = error.to_string();
    if err.len() > 300 {
        err = format!("{}...", err.chars().take(300).collect::<String>());
    }
    format!(
        "❌ Cache refresh failed for <b>{}</b>\n\n<code>{}</code>",
        escape_html(label),
        escape_html(&err)
    )
}

/// One status line for a channel, e.g. `• <b>Memes</b>: 120 posts (updated 14:05)`.
pub fn channel_state_line(channel: &AdminChannel, state: &ChannelState) -> String {
    let label = escape_html(&channel.label());
    let detail = match state {
        ChannelState::NeverRefreshed => "not cached yet".to_string(),
        ChannelState::Refreshing { previous: None } => "refreshing...".to_string(),
        ChannelState::Refreshing {
            previous: Some(prev),
        } => format!("refreshing... ({} posts cached)", prev.count),
        ChannelState::Ready(info) => format!(
            "{} posts (updated {})",
            info.count,
            info.refreshed_at.format("%Y-%m-%d %H:%M")
        ),
    };
    format!("• <b>{label}</b>: {detail}")
}

pub fn status_html(lines: &[String], interval: Duration) -> String {
    if lines.is_empty() {
        return NO_CHANNELS_TEXT.to_string();
    }
    format!(
        "📊 <b>Channels ({})</b>\n{}\n\nAuto refresh every {}",
        lines.len(),
        lines.join("\n"),
        format_interval(interval)
    )
}

/// Reply to the update button: one line per admin channel.
pub fn update_outcomes_html(outcomes: &[UpdateOutcome]) -> String {
    if outcomes.is_empty() {
        return NO_CHANNELS_TEXT.to_string();
    }
    let lines: Vec<String> = outcomes
        .iter()
        .map(|o| {
            let label = escape_html(&o.channel.label());
            match &o.action {
                UpdateAction::Started => format!("🔄 <b>{label}</b>: cache update started"),
                UpdateAction::AlreadyRefreshing => {
                    format!("⏳ <b>{label}</b>: cache is being updated, try again later")
                }
                UpdateAction::Cached(info) => format!(
                    "✅ <b>{label}</b>: {} posts cached (updated {})",
                    info.count,
                    info.refreshed_at.format("%Y-%m-%d %H:%M")
                ),
            }
        })
        .collect();
    lines.join("\n")
}

pub fn format_interval(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    if hours > 0 && mins > 0 {
        return format!("{hours}h {mins}m");
    }
    if hours > 0 {
        return format!("{hours}h");
    }
    if mins > 0 {
        return format!("{mins}m");
    }
    format!("{secs}s")
}
