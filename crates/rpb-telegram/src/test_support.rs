//! Recording transport and state builder for handler tests.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use rpb_core::{
    config::Config,
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    transport::{
        port::ChannelTransport,
        types::{InlineKeyboard, TransportErrorKind},
    },
    Result,
};

use crate::router::AppState;

/// Channel transport that serves a fixed boundary and a fixed set of existing
/// message ids, and records what the handlers send.
pub(crate) struct RecordingTransport {
    boundary: i32,
    existing: HashSet<i32>,
    fail_copy: AtomicBool,
    silent: Mutex<Vec<ChatId>>,
    copies: Mutex<Vec<(ChatId, MessageRef)>>,
    html: Mutex<Vec<(ChatId, String)>>,
}

impl RecordingTransport {
    pub(crate) fn new(boundary: i32, existing: &[i32]) -> Self {
        Self {
            boundary,
            existing: existing.iter().copied().collect(),
            fail_copy: AtomicBool::new(false),
            silent: Mutex::new(Vec::new()),
            copies: Mutex::new(Vec::new()),
            html: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fail_copy(&self, fail: bool) {
        self.fail_copy.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn silent_sends(&self) -> Vec<ChatId> {
        self.silent.lock().unwrap().clone()
    }

    pub(crate) fn copies(&self) -> Vec<(ChatId, MessageRef)> {
        self.copies.lock().unwrap().clone()
    }

    pub(crate) fn sent_html(&self) -> Vec<(ChatId, String)> {
        self.html.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelTransport for RecordingTransport {
    async fn send_silent(&self, chat_id: ChatId, _text: &str) -> Result<MessageRef> {
        self.silent.lock().unwrap().push(chat_id);
        Ok(MessageRef::new(chat_id, MessageId(self.boundary)))
    }

    async fn delete_message(&self, _msg: MessageRef) -> Result<()> {
        Ok(())
    }

    async fn forward_to_self(&self, msg: MessageRef) -> Result<()> {
        if self.existing.contains(&msg.message_id.0) {
            return Ok(());
        }
        Err(Error::transport(
            TransportErrorKind::SourceNotFound,
            "Bad Request: message to forward not found",
        ))
    }

    async fn copy_message(&self, to: ChatId, msg: MessageRef) -> Result<MessageId> {
        if self.fail_copy.load(Ordering::SeqCst) {
            return Err(Error::transport(
                TransportErrorKind::Other,
                "Forbidden: bot was blocked by the user",
            ));
        }
        self.copies.lock().unwrap().push((to, msg));
        Ok(MessageId(1000 + msg.message_id.0))
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.html.lock().unwrap().push((chat_id, html.to_string()));
        Ok(MessageRef::new(chat_id, MessageId(1)))
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        _keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        self.send_html(chat_id, html).await
    }

    async fn answer_callback_query(&self, _callback_id: &str, _text: Option<&str>) -> Result<()> {
        Ok(())
    }
}

pub(crate) fn test_config(channels: &[i64], operator: Option<i64>) -> Config {
    Config {
        telegram_bot_token: "123:test".to_string(),
        admin_channels: channels.to_vec(),
        operator_chat_id: operator,
        refresh_interval: Duration::from_secs(3600),
        refresh_on_start: false,
        boundary_probe_text: "probe".to_string(),
        probe_min_interval: Duration::ZERO,
        send_min_interval: Duration::ZERO,
    }
}

pub(crate) fn app_state(
    transport: Arc<RecordingTransport>,
    channels: &[i64],
    operator: Option<i64>,
) -> AppState {
    AppState::new(Arc::new(test_config(channels, operator)), transport)
}
