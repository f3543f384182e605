//! Hand-written transport fake shared by the unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicI32, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    transport::{
        port::ChannelTransport,
        types::{InlineKeyboard, TransportErrorKind},
    },
    Result,
};

/// Scripted transport.
///
/// Forwards of message ids without a scripted result fail with
/// `SourceNotFound`. `send_silent` hands out the configured boundary id.
pub(crate) struct FakeTransport {
    boundary: AtomicI32,
    fail_send_silent: AtomicBool,
    fail_delete: AtomicBool,
    fail_send_html: AtomicBool,
    forward_delay: Mutex<Duration>,
    forward_results: Mutex<HashMap<i32, std::result::Result<(), TransportErrorKind>>>,
    forwards: Mutex<Vec<MessageRef>>,
    deletes: Mutex<Vec<MessageRef>>,
    silent: Mutex<Vec<(ChatId, String)>>,
    html: Mutex<Vec<(ChatId, String)>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self {
            boundary: AtomicI32::new(1),
            fail_send_silent: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_send_html: AtomicBool::new(false),
            forward_delay: Mutex::new(Duration::ZERO),
            forward_results: Mutex::new(HashMap::new()),
            forwards: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            silent: Mutex::new(Vec::new()),
            html: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_boundary(self, id: i32) -> Self {
        self.set_boundary(id);
        self
    }

    pub(crate) fn with_forward(
        self,
        id: i32,
        result: std::result::Result<(), TransportErrorKind>,
    ) -> Self {
        self.set_forward(id, result);
        self
    }

    /// Mark `ids` as existing messages (plain successful forwards).
    pub(crate) fn with_existing(self, ids: &[i32]) -> Self {
        for id in ids {
            self.set_forward(*id, Ok(()));
        }
        self
    }

    pub(crate) fn with_forward_delay(self, delay: Duration) -> Self {
        *self.forward_delay.lock().unwrap() = delay;
        self
    }

    pub(crate) fn set_boundary(&self, id: i32) {
        self.boundary.store(id, Ordering::SeqCst);
    }

    pub(crate) fn set_forward(&self, id: i32, result: std::result::Result<(), TransportErrorKind>) {
        self.forward_results.lock().unwrap().insert(id, result);
    }

    pub(crate) fn fail_send_silent(&self, fail: bool) {
        self.fail_send_silent.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_send_html(&self, fail: bool) {
        self.fail_send_html.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn forwards(&self) -> Vec<MessageRef> {
        self.forwards.lock().unwrap().clone()
    }

    pub(crate) fn deletes(&self) -> Vec<MessageRef> {
        self.deletes.lock().unwrap().clone()
    }

    pub(crate) fn silent_sends(&self) -> Vec<(ChatId, String)> {
        self.silent.lock().unwrap().clone()
    }

    pub(crate) fn sent_html(&self) -> Vec<(ChatId, String)> {
        self.html.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelTransport for FakeTransport {
    async fn send_silent(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        if self.fail_send_silent.load(Ordering::SeqCst) {
            return Err(Error::transport(
                TransportErrorKind::Other,
                "Forbidden: bot is not a member of the channel chat",
            ));
        }
        self.silent.lock().unwrap().push((chat_id, text.to_string()));
        let id = self.boundary.load(Ordering::SeqCst);
        Ok(MessageRef::new(chat_id, MessageId(id)))
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Error::transport(
                TransportErrorKind::Other,
                "Bad Request: message can't be deleted",
            ));
        }
        self.deletes.lock().unwrap().push(msg);
        Ok(())
    }

    async fn forward_to_self(&self, msg: MessageRef) -> Result<()> {
        let delay = *self.forward_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.forwards.lock().unwrap().push(msg);
        let scripted = self
            .forward_results
            .lock()
            .unwrap()
            .get(&msg.message_id.0)
            .copied()
            .unwrap_or(Err(TransportErrorKind::SourceNotFound));
        scripted.map_err(|kind| Error::transport(kind, format!("forward {}", msg.message_id)))
    }

    async fn copy_message(&self, _to: ChatId, msg: MessageRef) -> Result<MessageId> {
        Ok(msg.message_id)
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        if self.fail_send_html.load(Ordering::SeqCst) {
            return Err(Error::transport(
                TransportErrorKind::Other,
                "Forbidden: bot was blocked by the user",
            ));
        }
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
