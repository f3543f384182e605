use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    config::Config,
    domain::{ChatId, MessageId, MessageRef},
    transport::{port::ChannelTransport, types::InlineKeyboard},
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between forwards/copies (global; probes are the bulk of traffic).
    pub global_min_interval: Duration,
    /// Minimum spacing between sends per chat (Telegram 1 msg/sec style limits).
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

impl From<&Config> for ThrottleConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            global_min_interval: cfg.probe_min_interval,
            per_chat_min_interval: cfg.send_min_interval,
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// ChannelTransport decorator that spaces out outbound calls.
///
/// A full refresh issues one forward per message slot, so without spacing a
/// large channel would trip Telegram flood control within seconds.
pub struct ThrottledTransport {
    inner: Arc<dyn ChannelTransport>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_chat: Mutex<HashMap<i64, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledTransport {
    pub fn new(inner: Arc<dyn ChannelTransport>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_chat: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for_chat(&self, chat_id: i64) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_chat.lock().await;
        map.entry(chat_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_chat_min_interval,
                )))
            })
            .clone()
    }

    async fn throttle_chat(&self, chat_id: ChatId) {
        let wait = {
            let lim = self.limiter_for_chat(chat_id.0).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }

    async fn throttle_global(&self) {
        let wait = { self.global.lock().await.reserve() };
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl ChannelTransport for ThrottledTransport {
    async fn send_silent(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_silent(chat_id, text).await
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.throttle_chat(msg.chat_id).await;
        self.inner.delete_message(msg).await
    }

    async fn forward_to_self(&self, msg: MessageRef) -> Result<()> {
        self.throttle_global().await;
        self.inner.forward_to_self(msg).await
    }

    async fn copy_message(&self, to: ChatId, msg: MessageRef) -> Result<MessageId> {
        self.throttle_global().await;
        self.inner.copy_message(to, msg).await
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_html(chat_id, html).await
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_inline_keyboard(chat_id, html, keyboard).await
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        // No chat_id available here; apply global throttling only.
        self.throttle_global().await;
        self.inner.answer_callback_query(callback_id, text).await
    }
}
