//! Full rebuild of one channel's cache entry.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tracing::{debug, info, warn};

use crate::{
    boundary::discover_boundary,
    cache::{ChannelCache, EntryInfo},
    domain::{ChatId, MessageId, MessageRef},
    formatting::{refresh_done_html, refresh_failed_html},
    probe::{probe, ProbeOutcome},
    registry::{AdminChannels, OperatorChat},
    transport::port::ChannelTransport,
};

/// Outcome of a single refresh run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshReport {
    pub channel: ChatId,
    pub boundary: Option<MessageId>,
    /// Messages confirmed to exist.
    pub count: usize,
    /// Slots whose probe result was ambiguous (excluded from the cache).
    pub unknown: usize,
    pub error: Option<String>,
}

impl RefreshReport {
    fn failed(channel: ChatId, error: String) -> Self {
        Self {
            channel,
            boundary: None,
            count: 0,
            unknown: 0,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Cache state of a channel as seen by status reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    NeverRefreshed,
    /// At least one refresh is running; `previous` is what readers see meanwhile.
    Refreshing { previous: Option<EntryInfo> },
    Ready(EntryInfo),
}

pub struct CacheRefresher {
    transport: Arc<dyn ChannelTransport>,
    cache: Arc<ChannelCache>,
    channels: Arc<AdminChannels>,
    operator: Arc<OperatorChat>,
    probe_text: String,
    in_flight: Arc<Mutex<HashMap<ChatId, usize>>>,
}

impl CacheRefresher {
    pub fn new(
        transport: Arc<dyn ChannelTransport>,
        cache: Arc<ChannelCache>,
        channels: Arc<AdminChannels>,
        operator: Arc<OperatorChat>,
        probe_text: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            cache,
            channels,
            operator,
            probe_text: probe_text.into(),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn cache(&self) -> &Arc<ChannelCache> {
        &self.cache
    }

    /// Rebuild the entry for `channel` and notify the operator chat.
    ///
    /// Never fails: errors end up in the report and the log. On boundary
    /// failure the previous entry is left untouched.
    pub async fn refresh(&self, channel: ChatId) -> RefreshReport {
        self.refresh_marked(self.mark_running(channel)).await
    }

    /// Same as [`refresh`](Self::refresh) for a channel already marked in
    /// flight. The mark is released once the cache entry is written.
    pub async fn refresh_marked(&self, running: RunningGuard) -> RefreshReport {
        let channel = running.channel;
        let report = self.rebuild(channel).await;
        drop(running);
        self.notify(&report).await;
        report
    }

    pub fn is_refreshing(&self, channel: ChatId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&channel)
            .is_some_and(|n| *n > 0)
    }

    pub async fn state(&self, channel: ChatId) -> ChannelState {
        let info = self.cache.info(channel).await;
        if self.is_refreshing(channel) {
            return ChannelState::Refreshing { previous: info };
        }
        match info {
            Some(info) => ChannelState::Ready(info),
            None => ChannelState::NeverRefreshed,
        }
    }

    async fn rebuild(&self, channel: ChatId) -> RefreshReport {
        info!(%channel, "refreshing message cache");

        let boundary =
            match discover_boundary(self.transport.as_ref(), channel, &self.probe_text).await {
                Ok(b) => b,
                Err(e) => {
                    warn!(%channel, "boundary discovery failed, keeping previous cache: {e}");
                    return RefreshReport::failed(channel, e.to_string());
                }
            };
        info!(%channel, %boundary, "probing message slots");

        let mut found = Vec::new();
        let mut unknown = 0usize;
        for n in 1..=boundary.0 {
            let id = MessageId(n);
            match probe(self.transport.as_ref(), MessageRef::new(channel, id)).await {
                ProbeOutcome::Exists => {
                    debug!(%channel, message = n, "message exists");
                    found.push(id);
                }
                ProbeOutcome::Absent => {
                    debug!(%channel, message = n, "message not found");
                }
                ProbeOutcome::Unknown(e) => {
                    unknown += 1;
                    warn!(%channel, message = n, "ambiguous probe result, skipping: {e}");
                }
            }
        }

        let count = found.len();
        self.cache.replace(channel, found).await;
        info!(%channel, count, unknown, "message cache updated");

        RefreshReport {
            channel,
            boundary: Some(boundary),
            count,
            unknown,
            error: None,
        }
    }

    async fn notify(&self, report: &RefreshReport) {
        let Some(chat) = self.operator.get().await else {
            debug!(channel = %report.channel, "no operator chat, skipping refresh notice");
            return;
        };

        let label = self
            .channels
            .get(report.channel)
            .await
            .map(|c| c.label())
            .unwrap_or_else(|| report.channel.to_string());
        let html = match &report.error {
            None => refresh_done_html(&label, report.count, report.unknown),
            Some(e) => refresh_failed_html(&label, e),
        };

        if let Err(e) = self.transport.send_html(chat, &html).await {
            warn!(%chat, "failed to deliver refresh notice: {e}");
        }
    }

    /// Count `channel` as refreshing until the returned guard is dropped.
    pub fn mark_running(&self, channel: ChatId) -> RunningGuard {
        *self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(channel)
            .or_insert(0) += 1;
        RunningGuard {
            in_flight: self.in_flight.clone(),
            channel,
        }
    }
}

/// In-flight mark of one refresh; see [`CacheRefresher::mark_running`].
pub struct RunningGuard {
    in_flight: Arc<Mutex<HashMap<ChatId, usize>>>,
    channel: ChatId,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        let mut map = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(n) = map.get_mut(&self.channel) {
            *n = n.saturating_sub(1);
            if *n == 0 {
                map.remove(&self.channel);
            }
        }
    }
}
