//! Periodic and on-demand cache refreshes.
//!
//! - every admin channel is refreshed once per interval
//! - `trigger_now` starts an out-of-band refresh (new channel, update button)
//! - each refresh is its own task; refreshes of one channel are not serialized,
//!   so the last `replace` to land wins

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    cache::EntryInfo,
    domain::ChatId,
    formatting::channel_state_line,
    refresher::{CacheRefresher, ChannelState, RefreshReport},
    registry::{AdminChannel, AdminChannels},
};

/// What an update request did for one channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateAction {
    Started,
    AlreadyRefreshing,
    /// Cache is populated; reported instead of refreshed.
    Cached(EntryInfo),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub channel: AdminChannel,
    pub action: UpdateAction,
}

#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    refresher: Arc<CacheRefresher>,
    channels: Arc<AdminChannels>,
    interval: Duration,
    state: tokio::sync::Mutex<SchedulerState>,
}

#[derive(Default)]
struct SchedulerState {
    ticker: Option<JoinHandle<()>>,
    ticker_cancel: Option<CancellationToken>,
}

impl RefreshScheduler {
    pub fn new(
        refresher: Arc<CacheRefresher>,
        channels: Arc<AdminChannels>,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                refresher,
                channels,
                interval,
                state: tokio::sync::Mutex::new(SchedulerState::default()),
            }),
        }
    }

    pub fn refresher(&self) -> &Arc<CacheRefresher> {
        &self.inner.refresher
    }

    pub fn channels(&self) -> &Arc<AdminChannels> {
        &self.inner.channels
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Start the periodic ticker (first tick one interval from now).
    ///
    /// With `refresh_now`, every known channel is also refreshed immediately.
    /// Calling this while the ticker runs only does the immediate refresh.
    pub async fn start(&self, refresh_now: bool) {
        {
            let mut st = self.inner.state.lock().await;
            if st.ticker.is_none() {
                let tok = CancellationToken::new();
                st.ticker_cancel = Some(tok.clone());
                let scheduler = self.clone();
                st.ticker = Some(tokio::spawn(async move {
                    scheduler.tick_loop(tok).await;
                }));
                info!(
                    interval_secs = self.inner.interval.as_secs(),
                    "refresh ticker started"
                );
            }
        }

        if refresh_now {
            let started = self.trigger_all().await.len();
            info!(channels = started, "initial refresh started");
        }
    }

    pub async fn stop(&self) {
        let mut st = self.inner.state.lock().await;
        if let Some(tok) = st.ticker_cancel.take() {
            tok.cancel();
        }
        st.ticker.take(); // let the task exit on cancellation
    }

    /// Refresh `channel` in a new task, outside the ticker cadence.
    ///
    /// The channel reads as refreshing from the moment this returns.
    pub fn trigger_now(&self, channel: ChatId) -> JoinHandle<RefreshReport> {
        let refresher = self.inner.refresher.clone();
        let running = refresher.mark_running(channel);
        tokio::spawn(async move { refresher.refresh_marked(running).await })
    }

    /// Refresh every admin channel, each in its own task.
    pub async fn trigger_all(&self) -> Vec<JoinHandle<RefreshReport>> {
        self.inner
            .channels
            .ids()
            .await
            .into_iter()
            .map(|ch| self.trigger_now(ch))
            .collect()
    }

    /// The bot just became an administrator of `channel`: register it and
    /// refresh it right away, whether or not it was known before.
    pub async fn channel_added(
        &self,
        channel: ChatId,
        title: Option<String>,
    ) -> JoinHandle<RefreshReport> {
        if self.inner.channels.register(channel, title).await {
            info!(%channel, "new admin channel registered");
        } else {
            debug!(%channel, "admin rights regained on a known channel");
        }
        self.trigger_now(channel)
    }

    /// Handle an "update" request for every admin channel.
    ///
    /// Running refreshes are reported as such, empty or never-filled caches
    /// are refreshed, populated ones only report their size.
    pub async fn request_update(&self) -> Vec<UpdateOutcome> {
        let mut out = Vec::new();
        for channel in self.inner.channels.snapshot().await {
            let action = match self.inner.refresher.state(channel.id).await {
                ChannelState::Refreshing { .. } => UpdateAction::AlreadyRefreshing,
                ChannelState::Ready(info) if info.count > 0 => UpdateAction::Cached(info),
                ChannelState::Ready(_) | ChannelState::NeverRefreshed => {
                    self.trigger_now(channel.id);
                    UpdateAction::Started
                }
            };
            out.push(UpdateOutcome { channel, action });
        }
        out
    }

    /// Force a refresh of one admin channel, or of all of them.
    ///
    /// Returns the channels a refresh was started for; an unknown channel id
    /// starts nothing.
    pub async fn force_update(&self, channel: Option<ChatId>) -> Vec<ChatId> {
        match channel {
            Some(id) => {
                if !self.inner.channels.contains(id).await {
                    return Vec::new();
                }
                self.trigger_now(id);
                vec![id]
            }
            None => {
                let ids = self.inner.channels.ids().await;
                for id in &ids {
                    self.trigger_now(*id);
                }
                ids
            }
        }
    }

    /// One formatted status line per admin channel.
    pub async fn status_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for channel in self.inner.channels.snapshot().await {
            let state = self.inner.refresher.state(channel.id).await;
            lines.push(channel_state_line(&channel, &state));
        }
        lines
    }

    async fn tick_loop(&self, cancel: CancellationToken) {
        let period = self.inner.interval;
        let mut tick = interval_at(Instant::now() + period, period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
              _ = cancel.cancelled() => break,
              _ = tick.tick() => {
                let started = self.trigger_all().await.len();
                info!(channels = started, "scheduled refresh started");
              }
            }
        }
        debug!("refresh ticker stopped");
    }
}
