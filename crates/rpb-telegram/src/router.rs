use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::info;

use rpb_core::{
    cache::ChannelCache,
    config::Config,
    domain::ChatId,
    refresher::CacheRefresher,
    registry::{AdminChannels, OperatorChat},
    scheduler::RefreshScheduler,
    selector::PostSelector,
    transport::{
        port::ChannelTransport,
        throttled::{ThrottleConfig, ThrottledTransport},
    },
};

use crate::handlers;
use crate::TelegramTransport;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub transport: Arc<dyn ChannelTransport>,
    pub scheduler: RefreshScheduler,
    pub selector: Arc<PostSelector>,
    pub operator: Arc<OperatorChat>,
}

impl AppState {
    /// Wire cache, registry, refresher, scheduler and selector around
    /// `transport`. The scheduler is not started.
    pub fn new(cfg: Arc<Config>, transport: Arc<dyn ChannelTransport>) -> Self {
        let cache = Arc::new(ChannelCache::new());
        let channels = Arc::new(AdminChannels::with_ids(&cfg.admin_channels));
        let operator = Arc::new(OperatorChat::new(cfg.operator_chat_id.map(ChatId)));

        let refresher = Arc::new(CacheRefresher::new(
            transport.clone(),
            cache.clone(),
            channels.clone(),
            operator.clone(),
            cfg.boundary_probe_text.clone(),
        ));
        let scheduler = RefreshScheduler::new(refresher, channels.clone(), cfg.refresh_interval);
        let selector = Arc::new(PostSelector::new(channels, cache));

        Self {
            cfg,
            transport,
            scheduler,
            selector,
            operator,
        }
    }
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Probes forward to the bot itself, so we need our own id up front.
    let me = bot.get_me().await?;
    info!(username = %me.username(), "bot started");

    // Wrap the raw transport with a throttling decorator: a refresh issues one
    // forward per message slot. RetryAfter is still retried in the adapter.
    let raw: Arc<dyn ChannelTransport> =
        Arc::new(TelegramTransport::new(bot.clone(), me.id.0 as i64));
    let transport: Arc<dyn ChannelTransport> = Arc::new(ThrottledTransport::new(
        raw,
        ThrottleConfig::from(cfg.as_ref()),
    ));

    let state = Arc::new(AppState::new(cfg.clone(), transport));
    let scheduler = state.scheduler.clone();

    info!(
        channels = cfg.admin_channels.len(),
        refresh_on_start = cfg.refresh_on_start,
        "starting refresh scheduler"
    );
    scheduler.start(cfg.refresh_on_start).await;

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_my_chat_member().endpoint(handlers::handle_my_chat_member))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|_| async {})
        .build()
        .dispatch()
        .await;

    info!("dispatcher stopped, shutting down scheduler");
    scheduler.stop().await;

    Ok(())
}
