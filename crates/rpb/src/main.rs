use std::sync::Arc;

use rpb_core::config::Config;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), rpb_core::Error> {
    rpb_core::logging::init("rpb")?;

    let cfg = Arc::new(Config::load()?);
    info!(
        admin_channels = cfg.admin_channels.len(),
        refresh_interval_secs = cfg.refresh_interval.as_secs(),
        "configuration loaded"
    );

    rpb_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| rpb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
