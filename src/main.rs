use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use log::info;

use nekomimi_link::config::AppConfig;
use nekomimi_link::core::bluetooth::BluestTransport;
use nekomimi_link::core::indicator::{Indicator, LogIndicator};
use nekomimi_link::logging;
use nekomimi_link::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(AppConfig::default_path);

    let config = AppConfig::load_config(&config_path).await?;
    logging::init(logging::level_from_name(config.log_level.as_deref()))?;
    info!("Using config {:?}", config_path);

    let transport = BluestTransport::new().await?;
    let indicator: Arc<dyn Indicator> = Arc::new(LogIndicator);
    let app_state = AppState::new(transport, config, Some(indicator));

    let tasks = app_state.start();
    tokio::signal::ctrl_c().await?;
    info!("Interrupted, shutting down");
    app_state.shutdown(tasks).await;
    Ok(())
}
