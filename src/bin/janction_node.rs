//! Janction node runner
//!
//! Headless binary that connects to a JSON-RPC wallet, activates the node
//! and sends heartbeats until interrupted. Settings come from
//! `session_config.json` in the Janction config directory.

use janction_mobile_lib::logging::{init_logger, parse_level};
use janction_mobile_lib::SessionConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = SessionConfig::load();
    let _logger = init_logger(SessionConfig::log_dir(), parse_level(&config.log_level))?;

    log::info!(
        "Janction node v{} starting (interval {:?})",
        env!("CARGO_PKG_VERSION"),
        config.heartbeat_interval()
    );

    if let Err(e) = janction_mobile_lib::run_node(config).await {
        log::error!("Janction node stopped: {:#}", e);
        return Err(e);
    }
    Ok(())
}
