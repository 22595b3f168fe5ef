//! Janction Mobile core
//!
//! Wallet session and node activation logic behind the mobile app: connect
//! a wallet, show its details, register the device as a Janction node and
//! keep it alive with a periodic heartbeat.

pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod node;
pub mod session;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use config::SessionConfig;
pub use error::{ProviderError, SessionError};
pub use session::{ActionOutcome, SessionController, SessionEvents, SessionState, SessionView};

use device::{ScreenInfo, SystemDeviceInfo};
use node::{FileKeyValueStore, HttpNodeRegistrar};
use wallet::{DappMetadata, JsonRpcWallet};

/// Session controller wired to the production capabilities
pub type NodeSession = SessionController<JsonRpcWallet, FileKeyValueStore, HttpNodeRegistrar, SystemDeviceInfo>;

/// Build a session controller from the config
pub fn create_session(config: &SessionConfig) -> anyhow::Result<NodeSession> {
    let wallet = JsonRpcWallet::new(
        config.wallet_rpc_url.clone(),
        config.request_timeout(),
        &DappMetadata::from_config(config),
    )
    .map_err(anyhow::Error::msg)?;
    let store = FileKeyValueStore::new(SessionConfig::settings_path());
    let registrar = HttpNodeRegistrar::from_config(config).map_err(anyhow::Error::msg)?;
    let devices = SystemDeviceInfo::new(ScreenInfo::default());

    log::info!(
        "Session created: wallet={}, backend={}",
        wallet.url(),
        registrar.endpoint()
    );
    Ok(SessionController::new(config, wallet, store, registrar, devices))
}

/// Connect, make sure the node is running and keep it alive until Ctrl+C
pub async fn run_node(config: SessionConfig) -> anyhow::Result<()> {
    let session = create_session(&config)?;
    let commands = session.commands();

    let result = commands.connect_wallet().await;
    if let Some(error) = result.error {
        anyhow::bail!(error);
    }

    if !session.state().is_node_active() {
        let result = commands.start_node().await;
        if let Some(error) = result.error {
            commands.disconnect_wallet().await;
            anyhow::bail!(error);
        }
    }

    let view = session.view();
    log::info!(
        "Node active for {} on {} (balance {} ETH)",
        view.short_address.as_deref().unwrap_or("-"),
        view.network_name.as_deref().unwrap_or("unknown network"),
        view.balance
    );

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    session.shutdown();
    Ok(())
}
