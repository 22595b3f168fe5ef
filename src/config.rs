//! Session configuration types and persistence
//!
//! Handles loading and saving the session configuration from disk.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Application folder under the platform config/data directories
pub const APP_DIR_NAME: &str = "Janction";

/// Path of the node registration endpoint, relative to the API base URL
pub const NODE_LINK_PATH: &str = "api/nodes/link";

/// Session configuration stored in session_config.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Base URL of the node registration backend
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Heartbeat period in milliseconds
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Timeout for registration and wallet RPC requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// JSON-RPC endpoint used by the headless wallet
    #[serde(default = "default_wallet_rpc_url")]
    pub wallet_rpc_url: String,

    /// dApp metadata shown by the wallet
    #[serde(default = "default_dapp_name")]
    pub dapp_name: String,

    #[serde(default = "default_dapp_url")]
    pub dapp_url: String,

    /// Storage key of the node-active flag
    #[serde(default = "default_node_flag_key")]
    pub node_flag_key: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_base_url() -> String {
    "http://localhost:8888".to_string()
}

fn default_heartbeat_interval_ms() -> u64 {
    5_000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_wallet_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_dapp_name() -> String {
    "Janction Mobile".to_string()
}

fn default_dapp_url() -> String {
    "https://janction.com".to_string()
}

fn default_node_flag_key() -> String {
    "nodeActive".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            wallet_rpc_url: default_wallet_rpc_url(),
            dapp_name: default_dapp_name(),
            dapp_url: default_dapp_url(),
            node_flag_key: default_node_flag_key(),
            log_level: default_log_level(),
        }
    }
}

impl SessionConfig {
    /// Directory holding the config and settings files
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    /// Get the path to the session config file
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("session_config.json")
    }

    /// Get the path to the key-value settings file
    pub fn settings_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Directory for log files
    pub fn log_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
            .join("logs")
    }

    /// Load config from disk, or return default if not found
    pub fn load() -> Self {
        let path = Self::config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable config at {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("Failed to create config dir: {}", e))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&path, contents).map_err(|e| format!("Failed to write config: {}", e))?;

        log::info!("Session config saved to {}", path.display());
        Ok(())
    }

    /// Heartbeat period (never zero)
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Full URL of the registration/heartbeat endpoint. A path on the base
    /// URL is kept as a prefix.
    pub fn registration_url(&self) -> Result<Url, String> {
        let mut base = Url::parse(&self.api_base_url)
            .map_err(|e| format!("Invalid API base URL '{}': {}", self.api_base_url, e))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(NODE_LINK_PATH)
            .map_err(|e| format!("Invalid registration URL: {}", e))
    }
}
