//! Wallet capability seam
//!
//! The wallet SDK is an opaque RPC capability. Its reactive fields are
//! exposed as an immutable `WalletSnapshot` copied out on every read.

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Connection status of the wallet session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Point-in-time copy of the wallet's reactive fields
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletSnapshot {
    pub connected: bool,
    pub connecting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
}

impl WalletSnapshot {
    /// Snapshot of an established session
    pub fn connected(account: impl Into<String>, chain_id: impl Into<String>) -> Self {
        Self {
            connected: true,
            connecting: false,
            account: Some(account.into()),
            chain_id: Some(chain_id.into()),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ConnectionStatus {
        if self.connected {
            ConnectionStatus::Connected
        } else if self.connecting {
            ConnectionStatus::Connecting
        } else {
            ConnectionStatus::Disconnected
        }
    }

    /// Connected with a usable account
    pub fn is_usable(&self) -> bool {
        self.connected && self.account.as_deref().is_some_and(|a| !a.is_empty())
    }
}

/// Wallet capability (connect / terminate / generic request)
#[trait_variant::make(WalletProvider: Send)]
pub trait LocalWalletProvider {
    /// Ask the wallet for a session; may prompt the user
    async fn connect(&self) -> Result<WalletSnapshot, ProviderError>;

    /// End the wallet session
    async fn terminate(&self) -> Result<(), ProviderError>;

    /// Generic JSON-RPC style request (`eth_getBalance`, `eth_accounts`, ...)
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, ProviderError>;

    /// Current reactive fields
    fn snapshot(&self) -> WalletSnapshot;
}
