//! Wallet connector
//!
//! Wraps connect, terminate, account switching and balance queries against
//! the wallet capability. Holds no persisted state.

use super::provider::{ConnectionStatus, WalletProvider, WalletSnapshot};
use crate::error::{ProviderError, SessionError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

const WEI_DECIMALS: u32 = 18;

/// Account balance in base units (wei)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Balance(pub u128);

impl Balance {
    pub const ZERO: Balance = Balance(0);

    /// Parse a JSON-RPC hex quantity ("0x1bc16d674ec80000")
    pub fn from_hex_quantity(quantity: &str) -> Result<Self, String> {
        let digits = quantity
            .strip_prefix("0x")
            .or_else(|| quantity.strip_prefix("0X"))
            .ok_or_else(|| format!("Balance is not a hex quantity: {}", quantity))?;

        if digits.is_empty() {
            return Ok(Self::ZERO);
        }

        u128::from_str_radix(digits, 16)
            .map(Balance)
            .map_err(|e| format!("Invalid balance '{}': {}", quantity, e))
    }

    pub fn wei(&self) -> u128 {
        self.0
    }

    /// Ether amount rounded to `decimals` places (max 18)
    pub fn format_ether(&self, decimals: u32) -> String {
        let decimals = decimals.min(WEI_DECIMALS);
        let scale = 10u128.pow(WEI_DECIMALS - decimals);
        let rounded = self.0.saturating_add(scale / 2) / scale;

        if decimals == 0 {
            return rounded.to_string();
        }

        let unit = 10u128.pow(decimals);
        format!(
            "{}.{:0width$}",
            rounded / unit,
            rounded % unit,
            width = decimals as usize
        )
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wei", self.0)
    }
}

/// Result of an account switch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Permissions were re-granted; the wallet now reports these accounts
    Switched { accounts: Vec<String> },
    /// The user dismissed the wallet prompt
    Cancelled,
}

/// Connector over a wallet capability
pub struct WalletConnector<W> {
    provider: W,
}

impl<W: WalletProvider> WalletConnector<W> {
    pub fn new(provider: W) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &W {
        &self.provider
    }

    /// Current reactive fields of the wallet
    pub fn snapshot(&self) -> WalletSnapshot {
        self.provider.snapshot()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.provider.snapshot().status()
    }

    /// Request a wallet session
    pub async fn connect(&self) -> Result<WalletSnapshot, SessionError> {
        log::info!("Requesting wallet connection...");

        let snapshot = self
            .provider
            .connect()
            .await
            .map_err(|e| SessionError::Connection(e.message))?;

        if !snapshot.is_usable() {
            return Err(SessionError::Connection(
                "Wallet did not return an account".to_string(),
            ));
        }

        log::info!(
            "Wallet connected: account={}, chain={}",
            snapshot.account.as_deref().unwrap_or_default(),
            snapshot.chain_id.as_deref().unwrap_or("unknown")
        );
        Ok(snapshot)
    }

    /// Terminate the wallet session (best-effort)
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        match self.provider.terminate().await {
            Ok(()) => {
                log::info!("Wallet session terminated");
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to terminate wallet session: {}", e);
                Err(SessionError::Connection(e.message))
            }
        }
    }

    /// Re-request account permissions, then re-read the account list.
    /// A user cancellation is reported as `SwitchOutcome::Cancelled`.
    pub async fn switch_account(&self) -> Result<SwitchOutcome, SessionError> {
        let permissions = self
            .provider
            .request("wallet_requestPermissions", vec![json!({ "eth_accounts": {} })])
            .await;

        if let Err(e) = permissions {
            return Self::switch_failure(e);
        }

        let accounts = match self.provider.request("eth_accounts", vec![]).await {
            Ok(value) => parse_accounts(&value).map_err(SessionError::Switch)?,
            Err(e) => return Self::switch_failure(e),
        };

        log::info!("Account switch returned {} account(s)", accounts.len());
        Ok(SwitchOutcome::Switched { accounts })
    }

    fn switch_failure(e: ProviderError) -> Result<SwitchOutcome, SessionError> {
        if e.is_user_rejection() {
            log::info!("Account switch cancelled by user");
            Ok(SwitchOutcome::Cancelled)
        } else {
            log::error!("Account switch failed: {}", e);
            Err(SessionError::Switch(e.message))
        }
    }

    /// Balance of `address` at the latest block
    pub async fn query_balance(&self, address: Option<&str>) -> Result<Balance, SessionError> {
        let address = address
            .filter(|a| !a.is_empty())
            .ok_or_else(|| SessionError::BalanceQuery("No account address".to_string()))?;

        let result = self
            .provider
            .request("eth_getBalance", vec![json!(address), json!("latest")])
            .await
            .map_err(|e| SessionError::BalanceQuery(e.message))?;

        let quantity = result
            .as_str()
            .ok_or_else(|| SessionError::BalanceQuery(format!("Unexpected balance result: {}", result)))?;

        Balance::from_hex_quantity(quantity).map_err(SessionError::BalanceQuery)
    }
}

/// Parse an `eth_accounts` result
fn parse_accounts(value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| format!("Unexpected account entry: {}", item))
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(format!("Unexpected eth_accounts result: {}", other)),
    }
}
