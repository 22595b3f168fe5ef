//! JSON-RPC wallet capability
//!
//! Headless stand-in for the mobile wallet SDK: talks to an Ethereum
//! JSON-RPC endpoint that manages accounts itself (a dev node or a signer
//! proxy). Used by the `janction-node` runner.

use super::provider::{WalletProvider, WalletSnapshot};
use crate::config::SessionConfig;
use crate::error::ProviderError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ORIGIN};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// RPC request structure
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

/// RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<ProviderError>,
}

/// Header carrying the dApp name to the wallet
const DAPP_NAME_HEADER: HeaderName = HeaderName::from_static("x-dapp-name");

/// How the app introduces itself to the wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DappMetadata {
    pub name: String,
    pub url: String,
}

impl DappMetadata {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            name: config.dapp_name.clone(),
            url: config.dapp_url.clone(),
        }
    }

    /// `Origin` and `X-Dapp-Name` headers sent with every wallet request
    fn headers(&self) -> Result<HeaderMap, String> {
        let origin = HeaderValue::from_str(&self.url)
            .map_err(|e| format!("Invalid dApp URL '{}': {}", self.url, e))?;
        let name = HeaderValue::from_str(&self.name)
            .map_err(|e| format!("Invalid dApp name '{}': {}", self.name, e))?;

        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, origin);
        headers.insert(DAPP_NAME_HEADER, name);
        Ok(headers)
    }
}

/// Wallet capability over HTTP JSON-RPC
pub struct JsonRpcWallet {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
    snapshot: Mutex<WalletSnapshot>,
}

impl JsonRpcWallet {
    /// Create a new wallet client for `url` that identifies as `dapp`
    pub fn new(url: impl Into<String>, timeout: Duration, dapp: &DappMetadata) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(dapp.headers()?)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
            snapshot: Mutex::new(WalletSnapshot::default()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn state(&self) -> MutexGuard<'_, WalletSnapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make an RPC call
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, ProviderError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::transport(format!("RPC request failed: {}", e)))?;

        let rpc_response: RpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::transport(format!("Failed to parse RPC response: {}", e)))?;

        if let Some(error) = rpc_response.error {
            return Err(error);
        }

        Ok(rpc_response.result)
    }

    /// Track the wallet's active account from an accounts result
    fn follow_accounts(&self, result: &Value) {
        if let Some(first) = result.get(0).and_then(Value::as_str) {
            let mut state = self.state();
            if state.connected && state.account.as_deref() != Some(first) {
                log::info!("Wallet account changed to {}", first);
                state.account = Some(first.to_string());
            }
        }
    }
}

impl WalletProvider for JsonRpcWallet {
    async fn connect(&self) -> Result<WalletSnapshot, ProviderError> {
        self.state().connecting = true;

        let accounts = match self.call("eth_requestAccounts", vec![]).await {
            Ok(accounts) => accounts,
            Err(e) => {
                self.state().connecting = false;
                return Err(e);
            }
        };

        let Some(account) = accounts.get(0).and_then(Value::as_str).map(str::to_string) else {
            self.state().connecting = false;
            return Err(ProviderError::new(None, "Wallet returned no accounts"));
        };

        let chain_id = match self.call("eth_chainId", vec![]).await {
            Ok(value) => value.as_str().map(str::to_string),
            Err(e) => {
                log::warn!("Failed to read chain id: {}", e);
                None
            }
        };

        let mut state = self.state();
        *state = WalletSnapshot {
            connected: true,
            connecting: false,
            account: Some(account),
            chain_id,
        };
        Ok(state.clone())
    }

    async fn terminate(&self) -> Result<(), ProviderError> {
        if self.state().connected {
            let revoke = self
                .call("wallet_revokePermissions", vec![json!({ "eth_accounts": {} })])
                .await;
            if let Err(e) = revoke {
                log::debug!("wallet_revokePermissions not honoured: {}", e);
            }
        }

        *self.state() = WalletSnapshot::default();
        Ok(())
    }

    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, ProviderError> {
        let result = self.call(method, params).await?;

        if method == "eth_accounts" || method == "eth_requestAccounts" {
            self.follow_accounts(&result);
        }

        Ok(result)
    }

    fn snapshot(&self) -> WalletSnapshot {
        self.state().clone()
    }
}
