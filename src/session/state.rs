//! Session state types
//!
//! The state machine's states, the wallet session record, node activation
//! and the display-ready view handed to the UI.

use super::display::{format_balance, network_name, short_address};
use crate::wallet::{Balance, ConnectionStatus, WalletSnapshot};
use serde::{Deserialize, Serialize};

/// State of the session state machine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    ConnectedNodeInactive,
    ConnectedNodeActive,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::ConnectedNodeInactive | Self::ConnectedNodeActive)
    }

    pub fn is_node_active(&self) -> bool {
        *self == Self::ConnectedNodeActive
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::ConnectedNodeInactive => "connected-node-inactive",
            Self::ConnectedNodeActive => "connected-node-active",
        }
    }
}

/// Wallet session as seen by the controller
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletSession {
    pub address: Option<String>,
    pub chain_id: Option<String>,
    pub connection_status: ConnectionStatus,
}

impl WalletSession {
    pub fn from_snapshot(snapshot: &WalletSnapshot) -> Self {
        Self {
            address: snapshot.account.clone(),
            chain_id: snapshot.chain_id.clone(),
            connection_status: snapshot.status(),
        }
    }
}

/// Node activation; `active` is mirrored in the persisted flag
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeActivation {
    pub active: bool,
    /// Epoch milliseconds of the last accepted registration or heartbeat
    pub last_heartbeat_at: Option<u64>,
}

/// Display-ready snapshot of the session (sent to the UI)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub state: SessionState,
    pub connection_status: ConnectionStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_name: Option<String>,

    /// Raw balance in wei, decimal string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_wei: Option<String>,
    /// Ether balance, 4 decimals
    pub balance: String,

    pub node_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_heartbeat_at: Option<u64>,
}

impl SessionView {
    pub fn build(
        state: SessionState,
        wallet: &WalletSession,
        balance: Option<Balance>,
        activation: &NodeActivation,
    ) -> Self {
        // Balance is only meaningful while connected
        let balance = balance.filter(|_| state.is_connected());

        Self {
            state,
            connection_status: wallet.connection_status,
            address: wallet.address.clone(),
            short_address: wallet.address.as_deref().map(short_address),
            chain_id: wallet.chain_id.clone(),
            network_name: wallet.chain_id.as_deref().map(network_name),
            balance_wei: balance.map(|b| b.wei().to_string()),
            balance: format_balance(balance),
            node_active: activation.active,
            last_heartbeat_at: activation.last_heartbeat_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(!SessionState::Idle.is_connected());
        assert!(!SessionState::Connecting.is_connected());
        assert!(SessionState::ConnectedNodeInactive.is_connected());
        assert!(SessionState::ConnectedNodeActive.is_node_active());
        assert!(!SessionState::ConnectedNodeInactive.is_node_active());
    }

    #[test]
    fn test_view_of_connected_session() {
        let wallet = WalletSession::from_snapshot(&WalletSnapshot::connected(
            "0xABCD00000000000000000000000000000000001234",
            "0x1",
        ));
        let view = SessionView::build(
            SessionState::ConnectedNodeInactive,
            &wallet,
            Some(Balance(1_000_000_000_000_000_000)),
            &NodeActivation::default(),
        );

        assert_eq!(view.short_address.as_deref(), Some("0xABCD...1234"));
        assert_eq!(view.network_name.as_deref(), Some("Ethereum Mainnet"));
        assert_eq!(view.balance, "1.0000");
        assert_eq!(view.balance_wei.as_deref(), Some("1000000000000000000"));
        assert_eq!(view.connection_status, ConnectionStatus::Connected);
    }

    #[test]
    fn test_view_hides_balance_when_not_connected() {
        let view = SessionView::build(
            SessionState::Idle,
            &WalletSession::default(),
            Some(Balance(5)),
            &NodeActivation::default(),
        );
        assert_eq!(view.balance_wei, None);
        assert_eq!(view.balance, "0.0000");
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let view = SessionView::build(
            SessionState::ConnectedNodeActive,
            &WalletSession::default(),
            None,
            &NodeActivation {
                active: true,
                last_heartbeat_at: Some(10),
            },
        );
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["state"], "connectedNodeActive");
        assert_eq!(json["nodeActive"], true);
        assert_eq!(json["lastHeartbeatAt"], 10);
    }
}
