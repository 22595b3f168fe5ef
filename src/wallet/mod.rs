//! Wallet access for Janction Mobile
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    wallet module                         │
//! ├─────────────────────────────────────────────────────────┤
//! │  provider.rs   - Wallet capability trait and snapshot    │
//! │  connector.rs  - Connect, switch, balance operations     │
//! │  rpc.rs        - JSON-RPC capability (headless runner)   │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod connector;
pub mod provider;
pub mod rpc;

pub use connector::{Balance, SwitchOutcome, WalletConnector};
pub use provider::{ConnectionStatus, WalletProvider, WalletSnapshot};
pub use rpc::{DappMetadata, JsonRpcWallet};
