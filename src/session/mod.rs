//! Wallet session and node activation for Janction Mobile
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     session module                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  controller.rs - State machine, actions, recovery         │
//! │  heartbeat.rs  - Cancellable fixed-interval scheduler     │
//! │  commands.rs   - UI commands and notifications            │
//! │  events.rs     - Callback trait for UI updates            │
//! │  state.rs      - States, wallet session, display view     │
//! │  display.rs    - Network names, short address, balance    │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod controller;
pub mod display;
pub mod events;
pub mod heartbeat;
pub mod state;

pub use commands::{CommandResult, SessionCommands};
pub use controller::{ActionOutcome, SessionController};
pub use events::{HeartbeatReport, LogEvents, Notice, NoticeLevel, SessionEvents};
pub use heartbeat::HeartbeatTask;
pub use state::{NodeActivation, SessionState, SessionView, WalletSession};
