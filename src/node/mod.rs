//! Node activation plumbing for Janction Mobile
//!
//! A device becomes a node by registering with the backend and then
//! repeating that registration as a heartbeat. This module holds the
//! backend client and the durable "node active" flag.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    node module                           │
//! ├─────────────────────────────────────────────────────────┤
//! │  registrar.rs  - POST /api/nodes/link (register + beat)  │
//! │  flag_store.rs - Persisted node-active flag              │
//! │  storage.rs    - Key-value persistence backends          │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod flag_store;
pub mod registrar;
pub mod storage;

pub use flag_store::PersistedFlagStore;
pub use registrar::{now_millis, HttpNodeRegistrar, NodeRegistrar, RegistrationReceipt};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
