//! Session controller
//!
//! Owns the session state machine and drives the wallet connector, the
//! persisted node flag, the registrar and the heartbeat.
//!
//! ```text
//!             connect ok                 start_node ok
//!   Idle ──► Connecting ──► NodeInactive ◄──────────────► NodeActive
//!    ▲          │ fail           │         stop_node          │
//!    └──────────┴────────────────┴──── disconnect ────────────┘
//! ```
//!
//! Actions are serialized by an async action lock and re-check the state
//! once they hold it, so a duplicate request resolves to
//! `ActionOutcome::Ignored` instead of running twice. `disconnect` and
//! `stop_node` cancel the heartbeat before they wait for that lock.

use super::events::{HeartbeatReport, LogEvents, SessionEvents};
use super::heartbeat::HeartbeatTask;
use super::state::{NodeActivation, SessionState, SessionView, WalletSession};
use crate::config::SessionConfig;
use crate::device::DeviceInfoSource;
use crate::error::SessionError;
use crate::node::{now_millis, KeyValueStore, NodeRegistrar, PersistedFlagStore};
use crate::wallet::{
    Balance, ConnectionStatus, SwitchOutcome, WalletConnector, WalletProvider, WalletSnapshot,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// Result of a session action that did not fail
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionOutcome {
    /// The action ran and changed the session
    Applied,
    /// Not valid in the current state; nothing happened
    Ignored,
    /// The user dismissed the wallet prompt
    Cancelled,
}

#[derive(Debug, Default)]
struct SessionInner {
    state: SessionState,
    wallet: WalletSession,
    balance: Option<Balance>,
    activation: NodeActivation,
    heartbeat: Option<HeartbeatTask>,
    // Bumped on every heartbeat start/stop; ticks from an older generation are void
    generation: u64,
}

impl SessionInner {
    fn view(&self) -> SessionView {
        SessionView::build(self.state, &self.wallet, self.balance, &self.activation)
    }

    /// Cancel the live heartbeat, if any. Returns whether one was running.
    fn stop_heartbeat(&mut self) -> bool {
        self.generation += 1;
        self.activation.active = false;
        match self.heartbeat.take() {
            Some(task) => {
                task.cancel();
                true
            }
            None => false,
        }
    }

    /// Back to Idle with no wallet details
    fn reset(&mut self) -> bool {
        let stopped = self.stop_heartbeat();
        self.state = SessionState::Idle;
        self.wallet = WalletSession::default();
        self.balance = None;
        self.activation = NodeActivation::default();
        stopped
    }
}

fn lock_session(session: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything one heartbeat tick needs
struct HeartbeatContext<R, D> {
    generation: u64,
    session: Weak<Mutex<SessionInner>>,
    registrar: Arc<R>,
    devices: Arc<D>,
    events: Arc<dyn SessionEvents>,
}

impl<R, D> Clone for HeartbeatContext<R, D> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            session: self.session.clone(),
            registrar: self.registrar.clone(),
            devices: self.devices.clone(),
            events: self.events.clone(),
        }
    }
}

impl<R, D> HeartbeatContext<R, D>
where
    R: NodeRegistrar + Sync + 'static,
    D: DeviceInfoSource + Sync + 'static,
{
    /// Address to beat for, while this heartbeat is still the live one
    fn current_address(&self) -> Option<String> {
        let session = self.session.upgrade()?;
        let inner = lock_session(&session);
        if inner.generation != self.generation || !inner.state.is_node_active() {
            return None;
        }
        inner.wallet.address.clone()
    }

    async fn beat(self) {
        let Some(address) = self.current_address() else {
            log::debug!("Heartbeat skipped: node no longer active");
            return;
        };

        let device = self.devices.snapshot().await;
        let timestamp = now_millis();

        let report = match self.registrar.register(&address, &device, timestamp).await {
            Ok(receipt) => {
                log::debug!("Heartbeat accepted ({}) for {}", receipt.status, address);
                if let Some(session) = self.session.upgrade() {
                    let mut inner = lock_session(&session);
                    if inner.generation == self.generation {
                        inner.activation.last_heartbeat_at = Some(timestamp);
                    }
                }
                HeartbeatReport {
                    address,
                    timestamp,
                    status: Some(receipt.status),
                    error: None,
                }
            }
            Err(e) => {
                log::error!("Heartbeat failed: {}", e);
                let status = match &e {
                    SessionError::Registration { status, .. } => *status,
                    _ => None,
                };
                HeartbeatReport {
                    address,
                    timestamp,
                    status,
                    error: Some(e.to_string()),
                }
            }
        };

        self.events.on_heartbeat(&report);
    }
}

/// Wallet session and node activation state machine
pub struct SessionController<W, S, R, D> {
    wallet: WalletConnector<W>,
    flag: PersistedFlagStore<S>,
    registrar: Arc<R>,
    devices: Arc<D>,
    events: Arc<dyn SessionEvents>,
    heartbeat_interval: Duration,
    session: Arc<Mutex<SessionInner>>,
    actions: tokio::sync::Mutex<()>,
}

impl<W, S, R, D> SessionController<W, S, R, D>
where
    W: WalletProvider + Sync,
    S: KeyValueStore + Sync,
    R: NodeRegistrar + Sync + 'static,
    D: DeviceInfoSource + Sync + 'static,
{
    pub fn new(config: &SessionConfig, wallet: W, store: S, registrar: R, devices: D) -> Self {
        Self {
            wallet: WalletConnector::new(wallet),
            flag: PersistedFlagStore::new(store, config.node_flag_key.clone()),
            registrar: Arc::new(registrar),
            devices: Arc::new(devices),
            events: Arc::new(LogEvents),
            heartbeat_interval: config.heartbeat_interval(),
            session: Arc::new(Mutex::new(SessionInner::default())),
            actions: tokio::sync::Mutex::new(()),
        }
    }

    /// Replace the event sink
    pub fn with_events(mut self, events: Arc<dyn SessionEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &dyn SessionEvents {
        self.events.as_ref()
    }

    pub fn wallet(&self) -> &WalletConnector<W> {
        &self.wallet
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        lock_session(&self.session)
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn view(&self) -> SessionView {
        self.lock().view()
    }

    pub fn node_activation(&self) -> NodeActivation {
        self.lock().activation
    }

    pub fn balance(&self) -> Option<Balance> {
        self.lock().balance
    }

    /// Number of heartbeat schedulers alive (0 or 1)
    pub fn live_heartbeats(&self) -> usize {
        self.lock()
            .heartbeat
            .as_ref()
            .map_or(0, |task| usize::from(task.is_live()))
    }

    fn notify(&self) {
        let view = self.view();
        self.events.on_state_changed(&view);
    }

    /// Open a wallet session; on success query the balance and resume the
    /// node if it was active before
    pub async fn connect(&self) -> Result<ActionOutcome, SessionError> {
        let _action = self.actions.lock().await;
        {
            let mut inner = self.lock();
            if inner.state != SessionState::Idle {
                log::debug!("Connect ignored in state {}", inner.state.as_str());
                return Ok(ActionOutcome::Ignored);
            }
            inner.state = SessionState::Connecting;
            inner.wallet.connection_status = ConnectionStatus::Connecting;
        }
        self.notify();

        match self.wallet.connect().await {
            Ok(snapshot) => {
                self.enter_connected(&snapshot).await;
                Ok(ActionOutcome::Applied)
            }
            Err(e) => {
                log::error!("Connect failed: {}", e);
                self.lock().reset();
                self.notify();
                Err(e)
            }
        }
    }

    async fn enter_connected(&self, snapshot: &WalletSnapshot) {
        {
            let mut inner = self.lock();
            inner.wallet = WalletSession::from_snapshot(snapshot);
            inner.state = SessionState::ConnectedNodeInactive;
            inner.balance = None;
        }
        self.notify();

        self.update_balance().await;
        self.resume_node().await;
    }

    /// Re-enter NodeActive without a registration call when the persisted
    /// flag says the node was active
    async fn resume_node(&self) {
        match self.flag.read().await {
            Ok(true) => {
                let resumed = {
                    let mut inner = self.lock();
                    if inner.state == SessionState::ConnectedNodeInactive {
                        self.activate(&mut inner);
                        true
                    } else {
                        false
                    }
                };
                if resumed {
                    log::info!("Node was active before, resuming heartbeat");
                    self.notify();
                }
            }
            Ok(false) => {}
            Err(e) => log::error!("Failed to read node flag: {}", e),
        }
    }

    /// Enter NodeActive with a fresh heartbeat
    fn activate(&self, inner: &mut SessionInner) {
        inner.stop_heartbeat();

        let context = HeartbeatContext {
            generation: inner.generation,
            session: Arc::downgrade(&self.session),
            registrar: self.registrar.clone(),
            devices: self.devices.clone(),
            events: self.events.clone(),
        };
        inner.heartbeat = Some(HeartbeatTask::spawn(self.heartbeat_interval, move || {
            context.clone().beat()
        }));

        inner.state = SessionState::ConnectedNodeActive;
        inner.activation.active = true;
    }

    async fn update_balance(&self) -> Option<Balance> {
        let address = self.lock().wallet.address.clone();

        match self.wallet.query_balance(address.as_deref()).await {
            Ok(balance) => {
                let applied = {
                    let mut inner = self.lock();
                    let current = inner.state.is_connected() && inner.wallet.address == address;
                    if current {
                        inner.balance = Some(balance);
                    }
                    current
                };
                if !applied {
                    return None;
                }
                log::info!("Balance: {} ETH", balance);
                self.notify();
                Some(balance)
            }
            Err(e) => {
                log::error!("Failed to fetch balance: {}", e);
                self.lock().balance = None;
                self.notify();
                None
            }
        }
    }

    async fn clear_flag(&self) {
        if let Err(e) = self.flag.clear().await {
            log::error!("Failed to clear node flag: {}", e);
        }
    }

    /// Stop the heartbeat, forget wallet details, then end the wallet
    /// session. The session is Idle even when the wallet fails to terminate.
    pub async fn disconnect(&self) -> Result<ActionOutcome, SessionError> {
        // Heartbeat stops now, not when a pending action lets go of the lock
        let ended = self.end_session();
        let _action = self.actions.lock().await;
        if !(self.end_session() || ended) {
            log::debug!("Disconnect ignored in state {}", self.state().as_str());
            return Ok(ActionOutcome::Ignored);
        }

        self.clear_flag().await;
        self.wallet.disconnect().await?;
        Ok(ActionOutcome::Applied)
    }

    /// Drop the in-memory session if connected
    fn end_session(&self) -> bool {
        let stopped = {
            let mut inner = self.lock();
            if !inner.state.is_connected() {
                return false;
            }
            inner.reset()
        };
        if stopped {
            log::info!("Node heartbeat stopped");
        }
        self.notify();
        true
    }

    /// Register the device as a node and start the heartbeat. A failed
    /// registration leaves the node inactive.
    pub async fn start_node(&self) -> Result<ActionOutcome, SessionError> {
        let _action = self.actions.lock().await;
        let address = {
            let inner = self.lock();
            if inner.state != SessionState::ConnectedNodeInactive {
                log::debug!("Start node ignored in state {}", inner.state.as_str());
                return Ok(ActionOutcome::Ignored);
            }
            inner.wallet.address.clone()
        };
        let Some(address) = address else {
            return Err(SessionError::registration(None, "No wallet account"));
        };

        log::info!("Starting node for {}", address);
        let device = self.devices.snapshot().await;
        let timestamp = now_millis();

        let receipt = match self.registrar.register(&address, &device, timestamp).await {
            Ok(receipt) => receipt,
            Err(e) => {
                log::error!("Failed to start node: {}", e);
                return Err(e);
            }
        };
        log::info!("Node started ({}): {:?}", receipt.status, receipt.body);

        if let Err(e) = self.flag.write(true).await {
            log::error!("Failed to persist node flag: {}", e);
        }

        {
            let mut inner = self.lock();
            if inner.state != SessionState::ConnectedNodeInactive {
                log::warn!("Session changed while registering, node not started");
                return Ok(ActionOutcome::Ignored);
            }
            self.activate(&mut inner);
            inner.activation.last_heartbeat_at = Some(timestamp);
        }
        self.notify();
        Ok(ActionOutcome::Applied)
    }

    /// Cancel the heartbeat and clear the persisted flag
    pub async fn stop_node(&self) -> ActionOutcome {
        let stopped = self.deactivate_node();
        let _action = self.actions.lock().await;
        // A start that held the lock may have activated in the meantime
        if !(self.deactivate_node() || stopped) {
            log::debug!("Stop node ignored in state {}", self.state().as_str());
            return ActionOutcome::Ignored;
        }

        self.clear_flag().await;
        ActionOutcome::Applied
    }

    /// Cancel the heartbeat and mark the node inactive
    fn deactivate_node(&self) -> bool {
        {
            let mut inner = self.lock();
            if inner.state != SessionState::ConnectedNodeActive {
                return false;
            }
            inner.stop_heartbeat();
            inner.state = SessionState::ConnectedNodeInactive;
        }
        log::info!("Node stopped");
        self.notify();
        true
    }

    /// Let the user pick another account in the wallet
    pub async fn switch_account(&self) -> Result<ActionOutcome, SessionError> {
        let _action = self.actions.lock().await;
        if !self.state().is_connected() {
            return Ok(ActionOutcome::Ignored);
        }

        let accounts = match self.wallet.switch_account().await? {
            SwitchOutcome::Cancelled => return Ok(ActionOutcome::Cancelled),
            SwitchOutcome::Switched { accounts } => accounts,
        };
        let Some(account) = accounts.into_iter().next() else {
            log::warn!("Wallet returned no accounts after switch");
            return Ok(ActionOutcome::Applied);
        };
        let chain_id = self.wallet.snapshot().chain_id;

        {
            let mut inner = self.lock();
            if !inner.state.is_connected() {
                return Ok(ActionOutcome::Ignored);
            }
            if inner.wallet.address.as_deref() != Some(account.as_str()) {
                log::info!("Switched to account {}", account);
                inner.balance = None;
            }
            inner.wallet.address = Some(account);
            if chain_id.is_some() {
                inner.wallet.chain_id = chain_id;
            }
        }
        self.notify();

        self.update_balance().await;
        Ok(ActionOutcome::Applied)
    }

    /// Re-query the balance of the current account
    pub async fn refresh_balance(&self) -> Option<Balance> {
        let _action = self.actions.lock().await;
        if !self.state().is_connected() {
            return None;
        }
        self.update_balance().await
    }

    /// Follow a change reported by the wallet itself (restored session,
    /// account or chain change, session ended from the wallet side)
    pub async fn apply_wallet_snapshot(&self, snapshot: &WalletSnapshot) -> ActionOutcome {
        let _action = self.actions.lock().await;
        let state = self.state();

        if snapshot.is_usable() {
            if !state.is_connected() {
                log::info!("Wallet session restored");
                self.enter_connected(snapshot).await;
                return ActionOutcome::Applied;
            }

            let address_changed = {
                let mut inner = self.lock();
                let address_changed = inner.wallet.address != snapshot.account;
                if !address_changed && inner.wallet.chain_id == snapshot.chain_id {
                    return ActionOutcome::Ignored;
                }
                inner.wallet = WalletSession::from_snapshot(snapshot);
                if address_changed {
                    inner.balance = None;
                }
                address_changed
            };
            self.notify();

            if address_changed {
                self.update_balance().await;
                self.resume_node().await;
            }
            ActionOutcome::Applied
        } else if state.is_connected() && !snapshot.connecting {
            log::info!("Wallet session ended by the wallet");
            self.end_session();
            self.clear_flag().await;
            ActionOutcome::Applied
        } else {
            ActionOutcome::Ignored
        }
    }

    /// Teardown: cancel the heartbeat but keep the persisted flag so the
    /// next launch resumes the node
    pub fn shutdown(&self) {
        if self.lock().reset() {
            log::info!("Heartbeat cancelled on shutdown");
        }
        self.notify();
    }
}
