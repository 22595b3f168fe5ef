//! UI-facing session commands
//!
//! Thin wrappers over `SessionController` that turn outcomes into
//! `CommandResult`s and raise the user notifications for each action.

use super::controller::{ActionOutcome, SessionController};
use super::events::Notice;
use super::state::SessionView;
use crate::device::DeviceInfoSource;
use crate::error::SessionError;
use crate::node::{KeyValueStore, NodeRegistrar};
use crate::wallet::WalletProvider;
use serde::Serialize;

/// Command result wrapper
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Command surface of a session controller
///
/// Borrowed from the controller via `SessionController::commands`.
pub struct SessionCommands<'a, W, S, R, D> {
    session: &'a SessionController<W, S, R, D>,
}

impl<W, S, R, D> SessionController<W, S, R, D>
where
    W: WalletProvider + Sync,
    S: KeyValueStore + Sync,
    R: NodeRegistrar + Sync + 'static,
    D: DeviceInfoSource + Sync + 'static,
{
    /// UI commands over this controller
    pub fn commands(&self) -> SessionCommands<'_, W, S, R, D> {
        SessionCommands { session: self }
    }
}

impl<W, S, R, D> SessionCommands<'_, W, S, R, D>
where
    W: WalletProvider + Sync,
    S: KeyValueStore + Sync,
    R: NodeRegistrar + Sync + 'static,
    D: DeviceInfoSource + Sync + 'static,
{
    /// Report a failed action: notice for user-facing errors, error result
    fn fail(&self, error: SessionError) -> CommandResult<SessionView> {
        if error.is_user_facing() {
            self.session.events().on_notice(&Notice::from_error(&error));
        }
        CommandResult::err(error.to_string())
    }

    /// Success notice plus the current view for applied actions
    fn finish(&self, outcome: ActionOutcome, title: &str, message: &str) -> CommandResult<SessionView> {
        if outcome == ActionOutcome::Applied {
            self.session.events().on_notice(&Notice::success(title, message));
        }
        CommandResult::ok(self.session.view())
    }

    // ========================================================================
    // Wallet Commands
    // ========================================================================

    /// Open the wallet connection prompt
    pub async fn connect_wallet(&self) -> CommandResult<SessionView> {
        match self.session.connect().await {
            Ok(_) => CommandResult::ok(self.session.view()),
            Err(e) => self.fail(e),
        }
    }

    /// End the wallet session
    pub async fn disconnect_wallet(&self) -> CommandResult<SessionView> {
        match self.session.disconnect().await {
            Ok(outcome) => self.finish(outcome, "Disconnected", "Wallet disconnected"),
            Err(e) => self.fail(e),
        }
    }

    /// Pick another wallet account
    pub async fn switch_account(&self) -> CommandResult<SessionView> {
        match self.session.switch_account().await {
            Ok(outcome) => self.finish(outcome, "Account switched", "Wallet account switched"),
            Err(e) => self.fail(e),
        }
    }

    /// Re-query the wallet balance
    pub async fn refresh_balance(&self) -> CommandResult<SessionView> {
        if self.session.refresh_balance().await.is_some() {
            self.session
                .events()
                .on_notice(&Notice::success("Refreshed", "Balance updated"));
        }
        CommandResult::ok(self.session.view())
    }

    /// Current display state
    pub fn get_session(&self) -> CommandResult<SessionView> {
        CommandResult::ok(self.session.view())
    }

    // ========================================================================
    // Node Commands
    // ========================================================================

    /// Register this device as a node and start the heartbeat
    pub async fn start_node(&self) -> CommandResult<SessionView> {
        match self.session.start_node().await {
            Ok(outcome) => self.finish(outcome, "Node started", "Node has been started successfully"),
            Err(e) => self.fail(e),
        }
    }

    /// Stop the heartbeat; always succeeds
    pub async fn stop_node(&self) -> CommandResult<SessionView> {
        self.session.stop_node().await;
        CommandResult::ok(self.session.view())
    }

    /// Node switch handler: start when inactive, stop when active
    pub async fn toggle_node(&self) -> CommandResult<SessionView> {
        if self.session.state().is_node_active() {
            self.stop_node().await
        } else {
            self.start_node().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::error::ProviderError;
    use crate::node::MemoryKeyValueStore;
    use crate::session::{NoticeLevel, SessionState};
    use crate::testing::{FakeDevices, FakeRegistrar, FakeWallet, RecordingEvents};
    use std::sync::Arc;

    type TestController = SessionController<FakeWallet, MemoryKeyValueStore, FakeRegistrar, FakeDevices>;

    fn controller(wallet: &FakeWallet, registrar: &FakeRegistrar, events: &Arc<RecordingEvents>) -> TestController {
        SessionController::new(
            &SessionConfig::default(),
            wallet.clone(),
            MemoryKeyValueStore::new(),
            registrar.clone(),
            FakeDevices::default(),
        )
        .with_events(events.clone())
    }

    #[test]
    fn test_command_result_serialization() {
        let json = serde_json::to_value(CommandResult::<u32>::err("boom")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("data").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_rejected_raises_notice() {
        let wallet = FakeWallet::new("0xabc0000000000000000000000000000000000001", "0x1");
        wallet.fail_connect(ProviderError::user_rejected());
        let events = Arc::new(RecordingEvents::default());
        let session = controller(&wallet, &FakeRegistrar::new(), &events);

        let result = session.commands().connect_wallet().await;
        assert!(!result.success);

        let notices = events.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].title, "Connection failed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_node() {
        let wallet = FakeWallet::new("0xabc0000000000000000000000000000000000001", "0x1");
        let registrar = FakeRegistrar::new();
        let events = Arc::new(RecordingEvents::default());
        let session = controller(&wallet, &registrar, &events);
        session.commands().connect_wallet().await;

        let result = session.commands().toggle_node().await;
        assert!(result.success);
        assert!(result.data.unwrap().node_active);
        assert_eq!(events.notices().last().unwrap().title, "Node started");

        let result = session.commands().toggle_node().await;
        assert!(!result.data.unwrap().node_active);
        assert_eq!(session.state(), SessionState::ConnectedNodeInactive);
        assert_eq!(registrar.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_node_failure_notice() {
        let wallet = FakeWallet::new("0xabc0000000000000000000000000000000000001", "0x1");
        let registrar = FakeRegistrar::new();
        registrar.fail_with(SessionError::registration(Some(502), "HTTP 502: Bad Gateway"));
        let events = Arc::new(RecordingEvents::default());
        let session = controller(&wallet, &registrar, &events);
        session.commands().connect_wallet().await;

        let result = session.commands().start_node().await;
        assert!(!result.success);
        assert_eq!(
            events.notices().last().unwrap().message,
            "Failed to start node: HTTP 502: Bad Gateway"
        );
        assert!(!session.commands().get_session().data.unwrap().node_active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_cancel_is_silent() {
        let wallet = FakeWallet::new("0xabc0000000000000000000000000000000000001", "0x1");
        let events = Arc::new(RecordingEvents::default());
        let session = controller(&wallet, &FakeRegistrar::new(), &events);
        session.commands().connect_wallet().await;
        wallet.fail_method("wallet_requestPermissions", ProviderError::user_rejected());

        let result = session.commands().switch_account().await;
        assert!(result.success);
        assert!(events.notices().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_and_refresh_notices() {
        let wallet = FakeWallet::new("0xabc0000000000000000000000000000000000001", "0x1");
        let events = Arc::new(RecordingEvents::default());
        let session = controller(&wallet, &FakeRegistrar::new(), &events);
        session.commands().connect_wallet().await;

        session.commands().refresh_balance().await;
        assert_eq!(events.notices().last().unwrap().title, "Refreshed");

        let result = session.commands().disconnect_wallet().await;
        assert!(result.success);
        assert_eq!(result.data.unwrap().state, SessionState::Idle);
        assert_eq!(events.notices().last().unwrap().title, "Disconnected");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ignored_start_raises_no_notice() {
        let wallet = FakeWallet::new("0xabc0000000000000000000000000000000000001", "0x1");
        let registrar = FakeRegistrar::new();
        let events = Arc::new(RecordingEvents::default());
        let session = controller(&wallet, &registrar, &events);
        let commands = session.commands();
        commands.connect_wallet().await;

        assert!(commands.start_node().await.success);
        let result = commands.start_node().await;
        assert!(result.success);
        assert!(result.data.unwrap().node_active);

        let started: Vec<_> = events
            .notices()
            .into_iter()
            .filter(|notice| notice.title == "Node started")
            .collect();
        assert_eq!(started.len(), 1);
        assert_eq!(registrar.call_count(), 1);
    }
}
