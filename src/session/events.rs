//! Session event callbacks
//!
//! The UI subscribes by implementing `SessionEvents`. Every method has a
//! no-op default so an implementation only overrides what it renders.

use super::state::SessionView;
use crate::error::SessionError;
use serde::Serialize;

/// Severity of a user notice
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Blocking user notification (an alert dialog on mobile)
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn from_error(error: &SessionError) -> Self {
        let message = match error {
            SessionError::Registration { message, .. } => format!("Failed to start node: {}", message),
            other => other.to_string(),
        };
        Self::error(error.alert_title(), message)
    }
}

/// Outcome of one heartbeat tick
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatReport {
    pub address: String,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HeartbeatReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Callbacks raised by the session controller
pub trait SessionEvents: Send + Sync {
    /// State, wallet details, balance or node status changed
    fn on_state_changed(&self, _view: &SessionView) {}

    /// A user-initiated action needs to show a notification
    fn on_notice(&self, _notice: &Notice) {}

    /// A heartbeat tick finished
    fn on_heartbeat(&self, _report: &HeartbeatReport) {}
}

/// Event sink that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEvents;

impl SessionEvents for LogEvents {
    fn on_state_changed(&self, view: &SessionView) {
        log::debug!(
            "Session state: {} (account={}, node_active={})",
            view.state.as_str(),
            view.short_address.as_deref().unwrap_or("-"),
            view.node_active
        );
    }

    fn on_notice(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Success => log::info!("{}: {}", notice.title, notice.message),
            NoticeLevel::Error => log::warn!("{}: {}", notice.title, notice.message),
        }
    }

    fn on_heartbeat(&self, report: &HeartbeatReport) {
        if let Some(error) = &report.error {
            log::warn!("Heartbeat for {} failed: {}", report.address, error);
        }
    }
}
