//! Error types for the wallet session core
//!
//! `SessionError` is the taxonomy every session operation reports with.
//! `ProviderError` is the raw failure handed back by the wallet capability.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Failure reported by a session operation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Wallet connect or terminate failed
    #[error("wallet connection failed: {0}")]
    Connection(String),

    /// Account switch failed (user cancellation is not an error)
    #[error("account switch failed: {0}")]
    Switch(String),

    /// Balance lookup failed; never fatal
    #[error("balance query failed: {0}")]
    BalanceQuery(String),

    /// Registration or heartbeat call was rejected or never arrived
    #[error("node registration failed: {message}")]
    Registration {
        status: Option<u16>,
        message: String,
    },

    /// Key-value persistence failed; in-memory state stays authoritative
    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl SessionError {
    pub fn registration(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Registration {
            status,
            message: message.into(),
        }
    }

    /// Whether a user-initiated action that failed with this error should
    /// raise a blocking notification
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Switch(_) | Self::Registration { .. }
        )
    }

    /// Title used for the notification raised for this error
    pub fn alert_title(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection failed",
            Self::Switch(_) => "Switch account failed",
            Self::BalanceQuery(_) => "Balance unavailable",
            Self::Registration { .. } => "Failed to start node",
            Self::Persistence(_) => "Storage error",
        }
    }
}

/// Raw error returned by the wallet capability (EIP-1193 style)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProviderError {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    /// Code the wallet returns when the user dismisses a request
    pub const USER_REJECTED: i64 = 4001;

    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Transport-level failure with no RPC error code
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    pub fn user_rejected() -> Self {
        Self::new(Some(Self::USER_REJECTED), "User rejected the request.")
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(Self::USER_REJECTED)
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "provider error {}: {}", code, self.message),
            None => write!(f, "provider error: {}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {}
