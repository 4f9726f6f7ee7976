//! Notification models shared by the alert queue and its observers.

use serde::{Deserialize, Serialize};

/// Default lifetime of an auto-closing alert
pub const DEFAULT_ALERT_DURATION_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Info,
    Success,
    Error,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Info => "info",
            AlertKind::Success => "success",
            AlertKind::Error => "error",
        }
    }
}

/// An active notification.
///
/// Alerts are immutable once pushed; the queue only ever adds or removes
/// whole entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub auto_close: bool,
    pub created_at_epoch_ms: i64,
    pub duration_ms: u64,
}

/// Per-alert options for `AlertQueue::push`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertOptions {
    pub auto_close: bool,
    pub duration_ms: u64,
}

impl Default for AlertOptions {
    fn default() -> Self {
        Self {
            auto_close: true,
            duration_ms: DEFAULT_ALERT_DURATION_MS,
        }
    }
}

impl AlertOptions {
    /// An alert that stays until dismissed
    pub fn pinned() -> Self {
        Self {
            auto_close: false,
            ..Self::default()
        }
    }

    pub fn with_duration_ms(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            ..Self::default()
        }
    }
}
