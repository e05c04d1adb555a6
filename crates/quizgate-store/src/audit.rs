//! Audit event types

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Host loop started
    ServiceStarted,

    /// Host loop stopped
    ServiceStopped,

    /// Configuration loaded
    ConfigLoaded { panel_count: usize },

    /// Credentials accepted
    LoginSucceeded { username: String },

    /// Credentials rejected or could not be checked
    LoginFailed { reason: String },

    /// Expiry warning shown
    WarningIssued { remaining_secs: u64 },

    /// Session window restarted
    SessionExtended {
        automatic: bool,
        login_time: DateTime<Local>,
    },

    /// Session cleared
    SessionEnded { reason: String },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: quizgate_util::now(),
            event,
        }
    }
}
