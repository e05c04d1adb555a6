//! Core events emitted by the state machines

use chrono::{DateTime, Local};
use quizgate_host_api::TimerView;
use quizgate_util::{PanelId, PromptId};
use std::time::Duration;

use crate::ExpiryReason;

/// Events emitted by the core state machines
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// Session is about to expire; the host should ask whether to extend
    WarningIssued {
        prompt: PromptId,
        time_remaining: Duration,
        message: String,
    },

    /// An outstanding prompt no longer applies
    PromptCancelled { prompt: PromptId },

    /// Session window restarted
    SessionExtended {
        login_time: DateTime<Local>,
        automatic: bool,
    },

    /// Session record cleared
    SessionEnded {
        reason: ExpiryReason,
        /// User-facing alert, if this reason warrants one
        alert: Option<String>,
    },

    /// Host should leave the current page
    Navigate { path: String },

    /// Credentials accepted and session opened
    LoggedIn { username: String },

    /// Inline notice for the user
    Notice { message: String },

    /// A panel opened; `view` is its countdown if it has one
    PanelOpened {
        panel: PanelId,
        view: Option<TimerView>,
    },

    /// The open panel closed and its countdown (if any) stopped
    PanelClosed { panel: PanelId },

    /// Countdown advanced by one second
    TimerTicked { view: TimerView },

    /// Countdown reached zero
    TimerCompleted { panel: PanelId },
}
