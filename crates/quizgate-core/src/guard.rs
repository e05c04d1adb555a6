//! Session guard: periodic validity checks of the stored login

use chrono::{DateTime, Local};
use quizgate_config::SessionConfig;
use quizgate_store::{
    store_last_activity, store_login_time, AuditEvent, AuditEventType, SessionRecord, Store,
};
use quizgate_util::{elapsed_between, format_remaining, PromptId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::CoreEvent;

/// Question asked before a manual logout
pub const LOGOUT_CONFIRM_MESSAGE: &str = "Are you sure you want to log out?";

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryReason {
    NotAuthenticated,
    /// Authenticated flag set but timestamps missing or corrupt
    InvalidSession,
    SessionExpired,
    Inactivity,
    ManualLogout,
}

impl ExpiryReason {
    /// Whether the user gets an alert, not just a redirect
    pub fn should_alert(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::Inactivity)
    }
}

impl fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotAuthenticated => "not authenticated",
            Self::InvalidSession => "invalid session",
            Self::SessionExpired => "session expired",
            Self::Inactivity => "inactivity",
            Self::ManualLogout => "manual logout",
        };
        f.write_str(text)
    }
}

/// Outcome of one validity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Valid,
    /// Valid, but inside the warning window
    WarnedAndValid,
    Expired(ExpiryReason),
}

/// Decision plus the side effects the host must apply
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub decision: Decision,
    pub events: Vec<CoreEvent>,
}

/// Read-only view of the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub username: Option<String>,
    pub login_time: DateTime<Local>,
    /// Falls back to the login time when never recorded
    pub last_activity: DateTime<Local>,
    pub time_remaining: Duration,
    pub time_remaining_formatted: String,
    pub inactivity: Duration,
    pub session_valid: bool,
    pub user_active: bool,
}

/// Usage figures for the current session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub session_duration: Duration,
    pub time_elapsed: Duration,
    pub time_remaining: Duration,
    /// Share of the session used, rounded to one decimal
    pub percentage_used: f64,
    pub inactivity_duration: Duration,
}

/// Timestamps of a session that passed the authenticated check
struct OpenSession {
    login_time: DateTime<Local>,
    last_activity: DateTime<Local>,
}

/// Decides whether the stored session is still valid and applies the
/// resulting extend/warn/expire side effects.
///
/// Every check reads the record fresh from the store. The only state kept
/// here is the warning flag and the id of an outstanding prompt.
pub struct SessionGuard {
    config: SessionConfig,
    login_page: String,
    confirm_logout: bool,
    store: Arc<dyn Store>,
    /// `loginTime` of the window a warning was already raised for
    warned_window: Option<DateTime<Local>>,
    pending_prompt: Option<PromptId>,
    last_prompt: PromptId,
}

impl SessionGuard {
    pub fn new(config: SessionConfig, login_page: impl Into<String>, store: Arc<dyn Store>) -> Self {
        Self {
            config,
            login_page: login_page.into(),
            confirm_logout: true,
            store,
            warned_window: None,
            pending_prompt: None,
            last_prompt: PromptId::new(0),
        }
    }

    /// Whether `logout` needs the user to confirm first
    pub fn with_logout_confirmation(mut self, required: bool) -> Self {
        self.confirm_logout = required;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn requires_logout_confirmation(&self) -> bool {
        self.confirm_logout
    }

    /// The warning prompt waiting for an answer, if any
    pub fn pending_prompt(&self) -> Option<PromptId> {
        self.pending_prompt
    }

    /// Check the stored session at `now`.
    ///
    /// An expiry clears the record, so a second call at the same `now`
    /// reports `NotAuthenticated` rather than the original reason.
    pub fn evaluate(&mut self, now: DateTime<Local>) -> Evaluation {
        let record = match SessionRecord::load(self.store.as_ref()) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Failed to read session record");
                return self.expired(ExpiryReason::InvalidSession);
            }
        };

        let session = match self.open_session(&record) {
            Ok(session) => session,
            Err(reason) => return self.expired(reason),
        };

        if let Some(reason) = self.lapse(&session, now) {
            return self.expired(reason);
        }

        let elapsed = elapsed_between(&session.login_time, &now);
        let remaining = self.config.session_duration - elapsed;
        if remaining > self.config.warning_threshold {
            debug!(remaining_secs = remaining.as_secs(), "Session valid");
            return Evaluation {
                decision: Decision::Valid,
                events: Vec::new(),
            };
        }

        let mut events = Vec::new();
        if self.warned_window != Some(session.login_time) {
            self.warned_window = Some(session.login_time);
            let prompt = self.last_prompt.next();
            self.last_prompt = prompt;
            self.pending_prompt = Some(prompt);

            let _ = self.store.append_audit(AuditEvent::new(AuditEventType::WarningIssued {
                remaining_secs: remaining.as_secs(),
            }));

            info!(
                prompt = %prompt,
                remaining_secs = remaining.as_secs(),
                "Session expiry warning issued"
            );

            events.push(CoreEvent::WarningIssued {
                prompt,
                time_remaining: remaining,
                message: format!(
                    "Your session expires in {}. Extend your session?",
                    format_remaining(remaining)
                ),
            });
        }

        Evaluation {
            decision: Decision::WarnedAndValid,
            events,
        }
    }

    /// Resume a warning prompt with the user's answer.
    ///
    /// Answers for a prompt that is no longer pending are ignored.
    pub fn resolve_warning(
        &mut self,
        prompt: PromptId,
        accepted: bool,
        now: DateTime<Local>,
    ) -> Vec<CoreEvent> {
        if self.pending_prompt != Some(prompt) {
            debug!(prompt = %prompt, "Ignoring answer to stale prompt");
            return Vec::new();
        }
        self.pending_prompt = None;

        if accepted {
            self.extend_session(now)
        } else {
            info!(prompt = %prompt, "Session extension declined");
            Vec::new()
        }
    }

    /// Restart the session window at `now`
    pub fn extend_session(&mut self, now: DateTime<Local>) -> Vec<CoreEvent> {
        match SessionRecord::load(self.store.as_ref()) {
            Ok(record) if record.authenticated => {}
            Ok(_) => {
                debug!("No session to extend");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "Failed to read session record");
                return Vec::new();
            }
        }

        if let Err(e) = store_login_time(self.store.as_ref(), &now)
            .and_then(|_| store_last_activity(self.store.as_ref(), &now))
        {
            warn!(error = %e, "Failed to extend session");
            return Vec::new();
        }

        self.extended(now, false)
    }

    /// Note a user interaction at `now`.
    ///
    /// Silently extends the session when less than the auto-refresh
    /// threshold remains. A session that already lapsed by age or by
    /// inactivity is left untouched; the next `evaluate` expires it.
    pub fn record_activity(&mut self, now: DateTime<Local>) -> Vec<CoreEvent> {
        let record = match SessionRecord::load(self.store.as_ref()) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Failed to read session record");
                return Vec::new();
            }
        };
        let session = self.open_session(&record).ok();

        if let Some(reason) = session.as_ref().and_then(|s| self.lapse(s, now)) {
            debug!(reason = %reason, "Ignoring activity on a lapsed session");
            return Vec::new();
        }

        if let Err(e) = store_last_activity(self.store.as_ref(), &now) {
            warn!(error = %e, "Failed to record activity");
            return Vec::new();
        }

        let Some(session) = session else {
            return Vec::new();
        };

        let elapsed = elapsed_between(&session.login_time, &now);
        let remaining = self.config.session_duration - elapsed;
        if remaining >= self.config.auto_refresh_threshold {
            return Vec::new();
        }

        if let Err(e) = store_login_time(self.store.as_ref(), &now) {
            warn!(error = %e, "Failed to auto-extend session");
            return Vec::new();
        }

        self.extended(now, true)
    }

    /// End the session: clear the record and send the user to the login page
    pub fn force_expire(&mut self, reason: ExpiryReason) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        if let Some(prompt) = self.pending_prompt.take() {
            debug!(prompt = %prompt, "Cancelling pending warning");
            events.push(CoreEvent::PromptCancelled { prompt });
        }
        self.warned_window = None;

        if let Err(e) = SessionRecord::clear(self.store.as_ref()) {
            warn!(error = %e, "Session record not fully cleared");
        }

        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::SessionEnded {
            reason: reason.to_string(),
        }));

        info!(reason = %reason, "Session ended");

        events.push(CoreEvent::SessionEnded {
            reason,
            alert: reason
                .should_alert()
                .then(|| format!("Session ended: {}", reason)),
        });
        events.push(CoreEvent::Navigate {
            path: self.login_page.clone(),
        });

        events
    }

    /// Manual logout. Declining a required confirmation does nothing.
    pub fn logout(&mut self, user_confirmed: bool) -> Vec<CoreEvent> {
        if self.confirm_logout && !user_confirmed {
            debug!("Logout not confirmed");
            return Vec::new();
        }
        self.force_expire(ExpiryReason::ManualLogout)
    }

    /// Details of the current session, `None` when logged out
    pub fn current_user(&self, now: DateTime<Local>) -> Option<SessionInfo> {
        let record = SessionRecord::load(self.store.as_ref()).ok()?;
        if !record.authenticated {
            return None;
        }
        let login_time = record.login_time?;
        let last_activity = record.last_activity.unwrap_or(login_time);

        let elapsed = elapsed_between(&login_time, &now);
        let inactivity = elapsed_between(&last_activity, &now);
        let time_remaining = self.config.session_duration.saturating_sub(elapsed);

        Some(SessionInfo {
            username: record.username,
            login_time,
            last_activity,
            time_remaining,
            time_remaining_formatted: format_remaining(time_remaining),
            inactivity,
            session_valid: elapsed <= self.config.session_duration,
            user_active: inactivity <= self.config.inactivity_timeout,
        })
    }

    /// Usage figures of the current session, `None` when logged out
    pub fn session_stats(&self, now: DateTime<Local>) -> Option<SessionStats> {
        let info = self.current_user(now)?;
        let time_elapsed = elapsed_between(&info.login_time, &now);

        let duration_secs = self.config.session_duration.as_secs_f64();
        let percentage_used = if duration_secs > 0.0 {
            (time_elapsed.as_secs_f64() / duration_secs * 1000.0).round() / 10.0
        } else {
            100.0
        };

        Some(SessionStats {
            session_duration: self.config.session_duration,
            time_elapsed,
            time_remaining: info.time_remaining,
            percentage_used,
            inactivity_duration: info.inactivity,
        })
    }

    /// Time until the next check has something to do: the session lapsing
    /// by age or inactivity, or the warning window opening if no warning
    /// was raised for it yet. `None` when there is no valid session.
    pub fn next_deadline(&self, now: DateTime<Local>) -> Option<Duration> {
        let record = SessionRecord::load(self.store.as_ref()).ok()?;
        let session = self.open_session(&record).ok()?;

        let by_age = self
            .config
            .session_duration
            .checked_sub(elapsed_between(&session.login_time, &now))?;
        let by_idle = self
            .config
            .inactivity_timeout
            .checked_sub(elapsed_between(&session.last_activity, &now))?;

        let mut deadline = by_age.min(by_idle);
        if self.warned_window != Some(session.login_time)
            && let Some(by_warning) = by_age.checked_sub(self.config.warning_threshold)
        {
            deadline = deadline.min(by_warning);
        }

        Some(deadline)
    }

    /// Why an open session is no longer valid at `now`, if it is not
    fn lapse(&self, session: &OpenSession, now: DateTime<Local>) -> Option<ExpiryReason> {
        if elapsed_between(&session.login_time, &now) > self.config.session_duration {
            return Some(ExpiryReason::SessionExpired);
        }
        if elapsed_between(&session.last_activity, &now) > self.config.inactivity_timeout {
            return Some(ExpiryReason::Inactivity);
        }
        None
    }

    fn open_session(&self, record: &SessionRecord) -> Result<OpenSession, ExpiryReason> {
        if !record.authenticated {
            return Err(ExpiryReason::NotAuthenticated);
        }
        match (record.login_time, record.last_activity) {
            (Some(login_time), Some(last_activity)) => Ok(OpenSession {
                login_time,
                last_activity,
            }),
            _ => Err(ExpiryReason::InvalidSession),
        }
    }

    fn expired(&mut self, reason: ExpiryReason) -> Evaluation {
        Evaluation {
            decision: Decision::Expired(reason),
            events: self.force_expire(reason),
        }
    }

    fn extended(&mut self, login_time: DateTime<Local>, automatic: bool) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        // A new window makes any outstanding prompt moot
        if let Some(prompt) = self.pending_prompt.take() {
            events.push(CoreEvent::PromptCancelled { prompt });
        }
        self.warned_window = None;

        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::SessionExtended {
            automatic,
            login_time,
        }));

        info!(automatic, login_time = %login_time, "Session extended");

        events.push(CoreEvent::SessionExtended {
            login_time,
            automatic,
        });
        events
    }
}
