//! Login by digest comparison.
//!
//! The reference digests live in client-visible config, so this is a
//! convenience gate and not a security boundary. Anyone who can read the
//! config or the store can get past it.

use chrono::{DateTime, Local};
use quizgate_config::{CredentialsConfig, DigestAlgorithm, Pages, SessionConfig};
use quizgate_store::{AuditEvent, AuditEventType, SessionRecord, Store};
use quizgate_util::{elapsed_between, QuizgateError, Result};
use sha2::{Digest, Sha256, Sha512};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::CoreEvent;

pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all fields";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Incorrect username or password";
pub const TECHNICAL_ERROR_MESSAGE: &str = "Technical error. Please try again.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again";

/// Compares hex digests of the inputs against the configured references
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    algorithm: String,
    username_digest: String,
    password_digest: String,
}

impl CredentialVerifier {
    pub fn new(credentials: &CredentialsConfig) -> Self {
        Self {
            algorithm: credentials.algorithm.clone(),
            username_digest: credentials.username_digest.to_ascii_lowercase(),
            password_digest: credentials.password_digest.to_ascii_lowercase(),
        }
    }

    /// Lowercase hex digest of `input` with the configured algorithm
    pub fn digest_hex(&self, input: &str) -> Result<String> {
        let algorithm = DigestAlgorithm::parse(&self.algorithm).ok_or_else(|| {
            QuizgateError::digest(format!("unsupported algorithm '{}'", self.algorithm))
        })?;

        let hex = match algorithm {
            DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(input.as_bytes())),
            DigestAlgorithm::Sha512 => hex::encode(Sha512::digest(input.as_bytes())),
        };
        Ok(hex)
    }

    pub fn verify(&self, username: &str, password: &str) -> Result<bool> {
        let username_ok = self.digest_hex(username)? == self.username_digest;
        let password_ok = self.digest_hex(password)? == self.password_digest;
        Ok(username_ok && password_ok)
    }
}

/// Result of a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success { username: String, navigate_to: String },
    MissingFields,
    InvalidCredentials,
    TechnicalError,
}

impl LoginOutcome {
    /// Inline message for the login form
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Success { .. } => None,
            Self::MissingFields => Some(MISSING_FIELDS_MESSAGE),
            Self::InvalidCredentials => Some(INVALID_CREDENTIALS_MESSAGE),
            Self::TechnicalError => Some(TECHNICAL_ERROR_MESSAGE),
        }
    }

    /// Host-facing effects of this outcome
    pub fn events(&self) -> Vec<CoreEvent> {
        match self {
            Self::Success {
                username,
                navigate_to,
            } => vec![
                CoreEvent::LoggedIn {
                    username: username.clone(),
                },
                CoreEvent::Navigate {
                    path: navigate_to.clone(),
                },
            ],
            other => other
                .message()
                .map(|message| CoreEvent::Notice {
                    message: message.to_string(),
                })
                .into_iter()
                .collect(),
        }
    }
}

/// Login page behaviour
pub struct Authenticator {
    verifier: CredentialVerifier,
    pages: Pages,
    session_duration: std::time::Duration,
    store: Arc<dyn Store>,
}

impl Authenticator {
    pub fn new(
        credentials: &CredentialsConfig,
        pages: Pages,
        session: &SessionConfig,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            verifier: CredentialVerifier::new(credentials),
            pages,
            session_duration: session.session_duration,
            store,
        }
    }

    /// Attempt a login. Nothing is written unless the credentials match.
    pub fn login(&self, username: &str, password: &str, now: DateTime<Local>) -> LoginOutcome {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return LoginOutcome::MissingFields;
        }

        match self.verifier.verify(username, password) {
            Ok(true) => {}
            Ok(false) => {
                self.audit_failure("invalid credentials");
                info!("Login rejected");
                return LoginOutcome::InvalidCredentials;
            }
            Err(e) => {
                self.audit_failure(&e.to_string());
                warn!(error = %e, "Credential check failed");
                return LoginOutcome::TechnicalError;
            }
        }

        if let Err(e) = SessionRecord::opened(username, now).save(self.store.as_ref()) {
            warn!(error = %e, "Failed to write session record");
            // Leave no half-written session behind
            let _ = SessionRecord::clear(self.store.as_ref());
            return LoginOutcome::TechnicalError;
        }

        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::LoginSucceeded {
            username: username.to_string(),
        }));
        info!(username, "Login succeeded");

        LoginOutcome::Success {
            username: username.to_string(),
            navigate_to: self.pages.home.clone(),
        }
    }

    /// Entry check on the login page.
    ///
    /// A still-valid session skips the form; an aged-out one is cleared with
    /// a notice.
    pub fn check_existing(&self, now: DateTime<Local>) -> Vec<CoreEvent> {
        let record = match SessionRecord::load(self.store.as_ref()) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Failed to read session record");
                return Vec::new();
            }
        };
        if !record.authenticated {
            return Vec::new();
        }

        let valid = record
            .login_time
            .is_some_and(|t| elapsed_between(&t, &now) <= self.session_duration);

        if valid {
            debug!("Existing session found, skipping login");
            return vec![CoreEvent::Navigate {
                path: self.pages.home.clone(),
            }];
        }

        if let Err(e) = SessionRecord::clear(self.store.as_ref()) {
            warn!(error = %e, "Session record not fully cleared");
        }
        info!("Stale session cleared on login page");
        vec![CoreEvent::Notice {
            message: SESSION_EXPIRED_MESSAGE.to_string(),
        }]
    }

    fn audit_failure(&self, reason: &str) {
        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::LoginFailed {
            reason: reason.to_string(),
        }));
    }
}
