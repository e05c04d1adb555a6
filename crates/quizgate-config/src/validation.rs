//! Configuration validation

use crate::DigestAlgorithm;
use crate::schema::{RawConfig, RawCredentials, RawPanel, RawSessionConfig};
use crate::settings::SessionConfig;
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Panel '{panel_id}': {message}")]
    PanelError { panel_id: String, message: String },

    #[error("Duplicate panel ID: {0}")]
    DuplicatePanelId(String),

    #[error("Session setting '{field}' must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("Session setting '{field}' ({seconds}s) must be shorter than the session duration ({duration}s)")]
    ThresholdExceedsSession {
        field: &'static str,
        seconds: u64,
        duration: u64,
    },

    #[error("Unknown digest algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Credential '{field}' is not a {algorithm} hex digest")]
    MalformedDigest {
        field: &'static str,
        algorithm: String,
    },

    #[error("Page '{0}' cannot be empty")]
    EmptyPage(&'static str),
}

/// Validate a raw configuration, collecting every problem found
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_session(&config.session));
    errors.extend(validate_credentials(&config.credentials));

    if matches!(config.pages.login.as_deref(), Some(p) if p.trim().is_empty()) {
        errors.push(ValidationError::EmptyPage("login"));
    }
    if matches!(config.pages.home.as_deref(), Some(p) if p.trim().is_empty()) {
        errors.push(ValidationError::EmptyPage("home"));
    }

    let mut seen_ids = HashSet::new();
    for panel in &config.panels {
        if !seen_ids.insert(&panel.id) {
            errors.push(ValidationError::DuplicatePanelId(panel.id.clone()));
        }
    }

    for panel in &config.panels {
        errors.extend(validate_panel(panel));
    }

    errors
}

fn validate_session(raw: &RawSessionConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let fields = [
        ("duration_seconds", raw.duration_seconds),
        ("warning_seconds", raw.warning_seconds),
        ("auto_refresh_seconds", raw.auto_refresh_seconds),
        ("inactivity_timeout_seconds", raw.inactivity_timeout_seconds),
        ("check_interval_seconds", raw.check_interval_seconds),
    ];
    for (field, value) in fields {
        if value == Some(0) {
            errors.push(ValidationError::ZeroDuration { field });
        }
    }

    let duration = raw
        .duration_seconds
        .unwrap_or(SessionConfig::DEFAULT_DURATION_SECS);
    let thresholds = [
        (
            "warning_seconds",
            raw.warning_seconds
                .unwrap_or(SessionConfig::DEFAULT_WARNING_SECS),
        ),
        (
            "auto_refresh_seconds",
            raw.auto_refresh_seconds
                .unwrap_or(SessionConfig::DEFAULT_AUTO_REFRESH_SECS),
        ),
    ];
    for (field, seconds) in thresholds {
        if duration > 0 && seconds >= duration {
            errors.push(ValidationError::ThresholdExceedsSession {
                field,
                seconds,
                duration,
            });
        }
    }

    errors
}

fn validate_credentials(raw: &RawCredentials) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let algorithm = match raw.algorithm.as_deref() {
        None => DigestAlgorithm::Sha256,
        Some(name) => match DigestAlgorithm::parse(name) {
            Some(algorithm) => algorithm,
            None => {
                errors.push(ValidationError::UnknownAlgorithm(name.to_string()));
                return errors;
            }
        },
    };

    let digests = [
        ("username_digest", raw.username_digest.as_deref()),
        ("password_digest", raw.password_digest.as_deref()),
    ];
    for (field, digest) in digests {
        // Absent digests fall back to the shipped SHA-256 references
        let Some(digest) = digest else {
            if algorithm != DigestAlgorithm::Sha256 {
                errors.push(ValidationError::MalformedDigest {
                    field,
                    algorithm: algorithm.to_string(),
                });
            }
            continue;
        };

        if !is_hex_digest(digest, algorithm.hex_len()) {
            errors.push(ValidationError::MalformedDigest {
                field,
                algorithm: algorithm.to_string(),
            });
        }
    }

    errors
}

fn validate_panel(panel: &RawPanel) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if panel.id.trim().is_empty() {
        errors.push(ValidationError::PanelError {
            panel_id: panel.id.clone(),
            message: "id cannot be empty".into(),
        });
    }

    if panel.id.chars().any(char::is_whitespace) {
        errors.push(ValidationError::PanelError {
            panel_id: panel.id.clone(),
            message: "id cannot contain whitespace".into(),
        });
    }

    if panel.duration_seconds == Some(0) {
        errors.push(ValidationError::PanelError {
            panel_id: panel.id.clone(),
            message: "duration_seconds must be greater than zero".into(),
        });
    }

    errors
}

fn is_hex_digest(value: &str, expected_len: usize) -> bool {
    value.len() == expected_len && value.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> RawConfig {
        toml::from_str("config_version = 1").unwrap()
    }

    fn panel(id: &str, duration: Option<u32>) -> RawPanel {
        RawPanel {
            id: id.into(),
            label: id.to_uppercase(),
            duration_seconds: duration,
        }
    }

    #[test]
    fn minimal_config_is_valid() {
        assert!(validate_config(&minimal()).is_empty());
    }

    #[test]
    fn test_duplicate_id_detection() {
        let mut config = minimal();
        config.panels = vec![panel("history", Some(30)), panel("history", Some(45))];

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicatePanelId(_))));
    }

    #[test]
    fn zero_panel_duration_rejected() {
        let mut config = minimal();
        config.panels = vec![panel("sport", Some(0)), panel("rules", None)];

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ValidationError::PanelError { panel_id, .. } if panel_id == "sport"));
    }

    #[test]
    fn warning_must_fit_inside_session() {
        let mut config = minimal();
        config.session.duration_seconds = Some(600);
        config.session.warning_seconds = Some(600);

        let errors = validate_config(&config);
        // auto-refresh default (600s) also no longer fits
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, ValidationError::ThresholdExceedsSession { .. })));
    }

    #[test]
    fn zero_check_interval_rejected() {
        let mut config = minimal();
        config.session.check_interval_seconds = Some(0);

        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::ZeroDuration { field: "check_interval_seconds" }
        )));
    }

    #[test]
    fn unknown_algorithm_rejected() {
        let mut config = minimal();
        config.credentials.algorithm = Some("md5".into());

        let errors = validate_config(&config);
        assert!(matches!(errors.as_slice(), [ValidationError::UnknownAlgorithm(name)] if name == "md5"));
    }

    #[test]
    fn digest_length_follows_algorithm() {
        let mut config = minimal();
        config.credentials.algorithm = Some("sha512".into());
        config.credentials.username_digest = Some("ab".repeat(64));
        config.credentials.password_digest = Some("ab".repeat(32));

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ValidationError::MalformedDigest { field: "password_digest", .. }
        ));
    }
}
