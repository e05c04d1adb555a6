//! Validated settings structures

use crate::schema::{RawConfig, RawCredentials, RawPages, RawPanel, RawServiceConfig, RawSessionConfig};
use quizgate_util::{PanelId, data_dir_without_env};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Reference username digest shipped with the quiz pages (SHA-256)
pub const DEFAULT_USERNAME_DIGEST: &str =
    "d2aec61d2aa1d9b2baa5e20d5ecc24601065a00ffac4319183af560e877891eb";

/// Reference password digest shipped with the quiz pages (SHA-256)
pub const DEFAULT_PASSWORD_DIGEST: &str =
    "c91745e81818bad9305f35209536ba566f2c74d72658bc090ac4f999bdc096f0";

pub const DEFAULT_LOGIN_PAGE: &str = "index.html";
pub const DEFAULT_HOME_PAGE: &str = "0_LeJeux.html";

/// Validated settings ready for use by the core machines
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub service: ServiceConfig,
    pub session: SessionConfig,
    pub pages: Pages,
    pub credentials: CredentialsConfig,
    pub panels: Vec<Panel>,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceConfig::from_raw(raw.service),
            session: SessionConfig::from_raw(&raw.session),
            pages: Pages::from_raw(raw.pages),
            credentials: CredentialsConfig::from_raw(raw.credentials),
            panels: raw.panels.into_iter().map(Panel::from_raw).collect(),
        }
    }

    /// Get panel by ID
    pub fn get_panel(&self, id: &PanelId) -> Option<&Panel> {
        self.panels.iter().find(|p| &p.id == id)
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub confirm_logout: bool,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(data_dir_without_env),
            confirm_logout: raw.confirm_logout.unwrap_or(true),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: data_dir_without_env(),
            confirm_logout: true,
        }
    }
}

/// Session lifetime thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Max age of the login timestamp before forced expiry
    pub session_duration: Duration,
    /// Time before expiry at which the extend prompt fires
    pub warning_threshold: Duration,
    /// Activity with less than this remaining silently extends the session
    pub auto_refresh_threshold: Duration,
    /// Max age of the last-activity timestamp
    pub inactivity_timeout: Duration,
    /// Periodic validity check cadence
    pub check_interval: Duration,
}

impl SessionConfig {
    pub const DEFAULT_DURATION_SECS: u64 = 24 * 60 * 60;
    pub const DEFAULT_WARNING_SECS: u64 = 5 * 60;
    pub const DEFAULT_AUTO_REFRESH_SECS: u64 = 10 * 60;
    pub const DEFAULT_INACTIVITY_SECS: u64 = 60 * 60;
    pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

    fn from_raw(raw: &RawSessionConfig) -> Self {
        let secs = |v: Option<u64>, default: u64| Duration::from_secs(v.unwrap_or(default));
        Self {
            session_duration: secs(raw.duration_seconds, Self::DEFAULT_DURATION_SECS),
            warning_threshold: secs(raw.warning_seconds, Self::DEFAULT_WARNING_SECS),
            auto_refresh_threshold: secs(raw.auto_refresh_seconds, Self::DEFAULT_AUTO_REFRESH_SECS),
            inactivity_timeout: secs(raw.inactivity_timeout_seconds, Self::DEFAULT_INACTIVITY_SECS),
            check_interval: secs(raw.check_interval_seconds, Self::DEFAULT_CHECK_INTERVAL_SECS),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_raw(&RawSessionConfig::default())
    }
}

/// Navigation targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pages {
    pub login: String,
    pub home: String,
}

impl Pages {
    fn from_raw(raw: RawPages) -> Self {
        Self {
            login: raw.login.unwrap_or_else(|| DEFAULT_LOGIN_PAGE.into()),
            home: raw.home.unwrap_or_else(|| DEFAULT_HOME_PAGE.into()),
        }
    }
}

impl Default for Pages {
    fn default() -> Self {
        Self::from_raw(RawPages::default())
    }
}

/// Digest algorithm used for credential comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Some(Self::Sha256),
            "sha512" | "sha-512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Length of a hex-encoded digest
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => f.write_str("sha256"),
            Self::Sha512 => f.write_str("sha512"),
        }
    }
}

/// Reference credential digests.
///
/// These are visible to anyone holding the config; comparing digests is not
/// an authentication boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialsConfig {
    /// Algorithm name as configured; resolved when a digest is computed
    pub algorithm: String,
    pub username_digest: String,
    pub password_digest: String,
}

impl CredentialsConfig {
    fn from_raw(raw: RawCredentials) -> Self {
        Self {
            algorithm: raw.algorithm.unwrap_or_else(|| DigestAlgorithm::Sha256.to_string()),
            username_digest: raw
                .username_digest
                .unwrap_or_else(|| DEFAULT_USERNAME_DIGEST.into())
                .to_ascii_lowercase(),
            password_digest: raw
                .password_digest
                .unwrap_or_else(|| DEFAULT_PASSWORD_DIGEST.into())
                .to_ascii_lowercase(),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self::from_raw(RawCredentials::default())
    }
}

/// Validated panel definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub id: PanelId,
    pub label: String,
    /// Countdown length in seconds; `None` for panels without a timer
    pub duration_seconds: Option<u32>,
}

impl Panel {
    fn from_raw(raw: RawPanel) -> Self {
        Self {
            id: PanelId::new(raw.id),
            label: raw.label,
            duration_seconds: raw.duration_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_defaults_match_reference_thresholds() {
        let session = SessionConfig::default();
        assert_eq!(session.session_duration, Duration::from_secs(86_400));
        assert_eq!(session.warning_threshold, Duration::from_secs(300));
        assert_eq!(session.auto_refresh_threshold, Duration::from_secs(600));
        assert_eq!(session.inactivity_timeout, Duration::from_secs(3600));
        assert_eq!(session.check_interval, Duration::from_secs(60));
    }

    #[test]
    fn default_pages_and_credentials() {
        let settings = Settings::default();
        assert_eq!(settings.pages.login, "index.html");
        assert_eq!(settings.pages.home, "0_LeJeux.html");
        assert_eq!(settings.credentials.algorithm, "sha256");
        assert_eq!(settings.credentials.username_digest, DEFAULT_USERNAME_DIGEST);
        assert!(settings.service.confirm_logout);
    }

    #[test]
    fn digest_algorithm_names() {
        assert_eq!(DigestAlgorithm::parse("SHA-256"), Some(DigestAlgorithm::Sha256));
        assert_eq!(DigestAlgorithm::parse("sha512"), Some(DigestAlgorithm::Sha512));
        assert_eq!(DigestAlgorithm::parse("md5"), None);
        assert_eq!(DigestAlgorithm::Sha512.hex_len(), 128);
    }

    #[test]
    fn get_panel_by_id() {
        let settings = Settings {
            panels: vec![Panel {
                id: PanelId::new("history"),
                label: "History".into(),
                duration_seconds: Some(30),
            }],
            ..Default::default()
        };

        assert!(settings.get_panel(&PanelId::new("history")).is_some());
        assert!(settings.get_panel(&PanelId::new("sport")).is_none());
    }
}
