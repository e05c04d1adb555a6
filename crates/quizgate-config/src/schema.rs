//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Process-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Session lifetime settings
    #[serde(default)]
    pub session: RawSessionConfig,

    /// Navigation targets
    #[serde(default)]
    pub pages: RawPages,

    /// Reference credential digests
    #[serde(default)]
    pub credentials: RawCredentials,

    /// Quiz category panels
    #[serde(default)]
    pub panels: Vec<RawPanel>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the store
    pub data_dir: Option<PathBuf>,

    /// Ask before a manual logout (default: true)
    pub confirm_logout: Option<bool>,
}

/// Session lifetime settings, all in seconds
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSessionConfig {
    /// Max age of the login timestamp
    pub duration_seconds: Option<u64>,

    /// Warn this long before expiry
    pub warning_seconds: Option<u64>,

    /// Silently extend on activity when less than this remains
    pub auto_refresh_seconds: Option<u64>,

    /// Max age of the last-activity timestamp
    pub inactivity_timeout_seconds: Option<u64>,

    /// Periodic check cadence
    pub check_interval_seconds: Option<u64>,
}

/// Navigation targets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPages {
    /// Login entry point
    pub login: Option<String>,

    /// Protected game page
    pub home: Option<String>,
}

/// Reference credential digests
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCredentials {
    /// Digest algorithm: "sha256" (default) or "sha512"
    pub algorithm: Option<String>,

    /// Hex digest of the accepted username
    pub username_digest: Option<String>,

    /// Hex digest of the accepted password
    pub password_digest: Option<String>,
}

/// Raw panel definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawPanel {
    /// Unique stable ID
    pub id: String,

    /// Display label
    pub label: String,

    /// Countdown length; absent for panels without a timer
    pub duration_seconds: Option<u32>,
}
