//! Default paths for quizgate components
//!
//! Paths are user-writable by default:
//! - Config: `$XDG_CONFIG_HOME/quizgate/config.toml` or `~/.config/quizgate/config.toml`
//! - Data: `$XDG_DATA_HOME/quizgate` or `~/.local/share/quizgate`

use std::path::PathBuf;

/// Application subdirectory name
const APP_DIR: &str = "quizgate";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Get the default configuration file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/quizgate/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/quizgate/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory, ignoring `QUIZGATE_DATA_DIR`.
///
/// The daemon reads that variable through its command line, so config
/// defaults only consult the XDG layout.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}
