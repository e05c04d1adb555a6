//! Time utilities for quizgate
//!
//! Session timestamps are stored as decimal epoch milliseconds, so this
//! module provides the codec for them next to the clock itself.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `QUIZGATE_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations. This is useful
//! for exercising session expiry without waiting a day.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)
//!
//! Example:
//! ```bash
//! QUIZGATE_MOCK_TIME="2025-12-25 14:30:00" quizgate
//! ```

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "QUIZGATE_MOCK_TIME";

/// Cached mock time offset from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                if let Ok(naive_dt) =
                    NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S")
                {
                    if let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() {
                        let offset = mock_dt.signed_duration_since(chrono::Local::now());
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    tracing::warn!(
                        mock_time = %mock_time_str,
                        "Failed to convert mock time to local timezone"
                    );
                } else {
                    tracing::warn!(
                        mock_time = %mock_time_str,
                        expected_format = "%Y-%m-%d %H:%M:%S",
                        "Invalid mock time format"
                    );
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    if let Some(offset) = get_mock_time_offset() {
        real_now + offset
    } else {
        real_now
    }
}

/// Encode a timestamp the way the session store keeps it.
pub fn to_epoch_millis(dt: &DateTime<Local>) -> String {
    dt.timestamp_millis().to_string()
}

/// Decode a stored epoch-millis timestamp.
///
/// Returns `None` for anything that is not a plain integer in range, so a
/// corrupt value reads the same as an absent one.
pub fn parse_epoch_millis(raw: &str) -> Option<DateTime<Local>> {
    let millis: i64 = raw.trim().parse().ok()?;
    Local.timestamp_millis_opt(millis).single()
}

/// Time elapsed from `earlier` to `now`, clamped at zero.
pub fn elapsed_between(earlier: &DateTime<Local>, now: &DateTime<Local>) -> Duration {
    now.signed_duration_since(*earlier)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Convert a std duration for chrono arithmetic, saturating on overflow.
pub fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}

/// Format a DateTime for display with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format a remaining session time the way prompts show it: `2h 5min` or `4min`.
pub fn format_remaining(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;

    if hours > 0 {
        format!("{}h {}min", hours, minutes)
    } else {
        format!("{}min", minutes)
    }
}

/// Helper to format durations in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
