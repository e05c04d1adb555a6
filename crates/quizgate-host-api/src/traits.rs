//! Host adapter traits

use async_trait::async_trait;
use thiserror::Error;

use crate::TimerView;

/// Errors from host adapter operations
#[derive(Debug, Error)]
pub enum HostError {
    /// The host cannot ask the user anything right now
    #[error("Confirmation unavailable: {0}")]
    ConfirmationUnavailable(String),

    /// The prompt was withdrawn before the user answered
    #[error("Confirmation dismissed")]
    Dismissed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Presentation side of the gate, implemented per platform.
///
/// Only `confirm` waits on the user. Everything else is fire-and-forget
/// and must not block.
#[async_trait]
pub trait HostAdapter: Send + Sync {
    /// Leave the current page for `path`
    fn navigate_to(&self, path: &str);

    /// Ask a yes/no question. Resolves once the user answers or the prompt
    /// is dismissed.
    async fn confirm(&self, message: &str) -> HostResult<bool>;

    /// Withdraw an outstanding confirmation, if any
    fn dismiss_confirmation(&self);

    /// Blocking-style alert the user must see
    fn alert(&self, message: &str);

    /// Inline message, e.g. a login form error
    fn show_message(&self, message: &str);

    /// Short sound when a countdown ends
    fn play_chime(&self);

    /// Draw or refresh the countdown for a panel
    fn render_timer(&self, view: &TimerView);

    /// Remove the countdown display
    fn clear_timer(&self) {}

    /// Optional: check if the host adapter is healthy
    fn is_healthy(&self) -> bool {
        true
    }
}
