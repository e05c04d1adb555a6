//! Error types for quizgate

use thiserror::Error;

use crate::PanelId;

/// Core error type for quizgate operations
#[derive(Debug, Error)]
pub enum QuizgateError {
    #[error("Panel not found: {0}")]
    PanelNotFound(PanelId),

    #[error("Invalid timer duration for panel {panel}: {seconds}s")]
    InvalidDuration { panel: PanelId, seconds: u32 },

    #[error("Digest unavailable: {0}")]
    DigestUnavailable(String),
}

impl QuizgateError {
    pub fn digest(msg: impl Into<String>) -> Self {
        Self::DigestUnavailable(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, QuizgateError>;
