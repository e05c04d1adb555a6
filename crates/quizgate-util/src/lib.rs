//! Shared utilities for quizgate
//!
//! This crate provides:
//! - ID types (PanelId, PromptId)
//! - Time utilities (overridable clock, epoch-millis codec, duration formatting)
//! - Error types
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
