//! Terminal host adapter for quizgate
//!
//! Provides:
//! - Line command parsing from stdin
//! - Yes/no confirmation prompts answered on the same input stream
//! - Countdown, alert and chime output on stdout
//! - A tokio-backed `Scheduler`

mod adapter;
mod input;
mod scheduler;

pub use adapter::*;
pub use input::*;
pub use scheduler::*;
