//! Host adapter and scheduler interfaces for quizgate
//!
//! This crate defines the boundary between the core state machines and
//! whatever hosts them: navigation, confirmation prompts, alerts, timer
//! rendering, and periodic/one-shot scheduling. It contains no platform
//! code itself, only the contracts plus deterministic test doubles.

mod events;
mod manual;
mod mock;
mod scheduler;
mod traits;
mod view;

pub use events::*;
pub use manual::*;
pub use mock::*;
pub use scheduler::*;
pub use traits::*;
pub use view::*;
