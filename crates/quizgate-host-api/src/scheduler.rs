//! Scheduler contract

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Cancellation handle for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskToken(u64);

impl TaskToken {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// What a scheduled task is for. The host loop dispatches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduledTask {
    /// One-second countdown step of the category timer
    CategoryTick,
    /// Periodic session validity check
    SessionCheck,
    /// One-shot check landing on the session deadline
    SessionDeadline,
}

/// A task that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTask {
    pub token: TaskToken,
    pub task: ScheduledTask,
}

/// Periodic and one-shot scheduling.
///
/// Firing is asynchronous: a fired task may already be queued when it is
/// cancelled. Consumers must pass every `FiredTask` through [`accept`]
/// before acting on it.
///
/// [`accept`]: Scheduler::accept
pub trait Scheduler: Send + Sync {
    /// Fire `task` every `every`, first after one full interval
    fn schedule_periodic(&self, every: Duration, task: ScheduledTask) -> TaskToken;

    /// Fire `task` once after `delay`
    fn schedule_once(&self, delay: Duration, task: ScheduledTask) -> TaskToken;

    /// Cancel a task. Cancelling an unknown or finished token is a no-op.
    fn cancel(&self, token: TaskToken);

    /// Whether the token still refers to a scheduled task
    fn is_live(&self, token: TaskToken) -> bool;

    /// Gate a fired task before dispatch.
    ///
    /// Returns `false` if the task was cancelled after it fired. Accepting a
    /// one-shot task retires its token.
    fn accept(&self, fired: &FiredTask) -> bool;
}
