//! Render models handed to the host

use quizgate_util::PanelId;
use serde::{Deserialize, Serialize};

/// How close a countdown is to running out
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Calm,
    /// 10 seconds or less
    Low,
    /// 5 seconds or less
    Medium,
    /// 3 seconds or less
    High,
    /// Countdown finished
    Done,
}

impl Urgency {
    pub fn for_remaining(remaining_seconds: u32) -> Self {
        match remaining_seconds {
            0 => Self::Done,
            1..=3 => Self::High,
            4..=5 => Self::Medium,
            6..=10 => Self::Low,
            _ => Self::Calm,
        }
    }
}

/// Snapshot of the live countdown for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerView {
    pub panel: PanelId,
    pub remaining_seconds: u32,
    pub total_seconds: u32,
    /// `remaining / total`, in `0.0..=1.0`
    pub fill_ratio: f64,
    pub urgency: Urgency,
}

impl TimerView {
    pub fn new(panel: PanelId, remaining_seconds: u32, total_seconds: u32) -> Self {
        let fill_ratio = if total_seconds == 0 {
            0.0
        } else {
            f64::from(remaining_seconds.min(total_seconds)) / f64::from(total_seconds)
        };

        Self {
            panel,
            remaining_seconds,
            total_seconds,
            fill_ratio,
            urgency: Urgency::for_remaining(remaining_seconds),
        }
    }

    /// Angle of the filled arc of the countdown ring
    pub fn fill_degrees(&self) -> f64 {
        self.fill_ratio * 360.0
    }

    /// `m:ss` while a minute or more remains, bare seconds after that
    pub fn label(&self) -> String {
        let minutes = self.remaining_seconds / 60;
        let seconds = self.remaining_seconds % 60;
        if minutes > 0 {
            format!("{}:{:02}", minutes, seconds)
        } else {
            seconds.to_string()
        }
    }
}
