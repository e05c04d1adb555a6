//! Category timer: one countdown bound to the open panel

use quizgate_host_api::{ScheduledTask, Scheduler, TaskToken, TimerView};
use quizgate_util::{PanelId, QuizgateError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::CoreEvent;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Countdown phase. There is no pause; closing a panel discards its timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Running,
    Expired,
}

/// State of the live countdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub panel: PanelId,
    pub remaining_seconds: u32,
    pub total_seconds: u32,
    pub phase: TimerPhase,
}

impl TimerState {
    pub fn view(&self) -> TimerView {
        TimerView::new(
            self.panel.clone(),
            self.remaining_seconds,
            self.total_seconds,
        )
    }
}

#[derive(Debug)]
struct ActiveTimer {
    token: TaskToken,
    state: TimerState,
}

/// Runs at most one countdown at a time.
///
/// The timer owns the token of its periodic tick. Opening any panel cancels
/// that tick before anything else happens, so two ticks are never live
/// together.
pub struct CategoryTimer {
    scheduler: Arc<dyn Scheduler>,
    open_panel: Option<PanelId>,
    active: Option<ActiveTimer>,
}

impl CategoryTimer {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            open_panel: None,
            active: None,
        }
    }

    /// Panel currently open, with or without a countdown
    pub fn open_panel(&self) -> Option<&PanelId> {
        self.open_panel.as_ref()
    }

    pub fn state(&self) -> Option<&TimerState> {
        self.active.as_ref().map(|a| &a.state)
    }

    /// Token of the live tick, if one is scheduled
    pub fn live_token(&self) -> Option<TaskToken> {
        self.active
            .as_ref()
            .filter(|a| a.state.phase == TimerPhase::Running)
            .map(|a| a.token)
    }

    /// Open `panel` with a countdown of `seconds`, superseding any running timer
    pub fn open(&mut self, panel: PanelId, seconds: u32) -> Result<TimerView> {
        if seconds == 0 {
            return Err(QuizgateError::InvalidDuration { panel, seconds });
        }

        self.stop();

        let token = self
            .scheduler
            .schedule_periodic(TICK_INTERVAL, ScheduledTask::CategoryTick);
        let state = TimerState {
            panel: panel.clone(),
            remaining_seconds: seconds,
            total_seconds: seconds,
            phase: TimerPhase::Running,
        };
        let view = state.view();

        info!(panel = %panel, seconds, token = %token, "Countdown started");

        self.open_panel = Some(panel);
        self.active = Some(ActiveTimer { token, state });
        Ok(view)
    }

    /// Open a panel that has no countdown. Any running timer stops.
    pub fn open_plain(&mut self, panel: PanelId) -> Vec<CoreEvent> {
        self.stop();
        debug!(panel = %panel, "Panel opened");
        self.open_panel = Some(panel.clone());
        vec![CoreEvent::PanelOpened { panel, view: None }]
    }

    /// Advance the countdown for a fired tick.
    ///
    /// Ticks carrying any token other than the live one are dropped.
    pub fn tick(&mut self, token: TaskToken) -> Vec<CoreEvent> {
        let Some(active) = self.active.as_mut() else {
            debug!(token = %token, "Tick with no live timer");
            return Vec::new();
        };
        if active.token != token || active.state.phase != TimerPhase::Running {
            debug!(token = %token, "Dropping stale tick");
            return Vec::new();
        }

        let state = &mut active.state;
        state.remaining_seconds = state.remaining_seconds.saturating_sub(1);

        let mut events = vec![CoreEvent::TimerTicked { view: state.view() }];

        if state.remaining_seconds == 0 {
            state.phase = TimerPhase::Expired;
            self.scheduler.cancel(active.token);

            info!(panel = %state.panel, "Countdown finished");

            events.push(CoreEvent::TimerCompleted {
                panel: state.panel.clone(),
            });
        }

        events
    }

    /// Close `panel`. Closing a panel that is not open does nothing.
    pub fn close(&mut self, panel: &PanelId) -> Vec<CoreEvent> {
        if self.open_panel.as_ref() != Some(panel) {
            debug!(panel = %panel, "Close for panel that is not open");
            return Vec::new();
        }

        self.stop();
        self.open_panel = None;
        debug!(panel = %panel, "Panel closed");
        vec![CoreEvent::PanelClosed {
            panel: panel.clone(),
        }]
    }

    /// Close `panel` if it is open, otherwise open it (with a countdown when
    /// `seconds` is set)
    pub fn toggle(&mut self, panel: PanelId, seconds: Option<u32>) -> Result<Vec<CoreEvent>> {
        if self.open_panel.as_ref() == Some(&panel) {
            return Ok(self.close(&panel));
        }

        match seconds {
            Some(seconds) => {
                let view = self.open(panel.clone(), seconds)?;
                Ok(vec![CoreEvent::PanelOpened {
                    panel,
                    view: Some(view),
                }])
            }
            None => Ok(self.open_plain(panel)),
        }
    }

    /// Cancel the live tick and drop the timer state
    fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            self.scheduler.cancel(active.token);
            debug!(panel = %active.state.panel, token = %active.token, "Countdown cancelled");
        }
    }
}

impl Drop for CategoryTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizgate_host_api::{FiredTask, ManualScheduler, Urgency};

    fn make_timer() -> (CategoryTimer, Arc<ManualScheduler>) {
        let scheduler = Arc::new(ManualScheduler::new());
        let timer = CategoryTimer::new(scheduler.clone());
        (timer, scheduler)
    }

    /// Advance one second and dispatch whatever fires, the way the host loop does
    fn step(timer: &mut CategoryTimer, scheduler: &ManualScheduler) -> (Vec<FiredTask>, Vec<CoreEvent>) {
        let fired = scheduler.advance(Duration::from_secs(1));
        let mut events = Vec::new();
        for task in &fired {
            if scheduler.accept(task) {
                events.extend(timer.tick(task.token));
            }
        }
        (fired, events)
    }

    #[test]
    fn open_returns_full_view() {
        let (mut timer, scheduler) = make_timer();
        let view = timer.open(PanelId::new("history"), 30).unwrap();

        assert_eq!(view.remaining_seconds, 30);
        assert_eq!(view.fill_ratio, 1.0);
        assert_eq!(view.urgency, Urgency::Calm);
        assert_eq!(scheduler.pending_of(ScheduledTask::CategoryTick), 1);
        assert_eq!(timer.state().unwrap().phase, TimerPhase::Running);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let (mut timer, scheduler) = make_timer();
        let err = timer.open(PanelId::new("history"), 0).unwrap_err();

        assert!(matches!(err, QuizgateError::InvalidDuration { seconds: 0, .. }));
        assert_eq!(scheduler.pending_count(), 0);
        assert!(timer.open_panel().is_none());
    }

    #[test]
    fn counts_down_to_completion_once() {
        let (mut timer, scheduler) = make_timer();
        timer.open(PanelId::new("math"), 5).unwrap();

        let mut completions = 0;
        let mut last_remaining = None;
        for _ in 0..5 {
            let (_, events) = step(&mut timer, &scheduler);
            for event in events {
                match event {
                    CoreEvent::TimerTicked { view } => last_remaining = Some(view.remaining_seconds),
                    CoreEvent::TimerCompleted { .. } => completions += 1,
                    other => panic!("unexpected event {:?}", other),
                }
            }
        }

        let state = timer.state().unwrap();
        assert_eq!(state.remaining_seconds, 0);
        assert_eq!(state.phase, TimerPhase::Expired);
        assert_eq!(last_remaining, Some(0));
        assert_eq!(completions, 1);

        // No sixth tick
        assert_eq!(scheduler.pending_count(), 0);
        let (fired, events) = step(&mut timer, &scheduler);
        assert!(fired.is_empty());
        assert!(events.is_empty());
        assert!(timer.live_token().is_none());
    }

    #[test]
    fn opening_b_supersedes_a() {
        let (mut timer, scheduler) = make_timer();
        timer.open(PanelId::new("a"), 10).unwrap();
        let a_token = timer.live_token().unwrap();
        step(&mut timer, &scheduler);

        timer.open(PanelId::new("b"), 10).unwrap();
        let b_token = timer.live_token().unwrap();
        assert_ne!(a_token, b_token);
        assert_eq!(scheduler.pending_of(ScheduledTask::CategoryTick), 1);

        for _ in 0..5 {
            let (fired, events) = step(&mut timer, &scheduler);
            assert!(fired.iter().all(|f| f.token == b_token));
            for event in events {
                if let CoreEvent::TimerTicked { view } = event {
                    assert_eq!(view.panel, PanelId::new("b"));
                }
            }
        }
        assert_eq!(timer.state().unwrap().remaining_seconds, 5);
    }

    #[test]
    fn tick_fired_before_cancel_is_dropped() {
        let (mut timer, scheduler) = make_timer();
        timer.open(PanelId::new("a"), 10).unwrap();

        // Fired but not yet dispatched when a new panel opens
        let fired = scheduler.advance(Duration::from_secs(1));
        timer.open(PanelId::new("b"), 10).unwrap();

        for task in &fired {
            assert!(!scheduler.accept(task));
            // Even if a host skipped the gate, the timer ignores it
            assert!(timer.tick(task.token).is_empty());
        }
        assert_eq!(timer.state().unwrap().remaining_seconds, 10);
    }

    #[test]
    fn close_stops_tick_and_reopen_restarts() {
        let (mut timer, scheduler) = make_timer();
        let panel = PanelId::new("sport");
        timer.open(panel.clone(), 10).unwrap();
        step(&mut timer, &scheduler);
        step(&mut timer, &scheduler);

        let events = timer.close(&panel);
        assert_eq!(events, vec![CoreEvent::PanelClosed { panel: panel.clone() }]);
        assert_eq!(scheduler.pending_count(), 0);
        assert!(timer.state().is_none());

        let view = timer.open(panel, 10).unwrap();
        assert_eq!(view.remaining_seconds, 10);
    }

    #[test]
    fn close_other_panel_is_noop() {
        let (mut timer, scheduler) = make_timer();
        timer.open(PanelId::new("a"), 10).unwrap();

        assert!(timer.close(&PanelId::new("b")).is_empty());
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn toggle_opens_then_closes() {
        let (mut timer, scheduler) = make_timer();
        let panel = PanelId::new("history");

        let events = timer.toggle(panel.clone(), Some(20)).unwrap();
        assert!(matches!(
            &events[..],
            [CoreEvent::PanelOpened { view: Some(v), .. }] if v.remaining_seconds == 20
        ));

        let events = timer.toggle(panel.clone(), Some(20)).unwrap();
        assert_eq!(events, vec![CoreEvent::PanelClosed { panel }]);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn plain_panel_supersedes_countdown() {
        let (mut timer, scheduler) = make_timer();
        timer.open(PanelId::new("a"), 10).unwrap();

        let events = timer.toggle(PanelId::new("rules"), None).unwrap();
        assert_eq!(
            events,
            vec![CoreEvent::PanelOpened {
                panel: PanelId::new("rules"),
                view: None,
            }]
        );
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(timer.open_panel(), Some(&PanelId::new("rules")));
        assert!(timer.state().is_none());
    }

    #[test]
    fn expired_panel_stays_open_until_toggled() {
        let (mut timer, scheduler) = make_timer();
        let panel = PanelId::new("math");
        timer.open(panel.clone(), 1).unwrap();
        step(&mut timer, &scheduler);

        assert_eq!(timer.open_panel(), Some(&panel));
        let events = timer.toggle(panel.clone(), Some(1)).unwrap();
        assert_eq!(events, vec![CoreEvent::PanelClosed { panel }]);
    }
}
