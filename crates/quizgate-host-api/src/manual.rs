//! Deterministic scheduler for tests
//!
//! Time only moves when [`ManualScheduler::advance`] is called, and due tasks
//! are returned in firing order instead of being delivered on a channel.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::{FiredTask, ScheduledTask, Scheduler, TaskToken};

#[derive(Debug, Clone)]
struct Entry {
    task: ScheduledTask,
    due: Duration,
    every: Option<Duration>,
}

#[derive(Debug, Default)]
struct Inner {
    clock: Duration,
    next_token: u64,
    entries: BTreeMap<TaskToken, Entry>,
    /// One-shot tasks that fired but were not accepted yet
    fired_once: HashSet<TaskToken>,
}

impl Inner {
    fn insert(&mut self, delay: Duration, every: Option<Duration>, task: ScheduledTask) -> TaskToken {
        self.next_token += 1;
        let token = TaskToken::new(self.next_token);
        self.entries.insert(
            token,
            Entry {
                task,
                due: self.clock + delay,
                every,
            },
        );
        token
    }

    fn next_due(&self, until: Duration) -> Option<TaskToken> {
        self.entries
            .iter()
            .filter(|(_, e)| e.due <= until)
            .min_by_key(|(token, e)| (e.due, **token))
            .map(|(token, _)| *token)
    }
}

/// Virtual-time scheduler
#[derive(Debug, Default)]
pub struct ManualScheduler {
    inner: Mutex<Inner>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation
    pub fn elapsed(&self) -> Duration {
        self.inner.lock().unwrap().clock
    }

    /// Number of scheduled (not yet finished or cancelled) tasks
    pub fn pending_count(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    /// Number of scheduled tasks of one kind
    pub fn pending_of(&self, task: ScheduledTask) -> usize {
        self.inner
            .lock()
            .unwrap()
            .entries
            .values()
            .filter(|e| e.task == task)
            .count()
    }

    /// Move virtual time forward, returning every task that came due in order
    pub fn advance(&self, by: Duration) -> Vec<FiredTask> {
        let mut inner = self.inner.lock().unwrap();
        let target = inner.clock + by;
        let mut fired = Vec::new();

        while let Some(token) = inner.next_due(target) {
            let Some(entry) = inner.entries.get(&token).cloned() else {
                break;
            };
            inner.clock = entry.due;
            fired.push(FiredTask {
                token,
                task: entry.task,
            });

            match entry.every {
                Some(every) => {
                    if let Some(e) = inner.entries.get_mut(&token) {
                        e.due += every;
                    }
                }
                None => {
                    inner.entries.remove(&token);
                    inner.fired_once.insert(token);
                }
            }
        }

        inner.clock = target;
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_periodic(&self, every: Duration, task: ScheduledTask) -> TaskToken {
        let every = every.max(Duration::from_millis(1));
        self.inner.lock().unwrap().insert(every, Some(every), task)
    }

    fn schedule_once(&self, delay: Duration, task: ScheduledTask) -> TaskToken {
        self.inner.lock().unwrap().insert(delay, None, task)
    }

    fn cancel(&self, token: TaskToken) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.remove(&token);
        inner.fired_once.remove(&token);
    }

    fn is_live(&self, token: TaskToken) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.entries.contains_key(&token) || inner.fired_once.contains(&token)
    }

    fn accept(&self, fired: &FiredTask) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.contains_key(&fired.token) || inner.fired_once.remove(&fired.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_fires_every_interval() {
        let scheduler = ManualScheduler::new();
        let token = scheduler.schedule_periodic(Duration::from_secs(1), ScheduledTask::CategoryTick);

        assert!(scheduler.advance(Duration::from_millis(999)).is_empty());

        let fired = scheduler.advance(Duration::from_millis(2001));
        assert_eq!(fired.len(), 3);
        assert!(fired.iter().all(|f| f.token == token));
        assert_eq!(scheduler.elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn once_fires_a_single_time() {
        let scheduler = ManualScheduler::new();
        let token = scheduler.schedule_once(Duration::from_secs(5), ScheduledTask::SessionDeadline);

        let fired = scheduler.advance(Duration::from_secs(10));
        assert_eq!(fired, vec![FiredTask { token, task: ScheduledTask::SessionDeadline }]);
        assert!(scheduler.advance(Duration::from_secs(10)).is_empty());

        // Accepting retires it
        assert!(scheduler.accept(&fired[0]));
        assert!(!scheduler.accept(&fired[0]));
        assert!(!scheduler.is_live(token));
    }

    #[test]
    fn cancelled_task_is_rejected_after_firing() {
        let scheduler = ManualScheduler::new();
        let token = scheduler.schedule_periodic(Duration::from_secs(1), ScheduledTask::CategoryTick);

        let fired = scheduler.advance(Duration::from_secs(1));
        scheduler.cancel(token);

        assert!(!scheduler.accept(&fired[0]));
        assert!(scheduler.advance(Duration::from_secs(5)).is_empty());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn tasks_fire_in_due_order() {
        let scheduler = ManualScheduler::new();
        let slow = scheduler.schedule_periodic(Duration::from_secs(2), ScheduledTask::SessionCheck);
        let fast = scheduler.schedule_periodic(Duration::from_secs(1), ScheduledTask::CategoryTick);

        let fired: Vec<TaskToken> = scheduler
            .advance(Duration::from_secs(2))
            .into_iter()
            .map(|f| f.token)
            .collect();

        // At t=2 both are due; the older token goes first
        assert_eq!(fired, vec![fast, slow, fast]);
        assert_eq!(scheduler.pending_of(ScheduledTask::CategoryTick), 1);
    }
}
