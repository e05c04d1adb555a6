//! Tokio-backed scheduler

use quizgate_host_api::{FiredTask, ScheduledTask, Scheduler, TaskToken};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

struct Entry {
    handle: JoinHandle<()>,
    periodic: bool,
}

/// Scheduler running each task as a spawned tokio task.
///
/// Fired tasks are delivered on the channel returned by [`TokioScheduler::new`].
/// Must be used from within a tokio runtime.
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<FiredTask>,
    next_token: AtomicU64,
    entries: Mutex<HashMap<TaskToken, Entry>>,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FiredTask>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            tx,
            next_token: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        };
        (scheduler, rx)
    }

    /// Number of live tasks
    pub fn live_count(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    fn allocate(&self) -> TaskToken {
        TaskToken::new(self.next_token.fetch_add(1, Ordering::SeqCst))
    }

    fn register(&self, token: TaskToken, handle: JoinHandle<()>, periodic: bool) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(token, Entry { handle, periodic });
            }
            Err(_) => {
                warn!(token = %token, "Scheduler state poisoned, dropping task");
                handle.abort();
            }
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_periodic(&self, every: Duration, task: ScheduledTask) -> TaskToken {
        let token = self.allocate();
        let tx = self.tx.clone();
        let every = every.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + every, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(FiredTask { token, task }).is_err() {
                    break;
                }
            }
        });

        debug!(token = %token, task = ?task, every_ms = every.as_millis() as u64, "Scheduled periodic task");
        self.register(token, handle, true);
        token
    }

    fn schedule_once(&self, delay: Duration, task: ScheduledTask) -> TaskToken {
        let token = self.allocate();
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(FiredTask { token, task });
        });

        debug!(token = %token, task = ?task, delay_ms = delay.as_millis() as u64, "Scheduled one-shot task");
        self.register(token, handle, false);
        token
    }

    fn cancel(&self, token: TaskToken) {
        if let Ok(mut entries) = self.entries.lock()
            && let Some(entry) = entries.remove(&token)
        {
            entry.handle.abort();
            debug!(token = %token, "Cancelled task");
        }
    }

    fn is_live(&self, token: TaskToken) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(&token))
            .unwrap_or(false)
    }

    fn accept(&self, fired: &FiredTask) -> bool {
        let Ok(mut entries) = self.entries.lock() else {
            return false;
        };
        match entries.get(&fired.token) {
            Some(entry) if entry.periodic => true,
            Some(_) => {
                entries.remove(&fired.token);
                true
            }
            None => false,
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        if let Ok(entries) = self.entries.get_mut() {
            for (_, entry) in entries.drain() {
                entry.handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn once_fires_and_retires() {
        let (scheduler, mut rx) = TokioScheduler::new();
        let token = scheduler.schedule_once(Duration::from_millis(10), ScheduledTask::SessionDeadline);

        let fired = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert_eq!(fired.token, token);
        assert!(scheduler.accept(&fired));
        assert!(!scheduler.is_live(token));
        assert!(!scheduler.accept(&fired));
    }

    #[tokio::test]
    async fn periodic_keeps_firing() {
        let (scheduler, mut rx) = TokioScheduler::new();
        let token = scheduler.schedule_periodic(Duration::from_millis(10), ScheduledTask::CategoryTick);

        for _ in 0..3 {
            let fired = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
            assert_eq!(fired.token, token);
            assert!(scheduler.accept(&fired));
        }
        assert!(scheduler.is_live(token));
    }

    #[tokio::test]
    async fn cancelled_task_is_rejected() {
        let (scheduler, mut rx) = TokioScheduler::new();
        let token = scheduler.schedule_periodic(Duration::from_millis(10), ScheduledTask::CategoryTick);

        let fired = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        scheduler.cancel(token);

        assert!(!scheduler.accept(&fired));
        assert_eq!(scheduler.live_count(), 0);

        // Anything still queued is rejected too
        while let Ok(Some(late)) = timeout(Duration::from_millis(50), rx.recv()).await {
            assert!(!scheduler.accept(&late));
        }
    }
}
