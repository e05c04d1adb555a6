//! Mock host adapter for testing

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::{HostAdapter, HostError, HostResult, TimerView};

/// Everything the mock host was asked to do, in call order
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Navigate(String),
    Confirm(String),
    Dismiss,
    Alert(String),
    Message(String),
    Chime,
    Render(TimerView),
    ClearTimer,
}

/// Recording host adapter for unit/integration testing.
///
/// Confirmation answers are scripted with [`MockHost::answer_next`]. With
/// nothing scripted, `confirm` fails with `ConfirmationUnavailable`.
#[derive(Debug, Default)]
pub struct MockHost {
    calls: Mutex<Vec<HostCall>>,
    answers: Mutex<VecDeque<bool>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer for the next confirmation
    pub fn answer_next(&self, accept: bool) {
        self.answers.lock().unwrap().push_back(accept);
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn navigations(&self) -> Vec<String> {
        self.filter(|c| match c {
            HostCall::Navigate(path) => Some(path.clone()),
            _ => None,
        })
    }

    pub fn alerts(&self) -> Vec<String> {
        self.filter(|c| match c {
            HostCall::Alert(msg) => Some(msg.clone()),
            _ => None,
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.filter(|c| match c {
            HostCall::Message(msg) => Some(msg.clone()),
            _ => None,
        })
    }

    pub fn confirmations(&self) -> Vec<String> {
        self.filter(|c| match c {
            HostCall::Confirm(msg) => Some(msg.clone()),
            _ => None,
        })
    }

    pub fn renders(&self) -> Vec<TimerView> {
        self.filter(|c| match c {
            HostCall::Render(view) => Some(view.clone()),
            _ => None,
        })
    }

    pub fn chime_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, HostCall::Chime))
            .count()
    }

    fn filter<T>(&self, f: impl Fn(&HostCall) -> Option<T>) -> Vec<T> {
        self.calls.lock().unwrap().iter().filter_map(f).collect()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl HostAdapter for MockHost {
    fn navigate_to(&self, path: &str) {
        self.record(HostCall::Navigate(path.to_string()));
    }

    async fn confirm(&self, message: &str) -> HostResult<bool> {
        self.record(HostCall::Confirm(message.to_string()));
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| HostError::ConfirmationUnavailable("no scripted answer".into()))
    }

    fn dismiss_confirmation(&self) {
        self.record(HostCall::Dismiss);
    }

    fn alert(&self, message: &str) {
        self.record(HostCall::Alert(message.to_string()));
    }

    fn show_message(&self, message: &str) {
        self.record(HostCall::Message(message.to_string()));
    }

    fn play_chime(&self) {
        self.record(HostCall::Chime);
    }

    fn render_timer(&self, view: &TimerView) {
        self.record(HostCall::Render(view.clone()));
    }

    fn clear_timer(&self) {
        self.record(HostCall::ClearTimer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizgate_util::PanelId;

    #[tokio::test]
    async fn scripted_answers_in_order() {
        let host = MockHost::new();
        host.answer_next(true);
        host.answer_next(false);

        assert!(host.confirm("first?").await.unwrap());
        assert!(!host.confirm("second?").await.unwrap());
        assert!(matches!(
            host.confirm("third?").await,
            Err(HostError::ConfirmationUnavailable(_))
        ));
        assert_eq!(host.confirmations(), vec!["first?", "second?", "third?"]);
    }

    #[test]
    fn records_calls_in_order() {
        let host = MockHost::new();
        host.navigate_to("index.html");
        host.alert("Session expired");
        host.render_timer(&TimerView::new(PanelId::new("math"), 10, 30));
        host.play_chime();

        assert_eq!(host.navigations(), vec!["index.html"]);
        assert_eq!(host.alerts(), vec!["Session expired"]);
        assert_eq!(host.renders().len(), 1);
        assert_eq!(host.chime_count(), 1);
        assert_eq!(host.calls().len(), 4);

        host.clear_calls();
        assert!(host.calls().is_empty());
    }
}
