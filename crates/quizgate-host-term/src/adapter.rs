//! Terminal host adapter implementation

use async_trait::async_trait;
use quizgate_host_api::{HostAdapter, HostError, HostEvent, HostResult, TimerView, Urgency};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::input::{parse_answer, parse_command};

const BAR_WIDTH: usize = 20;

/// Host adapter that talks to the user over a line-oriented terminal.
///
/// Output goes to stdout by default. Confirmation answers arrive on the same
/// input stream as commands: while a prompt is open, `y`/`n` lines answer it
/// and anything else is still read as a command.
pub struct TerminalHost {
    out: Mutex<Box<dyn Write + Send>>,
    pending: Mutex<Option<oneshot::Sender<bool>>>,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::with_output(std::io::stdout())
    }

    pub fn with_output(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
            pending: Mutex::new(None),
        }
    }

    /// Write one line of output
    pub fn print(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{}", text);
            let _ = out.flush();
        }
    }

    pub fn has_pending_confirmation(&self) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.is_some())
            .unwrap_or(false)
    }

    /// Deliver an answer to the open prompt. Returns `false` if none was open.
    pub fn answer(&self, accept: bool) -> bool {
        let sender = match self.pending.lock() {
            Ok(mut pending) => pending.take(),
            Err(_) => None,
        };
        match sender {
            Some(sender) => sender.send(accept).is_ok(),
            None => false,
        }
    }

    /// Route one input line: prompt answers are consumed here, everything
    /// else becomes a host event.
    pub fn handle_line(&self, line: &str) -> Option<HostEvent> {
        if let Some(accept) = parse_answer(line) {
            if self.answer(accept) {
                debug!(accept, "Prompt answered");
                return None;
            }
            return Some(HostEvent::Unrecognized {
                input: line.trim().to_string(),
                message: "No question is waiting for an answer".into(),
            });
        }

        match parse_command(line)? {
            Ok(command) => Some(HostEvent::Command(command)),
            Err(e) => Some(HostEvent::Unrecognized {
                input: line.trim().to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Start reading lines from `reader`. The channel yields commands and a
    /// final `InputClosed` at end of input.
    pub fn spawn_input<R>(
        self: &Arc<Self>,
        reader: R,
    ) -> (JoinHandle<()>, mpsc::UnboundedReceiver<HostEvent>)
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let host = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(event) = host.handle_line(&line)
                            && tx.send(event).is_err()
                        {
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("Input closed");
                        let _ = tx.send(HostEvent::InputClosed);
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read input");
                        let _ = tx.send(HostEvent::InputClosed);
                        break;
                    }
                }
            }
        });

        (handle, rx)
    }

    /// Read process stdin on a dedicated thread.
    ///
    /// A blocking read on tokio's stdin would hold runtime shutdown until the
    /// next line arrives; a detached thread does not.
    pub fn spawn_stdin(self: &Arc<Self>) -> mpsc::UnboundedReceiver<HostEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let host = Arc::clone(self);

        let spawned = std::thread::Builder::new()
            .name("quizgate-stdin".into())
            .spawn(move || {
                for line in std::io::stdin().lines() {
                    match line {
                        Ok(line) => {
                            if let Some(event) = host.handle_line(&line)
                                && tx.send(event).is_err()
                            {
                                return;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to read stdin");
                            break;
                        }
                    }
                }
                info!("Input closed");
                let _ = tx.send(HostEvent::InputClosed);
            });

        if let Err(e) = spawned {
            warn!(error = %e, "Failed to start stdin reader");
        }
        rx
    }

    fn render_bar(view: &TimerView) -> String {
        let filled = ((view.fill_ratio * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
        format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
    }
}

impl Default for TerminalHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostAdapter for TerminalHost {
    fn navigate_to(&self, path: &str) {
        self.print(&format!("-> {}", path));
    }

    async fn confirm(&self, message: &str) -> HostResult<bool> {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self
                .pending
                .lock()
                .map_err(|_| HostError::Internal("prompt state poisoned".into()))?;
            // A newer prompt replaces an unanswered one
            *pending = Some(tx);
        }

        self.print(&format!("{} [y/n]", message));
        rx.await.map_err(|_| HostError::Dismissed)
    }

    fn dismiss_confirmation(&self) {
        let dropped = match self.pending.lock() {
            Ok(mut pending) => pending.take().is_some(),
            Err(_) => false,
        };
        if dropped {
            self.print("(question withdrawn)");
        }
    }

    fn alert(&self, message: &str) {
        self.print(&format!("!! {}", message));
    }

    fn show_message(&self, message: &str) {
        self.print(message);
    }

    fn play_chime(&self) {
        // Terminal bell
        self.print("\x07*ding*");
    }

    fn render_timer(&self, view: &TimerView) {
        let marker = match view.urgency {
            Urgency::Calm => "",
            Urgency::Low => " !",
            Urgency::Medium => " !!",
            Urgency::High => " !!!",
            Urgency::Done => " done",
        };
        self.print(&format!(
            "[{}] {:>5} {}{}",
            view.panel,
            view.label(),
            Self::render_bar(view),
            marker
        ));
    }

    fn clear_timer(&self) {
        debug!("Timer display cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizgate_host_api::UserCommand;
    use quizgate_util::PanelId;

    /// Output sink the test can read back
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn make_host() -> (Arc<TerminalHost>, Captured) {
        let out = Captured::default();
        (Arc::new(TerminalHost::with_output(out.clone())), out)
    }

    #[tokio::test]
    async fn confirm_is_answered_from_input() {
        let (host, out) = make_host();

        let asking = host.clone();
        let question = tokio::spawn(async move { asking.confirm("Extend?").await });

        while !host.has_pending_confirmation() {
            tokio::task::yield_now().await;
        }
        assert_eq!(host.handle_line("y"), None);

        assert!(question.await.unwrap().unwrap());
        assert!(out.text().contains("Extend? [y/n]"));
    }

    #[tokio::test]
    async fn dismissed_confirm_errors() {
        let (host, _out) = make_host();

        let asking = host.clone();
        let question = tokio::spawn(async move { asking.confirm("Log out?").await });

        while !host.has_pending_confirmation() {
            tokio::task::yield_now().await;
        }
        host.dismiss_confirmation();

        assert!(matches!(question.await.unwrap(), Err(HostError::Dismissed)));
    }

    #[test]
    fn stray_answer_is_unrecognized() {
        let (host, _out) = make_host();
        assert!(matches!(
            host.handle_line("n"),
            Some(HostEvent::Unrecognized { .. })
        ));
    }

    #[test]
    fn commands_become_events() {
        let (host, _out) = make_host();
        assert_eq!(
            host.handle_line("open history"),
            Some(HostEvent::Command(UserCommand::Open(PanelId::new("history"))))
        );
        assert_eq!(host.handle_line(""), None);
    }

    #[tokio::test]
    async fn input_stream_ends_with_closed() {
        let (host, _out) = make_host();
        let input: &'static [u8] = b"activity\nstatus\n";

        let (handle, mut rx) = host.spawn_input(input);
        assert_eq!(rx.recv().await, Some(HostEvent::Command(UserCommand::Activity)));
        assert_eq!(rx.recv().await, Some(HostEvent::Command(UserCommand::Status)));
        assert_eq!(rx.recv().await, Some(HostEvent::InputClosed));
        handle.await.unwrap();
    }

    #[test]
    fn timer_line() {
        let (host, out) = make_host();
        host.render_timer(&TimerView::new(PanelId::new("math"), 5, 10));
        assert_eq!(out.text(), "[math]     5 ##########.......... !!\n");
    }
}
