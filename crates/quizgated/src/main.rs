//! quizgate - terminal host for the quiz gate
//!
//! This is the main entry point. It wires together:
//! - Configuration loading
//! - Store initialization
//! - Session guard, category timer and login
//! - Terminal host adapter and tokio scheduler
//!
//! Everything runs on one current-thread runtime. The loop owns all state,
//! so each event is handled to completion before the next one.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use quizgate_config::{load_config, Settings};
use quizgate_core::{
    Authenticator, CategoryTimer, CoreEvent, Decision, SessionGuard, LOGOUT_CONFIRM_MESSAGE,
};
use quizgate_host_api::{
    FiredTask, HostAdapter, HostError, HostEvent, HostResult, ScheduledTask, Scheduler,
    TaskToken, UserCommand,
};
use quizgate_host_term::{TerminalHost, TokioScheduler, HELP_TEXT};
use quizgate_store::{AuditEvent, AuditEventType, MemoryStore, SqliteStore, Store};
use quizgate_util::{
    default_config_path, format_datetime_full, format_duration, PanelId, PromptId, QuizgateError,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Deadline checks land this far past the computed deadline
const DEADLINE_SLACK: Duration = Duration::from_millis(50);

/// quizgate - quiz categories behind a session gate
#[derive(Parser, Debug)]
#[command(name = "quizgate")]
#[command(about = "Quiz category timer behind a local session gate", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/quizgate/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set QUIZGATE_DATA_DIR env var)
    #[arg(short, long, env = "QUIZGATE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Keep the session in memory instead of on disk
    #[arg(long)]
    in_memory: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Which page the user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Login,
    Protected,
}

/// What an open confirmation is asking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    ExtendSession(PromptId),
    Logout,
}

struct PendingPrompt {
    kind: PromptKind,
    task: JoinHandle<()>,
}

struct PromptAnswer {
    kind: PromptKind,
    answer: HostResult<bool>,
}

/// Whether the loop keeps going after a command
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Main service state
struct Service {
    settings: Settings,
    store: Arc<dyn Store>,
    guard: SessionGuard,
    timer: CategoryTimer,
    auth: Authenticator,
    host: Arc<TerminalHost>,
    scheduler: Arc<TokioScheduler>,
    fired_rx: Option<mpsc::UnboundedReceiver<FiredTask>>,
    answers_tx: mpsc::UnboundedSender<PromptAnswer>,
    answers_rx: Option<mpsc::UnboundedReceiver<PromptAnswer>>,
    page: Page,
    session_check: Option<TaskToken>,
    deadline_check: Option<TaskToken>,
    prompt: Option<PendingPrompt>,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let settings = if args.config.exists() {
            let settings = load_config(&args.config)
                .with_context(|| format!("Failed to load config from {:?}", args.config))?;
            info!(
                config_path = %args.config.display(),
                panel_count = settings.panels.len(),
                "Configuration loaded"
            );
            settings
        } else {
            warn!(
                config_path = %args.config.display(),
                "Config file not found, using defaults"
            );
            Settings::default()
        };

        let store: Arc<dyn Store> = if args.in_memory {
            info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        } else {
            let data_dir = args
                .data_dir
                .clone()
                .unwrap_or_else(|| settings.service.data_dir.clone());

            std::fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

            let db_path = data_dir.join("quizgate.db");
            let store = SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?;
            info!(db_path = %db_path.display(), "Store initialized");
            Arc::new(store)
        };

        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted))?;
        store.append_audit(AuditEvent::new(AuditEventType::ConfigLoaded {
            panel_count: settings.panels.len(),
        }))?;

        let (scheduler, fired_rx) = TokioScheduler::new();
        let scheduler = Arc::new(scheduler);

        let guard = SessionGuard::new(settings.session, settings.pages.login.clone(), store.clone())
            .with_logout_confirmation(settings.service.confirm_logout);
        let timer = CategoryTimer::new(scheduler.clone());
        let auth = Authenticator::new(
            &settings.credentials,
            settings.pages.clone(),
            &settings.session,
            store.clone(),
        );

        let (answers_tx, answers_rx) = mpsc::unbounded_channel();

        Ok(Self {
            settings,
            store,
            guard,
            timer,
            auth,
            host: Arc::new(TerminalHost::new()),
            scheduler,
            fired_rx: Some(fired_rx),
            answers_tx,
            answers_rx: Some(answers_rx),
            page: Page::Login,
            session_check: None,
            deadline_check: None,
            prompt: None,
        })
    }

    async fn run(mut self) -> Result<()> {
        let mut host_events = self.host.spawn_stdin();

        let mut fired_rx = self
            .fired_rx
            .take()
            .context("Scheduler receiver already taken")?;
        let mut answers_rx = self
            .answers_rx
            .take()
            .context("Prompt receiver already taken")?;

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

        self.host.print("quizgate - type 'help' for commands");

        // Landing on the login page
        let events = self.auth.check_existing(quizgate_util::now());
        self.apply(events);

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                Some(fired) = fired_rx.recv() => {
                    self.handle_fired(fired);
                }

                Some(host_event) = host_events.recv() => {
                    if self.handle_host_event(host_event) == Flow::Quit {
                        break;
                    }
                }

                Some(answer) = answers_rx.recv() => {
                    self.handle_answer(answer);
                }
            }
        }

        info!("Shutting down quizgate");
        self.shutdown();
        Ok(())
    }

    fn shutdown(&mut self) {
        self.cancel_prompt();
        self.cancel_session_checks();
        if let Some(panel) = self.timer.open_panel().cloned() {
            self.timer.close(&panel);
        }

        if let Err(e) = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStopped))
        {
            warn!(error = %e, "Failed to log service shutdown");
        }

        info!("Shutdown complete");
    }

    fn handle_fired(&mut self, fired: FiredTask) {
        if !self.scheduler.accept(&fired) {
            debug!(token = %fired.token, task = ?fired.task, "Dropping cancelled task");
            return;
        }

        match fired.task {
            ScheduledTask::CategoryTick => {
                let events = self.timer.tick(fired.token);
                self.apply(events);
            }
            ScheduledTask::SessionCheck => self.check_session(),
            ScheduledTask::SessionDeadline => {
                if self.deadline_check == Some(fired.token) {
                    self.deadline_check = None;
                }
                self.check_session();
            }
        }
    }

    fn handle_host_event(&mut self, event: HostEvent) -> Flow {
        match event {
            HostEvent::Command(command) => self.handle_command(command),
            HostEvent::Unrecognized { input, message } => {
                debug!(input = %input, "Unrecognized input");
                self.host.show_message(&message);
                Flow::Continue
            }
            HostEvent::InputClosed => Flow::Quit,
        }
    }

    fn handle_command(&mut self, command: UserCommand) -> Flow {
        let now = quizgate_util::now();

        if self.page == Page::Protected && command.is_activity() {
            // The periodic check may not have run since the last input
            self.check_session();
            if self.page != Page::Protected {
                return Flow::Continue;
            }
            let events = self.guard.record_activity(now);
            self.apply(events);
            self.arm_deadline_check();
        }

        match command {
            UserCommand::Login { username, password } => {
                if self.page == Page::Protected {
                    self.host.show_message("Already logged in");
                } else {
                    let outcome = self.auth.login(&username, &password, now);
                    self.apply(outcome.events());
                }
            }

            UserCommand::Quit => return Flow::Quit,

            UserCommand::Help => self.host.print(HELP_TEXT),

            UserCommand::Panels => self.list_panels(),

            UserCommand::Show => match self.page {
                Page::Protected => self.check_session(),
                Page::Login => {
                    let events = self.auth.check_existing(now);
                    self.apply(events);
                }
            },

            _ if self.page == Page::Login => {
                self.host.show_message("Please log in first");
            }

            UserCommand::Open(panel) => self.open_panel(panel),

            UserCommand::Close(panel) => {
                let events = self.timer.close(&panel);
                self.apply(events);
            }

            UserCommand::Toggle(panel) => match self.settings.get_panel(&panel) {
                Some(config) => match self.timer.toggle(panel, config.duration_seconds) {
                    Ok(events) => self.apply(events),
                    Err(e) => self.host.show_message(&e.to_string()),
                },
                None => self
                    .host
                    .show_message(&QuizgateError::PanelNotFound(panel).to_string()),
            },

            UserCommand::Activity => {}

            UserCommand::Extend => {
                let events = self.guard.extend_session(now);
                self.apply(events);
            }

            UserCommand::Logout => {
                if self.guard.requires_logout_confirmation() {
                    self.ask(PromptKind::Logout, LOGOUT_CONFIRM_MESSAGE.to_string());
                } else {
                    let events = self.guard.logout(true);
                    self.apply(events);
                }
            }

            UserCommand::Status => self.print_status(now),
        }

        Flow::Continue
    }

    fn open_panel(&mut self, panel: PanelId) {
        let Some(config) = self.settings.get_panel(&panel) else {
            self.host
                .show_message(&QuizgateError::PanelNotFound(panel).to_string());
            return;
        };

        let events = match config.duration_seconds {
            Some(seconds) => match self.timer.open(panel.clone(), seconds) {
                Ok(view) => vec![CoreEvent::PanelOpened {
                    panel,
                    view: Some(view),
                }],
                Err(e) => {
                    self.host.show_message(&e.to_string());
                    return;
                }
            },
            None => self.timer.open_plain(panel),
        };
        self.apply(events);
    }

    fn handle_answer(&mut self, answer: PromptAnswer) {
        if self.prompt.as_ref().map(|p| p.kind) != Some(answer.kind) {
            debug!(kind = ?answer.kind, "Ignoring answer to a withdrawn prompt");
            return;
        }
        self.prompt = None;

        let accepted = match answer.answer {
            Ok(accepted) => accepted,
            Err(HostError::Dismissed) => return,
            Err(e) => {
                warn!(error = %e, "Confirmation failed, treating as declined");
                false
            }
        };

        let now = quizgate_util::now();
        let events = match answer.kind {
            PromptKind::ExtendSession(prompt) => self.guard.resolve_warning(prompt, accepted, now),
            PromptKind::Logout => self.guard.logout(accepted),
        };
        self.apply(events);
    }

    /// Run a periodic or on-demand session check
    fn check_session(&mut self) {
        if self.page != Page::Protected {
            return;
        }

        let evaluation = self.guard.evaluate(quizgate_util::now());
        debug!(decision = ?evaluation.decision, "Session checked");
        let expired = matches!(evaluation.decision, Decision::Expired(_));

        self.apply(evaluation.events);
        if !expired {
            self.arm_deadline_check();
        }
    }

    /// Apply core events to the host and to the loop's own state
    fn apply(&mut self, events: Vec<CoreEvent>) {
        for event in events {
            match event {
                CoreEvent::WarningIssued {
                    prompt, message, ..
                } => {
                    self.ask(PromptKind::ExtendSession(prompt), message);
                }

                CoreEvent::PromptCancelled { prompt } => {
                    if self.prompt.as_ref().map(|p| p.kind)
                        == Some(PromptKind::ExtendSession(prompt))
                    {
                        self.cancel_prompt();
                    }
                }

                CoreEvent::SessionExtended { automatic, .. } => {
                    if !automatic {
                        self.host.show_message("Session extended");
                    }
                    self.arm_deadline_check();
                }

                CoreEvent::SessionEnded { alert, .. } => {
                    // Nothing may stay open across an expiry
                    self.cancel_prompt();
                    if let Some(alert) = alert {
                        self.host.alert(&alert);
                    }
                }

                CoreEvent::Navigate { path } => {
                    self.host.navigate_to(&path);
                    if path == self.settings.pages.home {
                        self.enter_protected();
                    } else if path == self.settings.pages.login {
                        self.leave_protected();
                    }
                }

                CoreEvent::LoggedIn { username } => {
                    self.host.show_message(&format!("Welcome, {}", username));
                }

                CoreEvent::Notice { message } => self.host.show_message(&message),

                CoreEvent::PanelOpened { panel, view } => match view {
                    Some(view) => self.host.render_timer(&view),
                    None => {
                        self.host.clear_timer();
                        let label = self
                            .settings
                            .get_panel(&panel)
                            .map(|p| p.label.clone())
                            .unwrap_or_else(|| panel.to_string());
                        self.host.show_message(&format!("{} opened", label));
                    }
                },

                CoreEvent::PanelClosed { .. } => self.host.clear_timer(),

                CoreEvent::TimerTicked { view } => self.host.render_timer(&view),

                CoreEvent::TimerCompleted { panel } => {
                    debug!(panel = %panel, "Countdown completed");
                    self.host.play_chime();
                }
            }
        }
    }

    fn enter_protected(&mut self) {
        if self.page == Page::Protected {
            return;
        }
        self.page = Page::Protected;

        if self.session_check.is_none() {
            let token = self.scheduler.schedule_periodic(
                self.settings.session.check_interval,
                ScheduledTask::SessionCheck,
            );
            self.session_check = Some(token);
        }

        info!("Entered protected page");
        self.check_session();
    }

    fn leave_protected(&mut self) {
        self.page = Page::Login;
        self.cancel_prompt();
        self.cancel_session_checks();

        if let Some(panel) = self.timer.open_panel().cloned() {
            let events = self.timer.close(&panel);
            self.apply(events);
        }
    }

    /// Land a check on the session deadline when it comes before the next
    /// periodic check
    fn arm_deadline_check(&mut self) {
        if let Some(token) = self.deadline_check.take() {
            self.scheduler.cancel(token);
        }
        if self.page != Page::Protected {
            return;
        }

        let now = quizgate_util::now();
        if let Some(remaining) = self.guard.next_deadline(now)
            && remaining < self.settings.session.check_interval
        {
            let token = self
                .scheduler
                .schedule_once(remaining + DEADLINE_SLACK, ScheduledTask::SessionDeadline);
            debug!(token = %token, remaining_ms = remaining.as_millis() as u64, "Deadline check armed");
            self.deadline_check = Some(token);
        }
    }

    fn cancel_session_checks(&mut self) {
        for token in [self.session_check.take(), self.deadline_check.take()]
            .into_iter()
            .flatten()
        {
            self.scheduler.cancel(token);
        }
    }

    /// Ask the user a yes/no question without blocking the loop
    fn ask(&mut self, kind: PromptKind, message: String) {
        // One question at a time; a newer one replaces an unanswered one
        if let Some(previous) = self.prompt.take() {
            previous.task.abort();
            if let PromptKind::ExtendSession(prompt) = previous.kind {
                let events = self.guard.resolve_warning(prompt, false, quizgate_util::now());
                self.apply(events);
            }
        }

        let host = self.host.clone();
        let tx = self.answers_tx.clone();
        let task = tokio::spawn(async move {
            let answer = host.confirm(&message).await;
            let _ = tx.send(PromptAnswer { kind, answer });
        });

        self.prompt = Some(PendingPrompt { kind, task });
    }

    fn cancel_prompt(&mut self) {
        if let Some(prompt) = self.prompt.take() {
            debug!(kind = ?prompt.kind, "Withdrawing prompt");
            prompt.task.abort();
            self.host.dismiss_confirmation();
        }
    }

    fn list_panels(&self) {
        if self.settings.panels.is_empty() {
            self.host.print("No panels configured");
            return;
        }
        for panel in &self.settings.panels {
            let timer = match panel.duration_seconds {
                Some(secs) => format!("{}s", secs),
                None => "-".to_string(),
            };
            let marker = if self.timer.open_panel() == Some(&panel.id) {
                "*"
            } else {
                " "
            };
            self.host
                .print(&format!("{} {:<12} {:>5}  {}", marker, panel.id.as_str(), timer, panel.label));
        }
    }

    fn print_status(&self, now: DateTime<Local>) {
        let Some(user) = self.guard.current_user(now) else {
            self.host.print("No active session");
            return;
        };

        self.host.print(&format!(
            "User:           {}",
            user.username.as_deref().unwrap_or("-")
        ));
        self.host.print(&format!(
            "Logged in:      {}",
            format_datetime_full(&user.login_time)
        ));
        self.host.print(&format!(
            "Expires in:     {}",
            user.time_remaining_formatted
        ));
        self.host.print(&format!(
            "Last activity:  {}",
            format_datetime_full(&user.last_activity)
        ));
        self.host.print(&format!(
            "Session valid:  {}",
            user.session_valid
        ));
        self.host.print(&format!("User active:    {}", user.user_active));

        if let Some(stats) = self.guard.session_stats(now) {
            self.host.print(&format!(
                "Used:           {:.1}% ({} of {})",
                stats.percentage_used,
                format_duration(stats.time_elapsed),
                format_duration(stats.session_duration)
            ));
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout is the user interface
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "quizgate starting");

    if quizgate_util::is_mock_time_active() {
        warn!("Mock time is active");
    }

    let service = Service::new(&args)?;
    service.run().await
}
