//! # Interpreter
//!
//! The interpreter is a single task that owns every piece of mutable state:
//! the activation state machine, the last action for "repeat that", the
//! volume ducking memory and the current search generation. Everything else
//! talks to it through [`InterpreterEvent`]s on one unbounded channel.
//!
//! Deadlines (session close, help hint) are plain [`Instant`]s raced against
//! the channel in `tokio::select!`. Replacing a deadline is an assignment, so
//! a timer from an earlier session can never fire late.
//!
//! ```text
//!  listener ──Transcript──▶ ┌─────────────┐ ──▶ Executor ──▶ capabilities
//!  search task ─Finished──▶ │ Interpreter │ ──▶ search::run (spawned)
//!  host ──Deactivate/Stop─▶ └─────────────┘ ──▶ watch<InterpreterStatus>
//! ```

use crate::activation::{ActivationMachine, CloseReason};
use crate::capabilities::{AppContext, Severity};
use crate::config::VoiceConfig;
use crate::executor::{ExecOutcome, Executor};
use crate::normalizer::WakeWord;
use crate::registry::{Action, CommandRegistry};
use crate::resolver::{Resolution, Resolver};
use crate::search::{self, SearchOutcome, SearchTickets};
use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, trace};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Everything the interpreter reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpreterEvent {
    Transcript { text: String, is_final: bool },
    /// The recognition stream opened or closed.
    ListeningChanged(bool),
    /// Speech recognition could not be started at all.
    RecognitionUnavailable(String),
    /// The speech source finished and will not produce more transcripts.
    InputClosed,
    SearchFinished { generation: u64, outcome: SearchOutcome },
    /// Close the session from outside, as "stop listening" would.
    Deactivate,
    Shutdown,
}

/// Snapshot published after every event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterpreterStatus {
    pub listening: bool,
    pub active: bool,
    pub searching: bool,
    pub input_closed: bool,
}

impl InterpreterStatus {
    /// No session, no search and no more input coming.
    pub fn is_settled(&self) -> bool {
        self.input_closed && !self.active && !self.searching
    }
}

/// Cloneable handle for feeding and observing a running interpreter.
#[derive(Debug, Clone)]
pub struct InterpreterHandle {
    events: mpsc::UnboundedSender<InterpreterEvent>,
    status: watch::Receiver<InterpreterStatus>,
}

impl InterpreterHandle {
    /// Sender for producers such as the recognition listener.
    pub fn sender(&self) -> mpsc::UnboundedSender<InterpreterEvent> {
        self.events.clone()
    }

    pub fn send(&self, event: InterpreterEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| anyhow!("Interpreter is no longer running"))
    }

    pub fn transcript(&self, text: &str, is_final: bool) -> Result<()> {
        self.send(InterpreterEvent::Transcript {
            text: text.to_string(),
            is_final,
        })
    }

    pub fn deactivate(&self) -> Result<()> {
        self.send(InterpreterEvent::Deactivate)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(InterpreterEvent::Shutdown)
    }

    pub fn status(&self) -> InterpreterStatus {
        *self.status.borrow()
    }

    /// Wait until the input is closed and the last session has ended.
    pub async fn settled(&self) -> Result<()> {
        let mut status = self.status.clone();
        status
            .wait_for(InterpreterStatus::is_settled)
            .await
            .context("Interpreter stopped before settling")?;
        Ok(())
    }
}

/// The voice command interpreter.
pub struct Interpreter {
    config: VoiceConfig,
    wake: WakeWord,
    resolver: Resolver,
    executor: Executor,
    activation: ActivationMachine,
    help_hint: Option<Instant>,
    last_action: Option<Action>,
    tickets: SearchTickets,
    searching: bool,
    listening: bool,
    input_closed: bool,
    inbox: mpsc::UnboundedReceiver<InterpreterEvent>,
    outbox: mpsc::UnboundedSender<InterpreterEvent>,
    status: watch::Sender<InterpreterStatus>,
}

impl Interpreter {
    /// Build an interpreter and the handle that drives it.
    ///
    /// # Errors
    ///
    /// Fails if the configured wake word cannot be compiled.
    pub fn new(ctx: AppContext, registry: CommandRegistry, config: VoiceConfig) -> Result<(Self, InterpreterHandle)> {
        let wake = WakeWord::new(&config.activation.wake_word)?;
        let resolver = Resolver::new(registry, &config.resolver);
        let ctx = ctx.with_call_timeout(config.activation.capability_timeout());
        let executor = Executor::new(ctx, &config.activation);
        let activation = ActivationMachine::new(config.activation.idle_timeout());

        let (outbox, inbox) = mpsc::unbounded_channel();
        let (status, status_rx) = watch::channel(InterpreterStatus::default());

        let handle = InterpreterHandle {
            events: outbox.clone(),
            status: status_rx,
        };
        let interpreter = Self {
            config,
            wake,
            resolver,
            executor,
            activation,
            help_hint: None,
            last_action: None,
            tickets: SearchTickets::new(),
            searching: false,
            listening: false,
            input_closed: false,
            inbox,
            outbox,
            status,
        };
        Ok((interpreter, handle))
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process events until [`InterpreterEvent::Shutdown`].
    pub async fn run(mut self) {
        info!("Interpreter started, wake word '{}'", self.wake.as_str());

        loop {
            let deadline = self.activation.deadline();
            let hint = self.help_hint;

            tokio::select! {
                event = self.inbox.recv() => match event {
                    Some(InterpreterEvent::Shutdown) | None => break,
                    Some(event) => self.handle(event).await,
                },
                _ = sleep_until(deadline) => self.on_deadline().await,
                _ = sleep_until(hint) => self.on_help_hint(),
            }

            self.publish();
        }

        // leave the volume the way we found it
        self.executor.restore().await;
        info!("Interpreter stopped");
    }

    async fn handle(&mut self, event: InterpreterEvent) {
        match event {
            InterpreterEvent::Transcript { text, is_final } => self.on_transcript(&text, is_final).await,
            InterpreterEvent::ListeningChanged(listening) => self.listening = listening,
            InterpreterEvent::RecognitionUnavailable(reason) => {
                error!("Voice assistant unavailable: {reason}");
                self.listening = false;
                self.input_closed = true;
                self.executor
                    .context()
                    .notify("Voice recognition is not available", Severity::Error);
            }
            InterpreterEvent::InputClosed => {
                self.listening = false;
                self.input_closed = true;
            }
            InterpreterEvent::SearchFinished { generation, outcome } => {
                self.on_search_finished(generation, outcome);
            }
            InterpreterEvent::Deactivate => self.deactivate().await,
            InterpreterEvent::Shutdown => {}
        }
    }

    async fn on_transcript(&mut self, text: &str, is_final: bool) {
        if !self.activation.is_active() {
            if self.wake.detect(text) {
                self.activate().await;
            }
            return;
        }

        if !is_final {
            trace!("Ignoring interim transcript '{text}'");
            return;
        }

        self.on_command(text).await;
    }

    async fn activate(&mut self) {
        if !self.activation.activate(Instant::now()) {
            return;
        }
        info!("Wake word detected, listening for a command");
        self.executor.duck().await;
        self.executor.context().notify(
            "Listening... What would you like to do?",
            Severity::Info,
        );
    }

    async fn on_command(&mut self, transcript: &str) {
        let now = Instant::now();
        self.activation.touch(now);
        self.help_hint = None;

        let command = self.wake.normalize(transcript);
        debug!("Command: '{command}'");

        match self.resolver.resolve(&command) {
            Resolution::Empty => {}
            Resolution::Search { query } => self.start_search(query),
            Resolution::Command { action, kind } => {
                debug!("Matched {action:?} ({kind:?})");
                match self.perform(action).await {
                    ExecOutcome::Deactivate => self.deactivate().await,
                    ExecOutcome::Done => self
                        .activation
                        .close_after(now, self.config.activation.post_command_delay()),
                }
            }
            Resolution::Unmatched => {
                info!("Unrecognized command: '{command}'");
                self.executor.context().notify(
                    &format!("I didn't understand \"{command}\""),
                    Severity::Warning,
                );
                self.help_hint = Some(now + self.config.activation.help_hint_delay());
            }
        }
    }

    /// Execute `action`, resolving "repeat that" against the last action.
    async fn perform(&mut self, action: Action) -> ExecOutcome {
        let action = if action == Action::Repeat {
            match self.last_action.clone() {
                Some(last) => {
                    self.executor
                        .context()
                        .notify("Repeating last command", Severity::Info);
                    last
                }
                None => {
                    self.executor
                        .context()
                        .notify("No previous command to repeat", Severity::Warning);
                    return ExecOutcome::Done;
                }
            }
        } else {
            if action.is_repeatable() {
                self.last_action = Some(action.clone());
            }
            action
        };

        self.executor.execute(&action).await
    }

    fn start_search(&mut self, query: String) {
        let ticket = self.tickets.issue();
        let generation = ticket.generation();
        info!("Starting search #{generation} for '{query}'");

        self.searching = true;
        let ctx = self.executor.context().clone();
        let config = self.config.search.clone();
        let outbox = self.outbox.clone();

        tokio::spawn(async move {
            let outcome = search::run(ctx, query, ticket, config).await;
            let _ = outbox.send(InterpreterEvent::SearchFinished { generation, outcome });
        });
    }

    fn on_search_finished(&mut self, generation: u64, outcome: SearchOutcome) {
        if !self.tickets.is_current(generation) {
            debug!("Ignoring result of superseded search #{generation}");
            return;
        }

        debug!("Search #{generation} finished: {outcome:?}");
        self.searching = false;
        if let Some(delay) = outcome.close_delay(&self.config.search, &self.config.activation) {
            self.activation.close_after(Instant::now(), delay);
        }
    }

    async fn on_deadline(&mut self) {
        match self.activation.expired(Instant::now()) {
            Some(CloseReason::Idle) => {
                debug!("No command within {:?}", self.config.activation.idle_timeout());
                self.deactivate().await;
            }
            Some(CloseReason::Finished) => self.deactivate().await,
            None => {}
        }
    }

    fn on_help_hint(&mut self) {
        self.help_hint = None;
        self.executor.context().notify(
            "Try saying \"help\" to see available commands",
            Severity::Info,
        );
    }

    /// Return to dormant. Does nothing when already dormant.
    async fn deactivate(&mut self) {
        if !self.activation.deactivate() {
            return;
        }
        self.help_hint = None;
        self.executor.restore().await;

        info!("Session closed");
        self.executor.context().notify_for(
            &format!(
                "Assistant deactivated. Say \"{}\" to activate again.",
                self.wake.as_str()
            ),
            Severity::Info,
            Duration::from_millis(2000),
        );
    }

    fn publish(&self) {
        let next = InterpreterStatus {
            listening: self.listening,
            active: self.activation.is_active(),
            searching: self.searching,
            input_closed: self.input_closed,
        };
        self.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

/// Sleep until `at`, or forever when there is nothing to wait for.
async fn sleep_until(at: Option<Instant>) {
    match at {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
