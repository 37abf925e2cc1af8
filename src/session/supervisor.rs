use super::config::{ListenMode, SupervisorConfig};
use super::state::{AssistantEvent, ConversationMessage, Snapshot, SupervisorState};
use crate::recognition::{
    ErrorCode, RecognitionProvider, RecognitionSession, RecognitionSettings, ResultEvent,
    SessionEvent, SessionEventKind, SessionEventSender, SessionId,
};
use crate::wake::WakeWordFilter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub(crate) const UNSUPPORTED_MESSAGE: &str = "Speech recognition is not supported on this host";

/// Requests from handles; each carries its reply channel
pub(crate) enum Command {
    Start(oneshot::Sender<SupervisorState>),
    Stop(oneshot::Sender<SupervisorState>),
    SetEnabled(bool, oneshot::Sender<SupervisorState>),
    Snapshot(oneshot::Sender<Snapshot>),
    Shutdown(oneshot::Sender<()>),
}

/// Everything the supervisor reacts to, in arrival order
pub(crate) enum Input {
    Command(Command),
    Session(SessionEvent),
    RestartDue(u64),
}

struct ActiveSession {
    id: SessionId,
    handle: Box<dyn RecognitionSession>,
}

struct PendingRestart {
    token: u64,
    task: JoinHandle<()>,
}

/// Owner of the recognition session
///
/// Runs as a single task; commands, session callbacks and restart timers are
/// all handled one at a time from the same queue, so no locking is needed.
pub(crate) struct Supervisor {
    provider: Arc<dyn RecognitionProvider>,
    config: SupervisorConfig,
    settings: RecognitionSettings,
    filter: Option<WakeWordFilter>,

    /// Weak so that the queue closes once every handle is dropped
    inputs: mpsc::WeakUnboundedSender<Input>,

    session: Option<ActiveSession>,
    next_session_id: u64,
    pending_restart: Option<PendingRestart>,
    next_restart_token: u64,

    /// Listening was requested and not since stopped
    wants_listening: bool,

    /// Slot index and transcript last run through the wake filter
    last_evaluated: Option<(usize, String)>,

    state: SupervisorState,
    messages: Vec<ConversationMessage>,
    state_tx: watch::Sender<SupervisorState>,
    events_tx: broadcast::Sender<AssistantEvent>,
}

impl Supervisor {
    pub(crate) fn new(
        provider: Arc<dyn RecognitionProvider>,
        config: SupervisorConfig,
        settings: RecognitionSettings,
        filter: Option<WakeWordFilter>,
        inputs: mpsc::WeakUnboundedSender<Input>,
        state_tx: watch::Sender<SupervisorState>,
        events_tx: broadcast::Sender<AssistantEvent>,
    ) -> Self {
        let state = state_tx.borrow().clone();

        Self {
            provider,
            config,
            settings,
            filter,
            inputs,
            session: None,
            next_session_id: 1,
            pending_restart: None,
            next_restart_token: 1,
            wants_listening: false,
            last_evaluated: None,
            state,
            messages: Vec::new(),
            state_tx,
            events_tx,
        }
    }

    pub(crate) async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<Input>) {
        info!(
            "Supervisor started (provider={}, mode={:?}, supported={})",
            self.provider.name(),
            self.config.mode,
            self.state.has_support
        );

        while let Some(input) = inputs.recv().await {
            match input {
                Input::Command(command) => {
                    if !self.handle_command(command) {
                        info!("Supervisor shut down");
                        return;
                    }
                }
                Input::Session(event) => self.handle_session_event(event),
                Input::RestartDue(token) => self.handle_restart_due(token),
            }
            self.publish_state();
        }

        self.teardown();
        info!("Supervisor stopped: all handles dropped");
    }

    /// Returns false once the supervisor should stop running
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Start(reply) => {
                self.start();
                self.publish_state();
                let _ = reply.send(self.state.clone());
            }
            Command::Stop(reply) => {
                self.stop();
                self.publish_state();
                let _ = reply.send(self.state.clone());
            }
            Command::SetEnabled(enabled, reply) => {
                self.set_enabled(enabled);
                self.publish_state();
                let _ = reply.send(self.state.clone());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(Snapshot {
                    state: self.state.clone(),
                    messages: self.messages.clone(),
                });
            }
            Command::Shutdown(reply) => {
                self.teardown();
                self.publish_state();
                let _ = reply.send(());
                return false;
            }
        }

        true
    }

    fn start(&mut self) {
        if !self.state.has_support {
            debug!("Ignoring start: {}", UNSUPPORTED_MESSAGE);
            self.state.error = Some(UNSUPPORTED_MESSAGE.to_string());
            return;
        }

        if !self.state.enabled {
            debug!("Ignoring start while disabled");
            return;
        }

        self.wants_listening = true;
        self.cancel_pending_restart();

        if let Some(active) = &self.session {
            debug!("Start requested but {} is already active", active.id);
            return;
        }

        self.open_session();
    }

    fn stop(&mut self) {
        self.wants_listening = false;
        self.cancel_pending_restart();
        self.close_session();
        self.state.is_listening = false;

        if self.config.mode == ListenMode::Dialogue {
            self.state.transcript.clear();
            self.last_evaluated = None;
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        if self.state.enabled != enabled {
            info!("Listening {}", if enabled { "enabled" } else { "disabled" });
        }

        self.state.enabled = enabled;
        if enabled {
            self.start();
        } else {
            self.stop();
        }
    }

    fn teardown(&mut self) {
        self.wants_listening = false;
        self.cancel_pending_restart();
        self.close_session();
        self.state.is_listening = false;
    }

    fn should_listen(&self) -> bool {
        self.state.has_support && self.state.enabled && self.wants_listening
    }

    /// Create and start a fresh session; the slot must be empty
    fn open_session(&mut self) {
        let id = SessionId(self.next_session_id);
        self.next_session_id += 1;

        let inputs = self.inputs.clone();
        let events = SessionEventSender::new(id, move |event| {
            if let Some(tx) = inputs.upgrade() {
                let _ = tx.send(Input::Session(event));
            }
        });

        let mut handle = match self.provider.create_session(&self.settings, events) {
            Ok(handle) => handle,
            Err(e) => {
                self.start_failed(e);
                return;
            }
        };

        match handle.start() {
            Ok(()) => {
                info!("Recognition {} started", id);
                self.session = Some(ActiveSession { id, handle });
                if self.config.mode == ListenMode::WakeWord {
                    self.last_evaluated = None;
                }
                self.state.is_listening = true;
            }
            Err(e) => self.start_failed(e),
        }
    }

    fn start_failed(&mut self, err: anyhow::Error) {
        error!("Failed to start recognition: {:#}", err);
        self.state.error = Some(format!("Failed to start speech recognition: {}", err));

        if self.should_listen() {
            self.schedule_restart(self.config.error_restart_delay(), "start failure");
        }
    }

    fn close_session(&mut self) {
        if let Some(mut active) = self.session.take() {
            active.handle.stop();
            info!("Recognition {} stopped", active.id);
        }
    }

    fn schedule_restart(&mut self, delay: Duration, reason: &str) {
        self.cancel_pending_restart();

        let token = self.next_restart_token;
        self.next_restart_token += 1;

        let inputs = self.inputs.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = inputs.upgrade() {
                let _ = tx.send(Input::RestartDue(token));
            }
        });

        info!(
            "Restarting recognition in {}ms after {}",
            delay.as_millis(),
            reason
        );
        self.pending_restart = Some(PendingRestart { token, task });
    }

    fn cancel_pending_restart(&mut self) {
        if let Some(pending) = self.pending_restart.take() {
            pending.task.abort();
            debug!("Cancelled pending restart {}", pending.token);
        }
    }

    fn handle_restart_due(&mut self, token: u64) {
        let due = matches!(&self.pending_restart, Some(pending) if pending.token == token);
        if !due {
            debug!("Ignoring cancelled restart {}", token);
            return;
        }
        self.pending_restart = None;

        if !self.should_listen() || self.session.is_some() {
            return;
        }

        self.open_session();
    }

    fn handle_session_event(&mut self, event: SessionEvent) {
        let current = self.session.as_ref().map(|active| active.id);
        if current != Some(event.session) {
            debug!("Dropping stale callback from {}", event.session);
            return;
        }

        match event.kind {
            SessionEventKind::Start => {
                self.state.is_listening = true;
                self.state.error = None;
            }
            SessionEventKind::Result(result) => self.handle_result(result),
            SessionEventKind::Error(ErrorCode::Aborted) => {
                debug!("Recognition {} aborted", event.session);
            }
            SessionEventKind::Error(code) => {
                warn!("Speech recognition error on {}: {}", event.session, code);
                self.state.error = Some(format!("Speech recognition error: {}", code));
                self.state.is_listening = false;
                self.close_session();

                if self.should_listen() {
                    self.schedule_restart(self.config.error_restart_delay(), "error");
                }
            }
            SessionEventKind::End => {
                info!("Recognition {} ended", event.session);
                self.session = None;
                self.state.is_listening = false;

                if self.should_listen() {
                    self.schedule_restart(self.config.end_restart_delay(), "session end");
                }
            }
        }
    }

    /// Update the transcript and run the wake filter once per settled result
    fn handle_result(&mut self, result: ResultEvent) {
        let latest = result.latest();
        let settled = self.config.forward_interim || latest.map(|r| r.is_final).unwrap_or(false);

        let key = match self.config.mode {
            ListenMode::Dialogue => {
                self.state.transcript = result.full_transcript();
                (0, self.state.transcript.clone())
            }
            ListenMode::WakeWord => {
                let Some(latest) = latest else {
                    warn!(
                        "Result index {} out of range ({} results)",
                        result.result_index,
                        result.results.len()
                    );
                    return;
                };
                self.state.transcript = latest.best().to_string();
                (result.result_index, self.state.transcript.clone())
            }
        };

        if settled && self.last_evaluated.as_ref() != Some(&key) {
            self.last_evaluated = Some(key);
            self.check_wake_phrase();
        }
    }

    fn check_wake_phrase(&mut self) {
        let Some(filter) = &self.filter else {
            return;
        };

        let wake = filter.evaluate(&self.state.transcript);
        if !wake.matched {
            return;
        }

        info!("Wake phrase detected");
        self.state.wake_detected = true;
        let _ = self.events_tx.send(AssistantEvent::WakeDetected {
            transcript: self.state.transcript.clone(),
        });

        if !wake.residual.is_empty() {
            let message = ConversationMessage::new(wake.residual);
            debug!("Conversation message: {}", message.text);
            self.messages.push(message.clone());
            let _ = self.events_tx.send(AssistantEvent::Message(message));
        }
    }

    fn publish_state(&self) {
        self.state_tx.send_if_modified(|current| {
            if *current == self.state {
                false
            } else {
                *current = self.state.clone();
                true
            }
        });
    }
}
