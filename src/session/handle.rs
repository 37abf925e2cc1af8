use super::config::SupervisorConfig;
use super::state::{AssistantEvent, Snapshot, SupervisorState};
use super::supervisor::{Command, Input, Supervisor, UNSUPPORTED_MESSAGE};
use crate::recognition::{RecognitionProvider, RecognitionSettings};
use crate::wake::{WakeWordConfig, WakeWordFilter};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::warn;

const EVENT_CAPACITY: usize = 64;

/// Cloneable interface to a running supervisor
///
/// Calls return the resulting state once the supervisor has applied them.
/// They only fail if the supervisor task is gone.
#[derive(Clone)]
pub struct SupervisorHandle {
    inputs: mpsc::UnboundedSender<Input>,
    state_rx: watch::Receiver<SupervisorState>,
    events_tx: broadcast::Sender<AssistantEvent>,
}

impl SupervisorHandle {
    /// Spawn a supervisor task; must be called from within a tokio runtime
    ///
    /// The provider's capability probe is consulted once, here.
    pub fn spawn(
        provider: Arc<dyn RecognitionProvider>,
        config: SupervisorConfig,
        settings: RecognitionSettings,
        wake_word: &WakeWordConfig,
    ) -> Result<Self> {
        let filter = if wake_word.enabled {
            Some(WakeWordFilter::new(&wake_word.phrase).context("Invalid wake word config")?)
        } else {
            None
        };

        let has_support = provider.has_support();
        if !has_support {
            warn!("{} (provider={})", UNSUPPORTED_MESSAGE, provider.name());
        }

        let initial = SupervisorState {
            has_support,
            enabled: true,
            error: (!has_support).then(|| UNSUPPORTED_MESSAGE.to_string()),
            ..SupervisorState::default()
        };

        let (inputs, inputs_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(initial);
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let supervisor = Supervisor::new(
            provider,
            config,
            settings,
            filter,
            inputs.downgrade(),
            state_tx,
            events_tx.clone(),
        );
        tokio::spawn(supervisor.run(inputs_rx));

        Ok(Self {
            inputs,
            state_rx,
            events_tx,
        })
    }

    /// Static capability flag; the display layer must not offer start when false
    pub fn has_support(&self) -> bool {
        self.state_rx.borrow().has_support
    }

    pub async fn start(&self) -> Result<SupervisorState> {
        self.request(Command::Start).await
    }

    pub async fn stop(&self) -> Result<SupervisorState> {
        self.request(Command::Stop).await
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<SupervisorState> {
        self.request(|reply| Command::SetEnabled(enabled, reply))
            .await
    }

    /// State and conversation log, consistent with each other
    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.request(Command::Snapshot).await
    }

    /// Stop the session, cancel pending restarts and end the supervisor task
    pub async fn shutdown(&self) -> Result<()> {
        self.request(Command::Shutdown).await
    }

    /// Latest published state
    pub fn state(&self) -> SupervisorState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SupervisorState> {
        self.state_rx.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AssistantEvent> {
        self.events_tx.subscribe()
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inputs
            .send(Input::Command(command(reply_tx)))
            .map_err(|_| anyhow::anyhow!("Supervisor is not running"))?;

        reply_rx.await.context("Supervisor dropped the request")
    }
}
