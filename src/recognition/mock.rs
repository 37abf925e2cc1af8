//! Scripted recognizer for deterministic tests
//!
//! The real recognizer is non-deterministic and environment-bound. The
//! scripted provider records every session it creates and lets the test fire
//! callbacks on a session's behalf, in whatever order the scenario needs.

use super::backend::{
    ErrorCode, RecognitionProvider, RecognitionResult, RecognitionSession, RecognitionSettings,
    ResultEvent, SessionEventKind, SessionEventSender, SessionId,
};
use anyhow::Result;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct SessionState {
    running: bool,
    start_calls: usize,
    stop_calls: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Test double for `RecognitionProvider`
#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    supported: bool,
    sessions: Arc<Mutex<Vec<ScriptedSession>>>,
    fail_next_start: Arc<Mutex<Option<String>>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            supported: true,
            sessions: Arc::new(Mutex::new(Vec::new())),
            fail_next_start: Arc::new(Mutex::new(None)),
        }
    }

    /// A provider whose capability probe reports no support
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Make the next `start()` call on any session fail synchronously
    pub fn fail_next_start(&self, reason: impl Into<String>) {
        *lock(&self.fail_next_start) = Some(reason.into());
    }

    /// Number of sessions created so far
    pub fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }

    /// Number of sessions currently started and not stopped
    pub fn live_sessions(&self) -> usize {
        lock(&self.sessions)
            .iter()
            .filter(|s| s.is_running())
            .count()
    }

    /// Session by creation order
    pub fn session(&self, index: usize) -> Option<ScriptedSession> {
        lock(&self.sessions).get(index).cloned()
    }

    /// Most recently created session
    pub fn latest(&self) -> Option<ScriptedSession> {
        lock(&self.sessions).last().cloned()
    }
}

impl RecognitionProvider for ScriptedProvider {
    fn has_support(&self) -> bool {
        self.supported
    }

    fn create_session(
        &self,
        settings: &RecognitionSettings,
        events: SessionEventSender,
    ) -> Result<Box<dyn RecognitionSession>> {
        if !self.supported {
            anyhow::bail!("Speech recognition is not supported on this host");
        }

        let session = ScriptedSession {
            settings: settings.clone(),
            events,
            state: Arc::new(Mutex::new(SessionState::default())),
            fail_next_start: Arc::clone(&self.fail_next_start),
        };
        lock(&self.sessions).push(session.clone());

        Ok(Box::new(session))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A session created by `ScriptedProvider`; clones share state
#[derive(Debug, Clone)]
pub struct ScriptedSession {
    settings: RecognitionSettings,
    events: SessionEventSender,
    state: Arc<Mutex<SessionState>>,
    fail_next_start: Arc<Mutex<Option<String>>>,
}

impl ScriptedSession {
    pub fn id(&self) -> SessionId {
        self.events.session()
    }

    pub fn settings(&self) -> &RecognitionSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    pub fn start_calls(&self) -> usize {
        lock(&self.state).start_calls
    }

    pub fn stop_calls(&self) -> usize {
        lock(&self.state).stop_calls
    }

    pub fn emit_start(&self) {
        self.events.emit(SessionEventKind::Start);
    }

    /// Replay an ordered result-slot array
    pub fn emit_results(&self, result_index: usize, results: Vec<RecognitionResult>) {
        self.events.emit(SessionEventKind::Result(ResultEvent {
            result_index,
            results,
        }));
    }

    pub fn emit_error(&self, code: ErrorCode) {
        self.events.emit(SessionEventKind::Error(code));
    }

    /// Platform-initiated end; the session is no longer running afterwards
    pub fn emit_end(&self) {
        lock(&self.state).running = false;
        self.events.emit(SessionEventKind::End);
    }
}

impl RecognitionSession for ScriptedSession {
    fn start(&mut self) -> Result<()> {
        if let Some(reason) = lock(&self.fail_next_start).take() {
            anyhow::bail!(reason);
        }

        let mut state = lock(&self.state);
        if state.running {
            anyhow::bail!("recognition has already started");
        }
        state.running = true;
        state.start_calls += 1;
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = lock(&self.state);
        state.running = false;
        state.stop_calls += 1;
    }
}
