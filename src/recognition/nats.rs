//! Recognizer backed by the STT service transcript stream
//!
//! Each session subscribes to the transcript subject and turns transcript
//! messages into result slots: partial messages keep rewriting the open slot,
//! a final message closes it. The session ends on its own when the
//! subscription closes or, if configured, after a stretch without speech.

use super::backend::{
    Alternative, ErrorCode, RecognitionProvider, RecognitionResult, RecognitionSession,
    RecognitionSettings, ResultEvent, SessionEventKind, SessionEventSender,
};
use crate::config::RecognitionConfig;
use crate::nats::{NatsClient, TranscriptMessage};
use anyhow::Result;
use futures::stream::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Result slots kept per session
pub(crate) const MAX_RESULT_SLOTS: usize = 100;

pub struct NatsRecognitionProvider {
    client: Arc<NatsClient>,
    subject: String,
    stt_session_id: Option<String>,
    idle_timeout: Option<Duration>,
}

impl NatsRecognitionProvider {
    pub fn new(client: Arc<NatsClient>, config: &RecognitionConfig) -> Self {
        Self {
            client,
            subject: config.transcript_subject.clone(),
            stt_session_id: config.stt_session_id.clone(),
            idle_timeout: config.idle_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl RecognitionProvider for NatsRecognitionProvider {
    fn has_support(&self) -> bool {
        true
    }

    fn create_session(
        &self,
        settings: &RecognitionSettings,
        events: SessionEventSender,
    ) -> Result<Box<dyn RecognitionSession>> {
        debug!(
            "Creating NATS recognition {} (lang={}, continuous={}, interim={})",
            events.session(),
            settings.lang,
            settings.continuous,
            settings.interim_results
        );

        Ok(Box::new(NatsRecognitionSession {
            client: Arc::clone(&self.client),
            subject: self.subject.clone(),
            stt_session_id: self.stt_session_id.clone(),
            idle_timeout: self.idle_timeout,
            settings: settings.clone(),
            events,
            task: None,
        }))
    }

    fn name(&self) -> &str {
        "nats"
    }
}

struct NatsRecognitionSession {
    client: Arc<NatsClient>,
    subject: String,
    stt_session_id: Option<String>,
    idle_timeout: Option<Duration>,
    settings: RecognitionSettings,
    events: SessionEventSender,
    task: Option<JoinHandle<()>>,
}

impl RecognitionSession for NatsRecognitionSession {
    fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            anyhow::bail!("recognition has already started");
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| anyhow::anyhow!("no async runtime available for recognition"))?;

        let listener = TranscriptListener {
            client: Arc::clone(&self.client),
            subject: self.subject.clone(),
            feed: TranscriptFeed {
                stt_session_id: self.stt_session_id.clone(),
                idle_timeout: self.idle_timeout,
                settings: self.settings.clone(),
                events: self.events.clone(),
            },
        };
        self.task = Some(runtime.spawn(listener.run()));

        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            // Dropping the subscriber unsubscribes
            task.abort();
        }
    }
}

impl Drop for NatsRecognitionSession {
    fn drop(&mut self) {
        self.stop();
    }
}

struct TranscriptListener {
    client: Arc<NatsClient>,
    subject: String,
    feed: TranscriptFeed,
}

impl TranscriptListener {
    async fn run(self) {
        let events = &self.feed.events;
        let session = events.session();

        let subscriber = match self.client.subscribe_transcripts(&self.subject).await {
            Ok(subscriber) => subscriber,
            Err(e) => {
                warn!("Recognition {} could not subscribe: {:#}", session, e);
                events.emit(SessionEventKind::Error(ErrorCode::Network));
                events.emit(SessionEventKind::End);
                return;
            }
        };

        events.emit(SessionEventKind::Start);
        info!("Recognition {} listening on {}", session, self.subject);

        self.feed.pump(subscriber.map(|msg| msg.payload)).await;
    }
}

/// Turns raw transcript payloads into session callbacks
struct TranscriptFeed {
    stt_session_id: Option<String>,
    idle_timeout: Option<Duration>,
    settings: RecognitionSettings,
    events: SessionEventSender,
}

impl TranscriptFeed {
    /// Consume payloads until the stream closes, the idle deadline passes or
    /// a non-continuous session gets its final result; always ends with `End`
    ///
    /// Only accepted transcripts push the idle deadline back.
    async fn pump<S, P>(&self, payloads: S)
    where
        S: Stream<Item = P>,
        P: AsRef<[u8]>,
    {
        let session = self.events.session();
        let mut payloads = std::pin::pin!(payloads);
        let mut results: Vec<RecognitionResult> = Vec::new();
        let mut deadline = self.idle_timeout.map(|idle| Instant::now() + idle);

        loop {
            let next = match deadline {
                Some(at) => match tokio::time::timeout_at(at, payloads.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        info!("Recognition {} idle, ending", session);
                        break;
                    }
                },
                None => payloads.next().await,
            };

            let Some(payload) = next else {
                info!("Transcript subscription closed for {}", session);
                break;
            };

            let transcript = match serde_json::from_slice::<TranscriptMessage>(payload.as_ref()) {
                Ok(transcript) => transcript,
                Err(e) => {
                    warn!("Failed to parse transcript message: {}", e);
                    continue;
                }
            };

            if let Some(wanted) = &self.stt_session_id {
                if &transcript.session_id != wanted {
                    continue;
                }
            }

            if transcript.partial && !self.settings.interim_results {
                continue;
            }

            deadline = self.idle_timeout.map(|idle| Instant::now() + idle);

            let result_index = apply_transcript(&mut results, &transcript);
            self.events.emit(SessionEventKind::Result(ResultEvent {
                result_index,
                results: results.clone(),
            }));

            if !self.settings.continuous && !transcript.partial {
                break;
            }
        }

        self.events.emit(SessionEventKind::End);
    }
}

/// Fold one transcript message into the result slots
///
/// Returns the index of the slot that was updated. Slots after the first
/// start with a space so the slots concatenate into readable text. Only the
/// newest `MAX_RESULT_SLOTS` slots are kept, so a long-running session's
/// transcript covers its most recent speech.
pub(crate) fn apply_transcript(
    results: &mut Vec<RecognitionResult>,
    message: &TranscriptMessage,
) -> usize {
    let open_slot = results.last().map(|r| !r.is_final).unwrap_or(false);
    let mut index = if open_slot {
        results.len() - 1
    } else {
        results.push(RecognitionResult {
            alternatives: Vec::new(),
            is_final: false,
        });
        results.len() - 1
    };

    let text = message.text.trim();
    let transcript = if index == 0 {
        text.to_string()
    } else {
        format!(" {}", text)
    };

    results[index] = RecognitionResult {
        alternatives: vec![Alternative {
            transcript,
            confidence: message.confidence,
        }],
        is_final: !message.partial,
    };

    if results.len() > MAX_RESULT_SLOTS {
        let excess = results.len() - MAX_RESULT_SLOTS;
        results.drain(..excess);
        index -= excess;
    }

    index
}
