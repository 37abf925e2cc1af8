use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier of one recognition session, unique per supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Configuration applied to every session before it is started
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionSettings {
    /// Keep delivering results after the first final result
    pub continuous: bool,
    /// Deliver interim (non-final) hypotheses
    pub interim_results: bool,
    /// BCP 47 language tag (e.g. "en-US")
    pub lang: String,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            continuous: true,
            interim_results: true,
            lang: "en-US".to_string(),
        }
    }
}

/// One recognized hypothesis for a result slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub transcript: String,
    pub confidence: Option<f32>,
}

/// One result slot; alternatives are ordered best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub alternatives: Vec<Alternative>,
    pub is_final: bool,
}

impl RecognitionResult {
    /// Interim result with a single alternative
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            alternatives: vec![Alternative {
                transcript: text.into(),
                confidence: None,
            }],
            is_final: false,
        }
    }

    /// Final result with a single alternative
    pub fn finalized(text: impl Into<String>) -> Self {
        Self {
            is_final: true,
            ..Self::interim(text)
        }
    }

    /// Transcript of the best alternative (empty if the slot has none)
    pub fn best(&self) -> &str {
        self.alternatives
            .first()
            .map(|alt| alt.transcript.as_str())
            .unwrap_or("")
    }
}

/// Payload of a result callback
///
/// `results` holds every slot reported so far in this session, in order.
/// `result_index` marks the slot that was most recently updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEvent {
    pub result_index: usize,
    pub results: Vec<RecognitionResult>,
}

impl ResultEvent {
    /// Concatenation of the best alternative of every slot, in slot order
    pub fn full_transcript(&self) -> String {
        self.results.iter().map(RecognitionResult::best).collect()
    }

    /// The slot at `result_index`, if the platform reported a valid index
    pub fn latest(&self) -> Option<&RecognitionResult> {
        self.results.get(self.result_index)
    }
}

/// Error codes reported by the recognizer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Session was stopped on purpose; never surfaced
    Aborted,
    NoSpeech,
    AudioCapture,
    Network,
    NotAllowed,
    ServiceNotAllowed,
    LanguageNotSupported,
    Other(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Aborted => "aborted",
            Self::NoSpeech => "no-speech",
            Self::AudioCapture => "audio-capture",
            Self::Network => "network",
            Self::NotAllowed => "not-allowed",
            Self::ServiceNotAllowed => "service-not-allowed",
            Self::LanguageNotSupported => "language-not-supported",
            Self::Other(code) => code,
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "aborted" => Self::Aborted,
            "no-speech" => Self::NoSpeech,
            "audio-capture" => Self::AudioCapture,
            "network" => Self::Network,
            "not-allowed" => Self::NotAllowed,
            "service-not-allowed" => Self::ServiceNotAllowed,
            "language-not-supported" => Self::LanguageNotSupported,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle and result callbacks of a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEventKind {
    Start,
    Result(ResultEvent),
    Error(ErrorCode),
    End,
}

/// A callback tagged with the session that fired it
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub session: SessionId,
    pub kind: SessionEventKind,
}

/// Callback slot handed to a session at construction
///
/// Every event emitted through it is tagged with the owning session id, so
/// the receiver can drop callbacks from sessions it no longer references.
#[derive(Clone)]
pub struct SessionEventSender {
    session: SessionId,
    sink: Arc<dyn Fn(SessionEvent) + Send + Sync>,
}

impl SessionEventSender {
    pub fn new(session: SessionId, sink: impl Fn(SessionEvent) + Send + Sync + 'static) -> Self {
        Self {
            session,
            sink: Arc::new(sink),
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn emit(&self, kind: SessionEventKind) {
        (self.sink)(SessionEvent {
            session: self.session,
            kind,
        });
    }
}

impl fmt::Debug for SessionEventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEventSender")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// One live connection to the external recognizer
///
/// Implementations:
/// - NATS: transcripts from the STT service stream
/// - Scripted: test double driven by the test itself
pub trait RecognitionSession: Send {
    /// Begin recognition
    ///
    /// Fails synchronously when the platform rejects the call (e.g. the
    /// session is already started).
    fn start(&mut self) -> Result<()>;

    /// Stop recognition; further callbacks from this session may still arrive
    fn stop(&mut self);
}

/// Capability probe and session factory
pub trait RecognitionProvider: Send + Sync {
    /// Whether the host exposes a continuous recognizer at all
    fn has_support(&self) -> bool;

    /// Construct a configured, not yet started session
    fn create_session(
        &self,
        settings: &RecognitionSettings,
        events: SessionEventSender,
    ) -> Result<Box<dyn RecognitionSession>>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Provider used when no recognizer is available on the host
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedProvider;

impl RecognitionProvider for UnsupportedProvider {
    fn has_support(&self) -> bool {
        false
    }

    fn create_session(
        &self,
        _settings: &RecognitionSettings,
        _events: SessionEventSender,
    ) -> Result<Box<dyn RecognitionSession>> {
        anyhow::bail!("Speech recognition is not supported on this host")
    }

    fn name(&self) -> &str {
        "unsupported"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_transcript_concatenates_slots_in_order() {
        let event = ResultEvent {
            result_index: 2,
            results: vec![
                RecognitionResult::finalized("hey victoria"),
                RecognitionResult::finalized(" turn on"),
                RecognitionResult::interim(" the lights"),
            ],
        };

        assert_eq!(event.full_transcript(), "hey victoria turn on the lights");
        assert_eq!(event.latest().map(|r| r.best()), Some(" the lights"));
    }

    #[test]
    fn test_latest_out_of_range() {
        let event = ResultEvent {
            result_index: 3,
            results: vec![RecognitionResult::interim("hello")],
        };

        assert!(event.latest().is_none());
    }

    #[test]
    fn test_best_of_empty_slot() {
        let result = RecognitionResult {
            alternatives: vec![],
            is_final: true,
        };

        assert_eq!(result.best(), "");
    }

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(ErrorCode::from("aborted"), ErrorCode::Aborted);
        assert_eq!(ErrorCode::from("no-speech").as_str(), "no-speech");
        assert_eq!(
            ErrorCode::from("bad-grammar"),
            ErrorCode::Other("bad-grammar".to_string())
        );
        assert_eq!(ErrorCode::Network.to_string(), "network");
    }

    #[test]
    fn test_unsupported_provider() {
        let provider = UnsupportedProvider;
        assert!(!provider.has_support());

        let events = SessionEventSender::new(SessionId(1), |_| {});
        assert!(provider
            .create_session(&RecognitionSettings::default(), events)
            .is_err());
    }
}
