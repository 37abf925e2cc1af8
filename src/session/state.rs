use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State observed by the display layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorState {
    /// Current transcript, replaced wholesale on every result
    pub transcript: String,

    /// Whether a session is believed to be capturing
    pub is_listening: bool,

    /// Last non-aborted error, cleared when a session starts
    pub error: Option<String>,

    /// Whether the host has a recognizer at all (fixed at startup)
    pub has_support: bool,

    /// Whether listening is enabled
    pub enabled: bool,

    /// Set once the wake phrase has been heard
    pub wake_detected: bool,
}

/// One assistant-directed utterance, with the wake phrase removed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// State plus the conversation log so far
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub state: SupervisorState,
    pub messages: Vec<ConversationMessage>,
}

/// Fire-and-forget notifications for subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantEvent {
    /// The wake phrase was heard in `transcript`
    WakeDetected { transcript: String },
    /// A message was appended to the conversation
    Message(ConversationMessage),
}
