use serde::{Deserialize, Serialize};

/// Transcript message received from STT service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub partial: bool,
    pub timestamp: String, // RFC3339 timestamp
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Kind of assistant event published to NATS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantEventKind {
    WakeDetected,
    Message,
}

/// Assistant event published for downstream consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantEventMessage {
    pub instance_id: String,
    pub kind: AssistantEventKind,
    pub text: String,
    pub timestamp: String, // RFC3339 timestamp
}
