pub mod config;
pub mod http;
pub mod nats;
pub mod recognition;
pub mod session;
pub mod sink;
pub mod wake;

pub use config::Config;
pub use http::{create_router, AppState};
pub use nats::{AssistantEventMessage, NatsClient, NatsEventSink, TranscriptMessage};
pub use recognition::{
    NatsRecognitionProvider, RecognitionProvider, RecognitionSettings, ScriptedProvider,
    UnsupportedProvider,
};
pub use session::{
    AssistantEvent, ConversationMessage, ListenMode, Snapshot, SupervisorConfig,
    SupervisorHandle, SupervisorState,
};
pub use sink::{forward_events, EventSink};
pub use wake::{WakeMatch, WakeWordConfig, WakeWordFilter};
