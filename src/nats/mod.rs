pub mod client;
pub mod messages;

pub use client::{NatsClient, NatsEventSink};
pub use messages::{AssistantEventKind, AssistantEventMessage, TranscriptMessage};
