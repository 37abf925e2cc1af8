//! Speech recognition capability
//!
//! The listener never does its own audio capture or inference. It consumes an
//! external continuous recognizer through a narrow interface:
//! - `RecognitionProvider` - capability probe and session factory
//! - `RecognitionSession` - start/stop primitive pair for one live session
//! - `SessionEvent` - start, result, error and end callbacks, tagged with the
//!   id of the session that produced them

pub mod backend;
pub mod mock;
pub mod nats;

pub use backend::{
    Alternative, ErrorCode, RecognitionProvider, RecognitionResult, RecognitionSession,
    RecognitionSettings, ResultEvent, SessionEvent, SessionEventKind, SessionEventSender,
    SessionId, UnsupportedProvider,
};
pub use mock::{ScriptedProvider, ScriptedSession};
pub use nats::NatsRecognitionProvider;
