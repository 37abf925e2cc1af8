//! Recognition session supervision
//!
//! This module provides the `SupervisorHandle` abstraction that manages:
//! - Exactly one live recognition session while listening is wanted
//! - Transparent restarts after errors and platform-initiated ends
//! - Enable/disable toggles and cancellation of pending restarts
//! - Transcript reconstruction and wake phrase forwarding
//! - Observable state for the display layer

mod config;
mod handle;
mod state;
mod supervisor;

pub use config::{ListenMode, SupervisorConfig, MIN_RESTART_DELAY};
pub use handle::SupervisorHandle;
pub use state::{AssistantEvent, ConversationMessage, Snapshot, SupervisorState};
