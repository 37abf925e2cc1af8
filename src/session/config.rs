use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest delay before an automatic restart, so a recognizer that ends
/// immediately cannot drive a tight restart loop
pub const MIN_RESTART_DELAY: Duration = Duration::from_millis(50);

/// How results are turned into the transcript
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ListenMode {
    /// Transcript is the whole session's results concatenated; the wake
    /// phrase is searched in the full transcript and stop clears it
    #[default]
    Dialogue,
    /// Transcript is only the most recently updated result segment; stop
    /// keeps it
    WakeWord,
}

/// Configuration for the recognition session supervisor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    #[serde(default)]
    pub mode: ListenMode,

    /// Delay before restarting after the recognizer ends on its own
    /// Default: 1000ms
    #[serde(default = "default_end_restart_delay_ms")]
    pub end_restart_delay_ms: u64,

    /// Delay before restarting after a recognition error or failed start
    /// Default: 2000ms
    #[serde(default = "default_error_restart_delay_ms")]
    pub error_restart_delay_ms: u64,

    /// Dialogue mode: also forward messages from interim results
    #[serde(default)]
    pub forward_interim: bool,
}

fn default_end_restart_delay_ms() -> u64 {
    1000
}

fn default_error_restart_delay_ms() -> u64 {
    2000
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            mode: ListenMode::default(),
            end_restart_delay_ms: default_end_restart_delay_ms(),
            error_restart_delay_ms: default_error_restart_delay_ms(),
            forward_interim: false,
        }
    }
}

impl SupervisorConfig {
    pub fn with_mode(mode: ListenMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn end_restart_delay(&self) -> Duration {
        Duration::from_millis(self.end_restart_delay_ms).max(MIN_RESTART_DELAY)
    }

    pub fn error_restart_delay(&self) -> Duration {
        Duration::from_millis(self.error_restart_delay_ms).max(MIN_RESTART_DELAY)
    }
}
