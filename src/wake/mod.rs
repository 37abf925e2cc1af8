//! Wake phrase detection over recognized transcripts

mod filter;

pub use filter::{WakeMatch, WakeWordFilter};

use serde::{Deserialize, Serialize};

/// Wake phrase settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeWordConfig {
    /// Trigger phrase, matched case-insensitively as a substring
    pub phrase: String,

    /// When false, transcripts are never checked for the phrase
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for WakeWordConfig {
    fn default() -> Self {
        Self {
            phrase: "hey victoria".to_string(),
            enabled: true,
        }
    }
}
