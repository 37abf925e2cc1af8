use anyhow::Result;

/// Outcome of checking one transcript for the wake phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeMatch {
    pub matched: bool,
    /// Lower-cased transcript with the phrase removed and trimmed; empty
    /// when there was no match
    pub residual: String,
}

/// Stateless wake phrase matcher
#[derive(Debug, Clone)]
pub struct WakeWordFilter {
    phrase: String,
}

impl WakeWordFilter {
    /// The phrase is stored lower-cased but otherwise as given, surrounding
    /// whitespace included; an all-whitespace phrase is rejected
    pub fn new(phrase: &str) -> Result<Self> {
        if phrase.trim().is_empty() {
            anyhow::bail!("Wake phrase must not be empty");
        }
        Ok(Self {
            phrase: phrase.to_lowercase(),
        })
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Case-insensitive substring check
    pub fn matches(&self, transcript: &str) -> bool {
        transcript.to_lowercase().contains(&self.phrase)
    }

    /// Check for the phrase and strip its first occurrence
    pub fn evaluate(&self, transcript: &str) -> WakeMatch {
        let lowered = transcript.to_lowercase();

        match lowered.find(&self.phrase) {
            Some(start) => {
                let end = start + self.phrase.len();
                let residual = format!("{}{}", &lowered[..start], &lowered[end..]);
                WakeMatch {
                    matched: true,
                    residual: residual.trim().to_string(),
                }
            }
            None => WakeMatch {
                matched: false,
                residual: String::new(),
            },
        }
    }
}
