use crate::session::SupervisorConfig;
use crate::wake::WakeWordConfig;
use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub recognition: RecognitionConfig,
    pub wake_word: WakeWordConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionConfig {
    /// BCP 47 language tag passed to every session
    #[serde(default = "default_lang")]
    pub lang: String,

    /// NATS server carrying the STT transcript stream
    pub nats_url: String,

    /// Subject the STT service publishes transcripts on
    #[serde(default = "default_transcript_subject")]
    pub transcript_subject: String,

    /// Only accept transcripts for this STT session (all sessions if unset)
    #[serde(default)]
    pub stt_session_id: Option<String>,

    /// End a session after this long without transcripts
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Subject assistant events are published on
    pub subject: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            subject: "assistant.events".to_string(),
        }
    }
}

fn default_lang() -> String {
    "en-US".to_string()
}

fn default_transcript_subject() -> String {
    "stt.text.>".to_string()
}

impl Config {
    /// Load from a config file (extension optional), then apply
    /// `VOICE_ASSISTANT__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("VOICE_ASSISTANT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        let cfg: Self = settings
            .try_deserialize()
            .context("Invalid configuration")?;

        if cfg.wake_word.phrase.trim().is_empty() {
            anyhow::bail!("wake_word.phrase must not be empty");
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ListenMode;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_with_defaults() {
        let file = write_config(
            r#"
            [service]
            name = "voice-assistant"

            [service.http]
            bind = "127.0.0.1"
            port = 3030

            [recognition]
            nats_url = "nats://localhost:4222"

            [wake_word]
            phrase = "hey victoria"
            enabled = true
            "#,
        );

        let cfg = Config::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(cfg.service.http.port, 3030);
        assert_eq!(cfg.recognition.lang, "en-US");
        assert_eq!(cfg.recognition.transcript_subject, "stt.text.>");
        assert!(cfg.recognition.idle_timeout_secs.is_none());
        assert_eq!(cfg.wake_word.phrase, "hey victoria");
        assert_eq!(cfg.supervisor.mode, ListenMode::Dialogue);
        assert_eq!(cfg.events.subject, "assistant.events");
    }

    #[test]
    fn test_load_supervisor_section() {
        let file = write_config(
            r#"
            [service]
            name = "voice-assistant"

            [service.http]
            bind = "0.0.0.0"
            port = 8080

            [recognition]
            lang = "en-GB"
            nats_url = "nats://nats:4222"
            idle_timeout_secs = 8

            [wake_word]
            phrase = "computer"
            enabled = false

            [supervisor]
            mode = "wake_word"
            end_restart_delay_ms = 250
            error_restart_delay_ms = 1500
            "#,
        );

        let cfg = Config::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(cfg.recognition.lang, "en-GB");
        assert_eq!(cfg.recognition.idle_timeout_secs, Some(8));
        assert!(!cfg.wake_word.enabled);
        assert_eq!(cfg.supervisor.mode, ListenMode::WakeWord);
        assert_eq!(cfg.supervisor.end_restart_delay_ms, 250);
        assert_eq!(cfg.supervisor.error_restart_delay_ms, 1500);
        assert!(!cfg.supervisor.forward_interim);
    }

    #[test]
    fn test_rejects_blank_phrase() {
        let file = write_config(
            r#"
            [service]
            name = "voice-assistant"

            [service.http]
            bind = "127.0.0.1"
            port = 3030

            [recognition]
            nats_url = "nats://localhost:4222"

            [wake_word]
            phrase = "   "
            enabled = true
            "#,
        );

        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::load("/nonexistent/voice-assistant").is_err());
    }
}
