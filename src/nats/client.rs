use super::messages::{AssistantEventKind, AssistantEventMessage};
use crate::session::AssistantEvent;
use crate::sink::EventSink;
use anyhow::{Context, Result};
use async_nats::Client;
use std::sync::Arc;
use tracing::{debug, info};

pub struct NatsClient {
    client: Client,
    instance_id: String,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, instance_id: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            instance_id,
        })
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Subscribe to transcript messages
    pub async fn subscribe_transcripts(&self, subject: &str) -> Result<async_nats::Subscriber> {
        // loqa-core publishes to stt.text.partial and stt.text.final
        info!("Subscribing to transcripts on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .context("Failed to subscribe to transcripts")?;

        Ok(subscriber)
    }

    /// Publish an assistant event as JSON
    pub async fn publish_event(&self, subject: &str, message: &AssistantEventMessage) -> Result<()> {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .context("Failed to publish assistant event")?;

        debug!("Published {:?} event to {}", message.kind, subject);

        Ok(())
    }
}

/// Publishes assistant events on a fixed subject
pub struct NatsEventSink {
    client: Arc<NatsClient>,
    subject: String,
}

impl NatsEventSink {
    pub fn new(client: Arc<NatsClient>, subject: impl Into<String>) -> Self {
        Self {
            client,
            subject: subject.into(),
        }
    }
}

#[async_trait::async_trait]
impl EventSink for NatsEventSink {
    async fn deliver(&self, event: &AssistantEvent) -> Result<()> {
        let message = to_message(self.client.instance_id(), event);
        self.client.publish_event(&self.subject, &message).await
    }

    fn name(&self) -> &str {
        "nats"
    }
}

pub fn to_message(instance_id: &str, event: &AssistantEvent) -> AssistantEventMessage {
    let (kind, text) = match event {
        AssistantEvent::WakeDetected { transcript } => {
            (AssistantEventKind::WakeDetected, transcript.clone())
        }
        AssistantEvent::Message(message) => (AssistantEventKind::Message, message.text.clone()),
    };

    AssistantEventMessage {
        instance_id: instance_id.to_string(),
        kind,
        text,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}
