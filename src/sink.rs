//! Delivery of assistant events to downstream consumers

use crate::session::AssistantEvent;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Destination for wake and conversation events
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, event: &AssistantEvent) -> Result<()>;

    /// Sink name for logging
    fn name(&self) -> &str;
}

/// Forward every event from `events` to `sink` until the channel closes
///
/// Delivery failures are logged and skipped; a lagging receiver skips the
/// events it missed.
pub fn forward_events(
    mut events: broadcast::Receiver<AssistantEvent>,
    sink: Arc<dyn EventSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Forwarding assistant events to {}", sink.name());

        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(e) = sink.deliver(&event).await {
                        error!("Failed to deliver event to {}: {:#}", sink.name(), e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event forwarder lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        info!("Event forwarding to {} stopped", sink.name());
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ConversationMessage;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<AssistantEvent>>,
    }

    #[async_trait::async_trait]
    impl EventSink for RecordingSink {
        async fn deliver(&self, event: &AssistantEvent) -> Result<()> {
            self.delivered.lock().await.push(event.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct FailingSink;

    #[async_trait::async_trait]
    impl EventSink for FailingSink {
        async fn deliver(&self, _event: &AssistantEvent) -> Result<()> {
            anyhow::bail!("downstream unavailable")
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_forwards_in_order_until_closed() -> Result<()> {
        let (tx, rx) = broadcast::channel(16);
        let sink = Arc::new(RecordingSink::default());

        let task = forward_events(rx, sink.clone());

        let message = ConversationMessage::new("turn on the lights");
        tx.send(AssistantEvent::WakeDetected {
            transcript: "hey victoria turn on the lights".to_string(),
        })?;
        tx.send(AssistantEvent::Message(message.clone()))?;
        drop(tx);

        task.await?;

        let delivered = sink.delivered.lock().await;
        assert_eq!(delivered.len(), 2);
        assert!(matches!(delivered[0], AssistantEvent::WakeDetected { .. }));
        assert_eq!(delivered[1], AssistantEvent::Message(message));

        Ok(())
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_stop_forwarding() -> Result<()> {
        let (tx, rx) = broadcast::channel(16);

        let task = forward_events(rx, Arc::new(FailingSink));

        tx.send(AssistantEvent::Message(ConversationMessage::new("one")))?;
        tx.send(AssistantEvent::Message(ConversationMessage::new("two")))?;
        drop(tx);

        // Task ends cleanly once the channel closes
        task.await?;

        Ok(())
    }
}
