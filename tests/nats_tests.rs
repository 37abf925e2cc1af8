use loqa_listen::nats::client::to_message;
use loqa_listen::nats::messages::{AssistantEventKind, AssistantEventMessage, TranscriptMessage};
use loqa_listen::{AssistantEvent, ConversationMessage};

#[test]
fn test_transcript_deserialization() {
    let json = r#"{
        "session_id": "test-meeting",
        "text": "Hello world",
        "partial": false,
        "timestamp": "2025-10-27T14:30:05Z",
        "confidence": 0.95
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.session_id, "test-meeting");
    assert_eq!(msg.text, "Hello world");
    assert!(!msg.partial);
    assert_eq!(msg.confidence, Some(0.95));
    assert_eq!(msg.timestamp, "2025-10-27T14:30:05Z");
}

#[test]
fn test_transcript_partial() {
    let json = r#"{
        "session_id": "test-meeting",
        "text": "This is a partial",
        "partial": true,
        "timestamp": "2025-10-27T14:30:05Z",
        "confidence": 0.87
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert!(msg.partial);
    assert_eq!(msg.text, "This is a partial");
    assert_eq!(msg.confidence, Some(0.87));
}

#[test]
fn test_transcript_no_confidence() {
    let json = r#"{
        "session_id": "test-meeting",
        "text": "No confidence score",
        "partial": false,
        "timestamp": "2025-10-27T14:30:05Z"
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.text, "No confidence score");
    assert_eq!(msg.confidence, None);
}

#[test]
fn test_message_event_serialization() {
    let event = AssistantEvent::Message(ConversationMessage::new("turn on the lights"));
    let msg = to_message("assistant-1", &event);

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"kind\":\"message\""));
    assert!(json.contains("\"instance_id\":\"assistant-1\""));
    assert!(json.contains("turn on the lights"));

    let deserialized: AssistantEventMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.kind, AssistantEventKind::Message);
    assert_eq!(deserialized.text, "turn on the lights");
}

#[test]
fn test_wake_event_carries_transcript() {
    let event = AssistantEvent::WakeDetected {
        transcript: "hey victoria".to_string(),
    };
    let msg = to_message("assistant-1", &event);

    assert_eq!(msg.kind, AssistantEventKind::WakeDetected);
    assert_eq!(msg.text, "hey victoria");

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"kind\":\"wake_detected\""));
    assert!(chrono::DateTime::parse_from_rfc3339(&msg.timestamp).is_ok());
}
