use super::polling::map_update;
use super::types::{MaxApiError, MaxUpdate, MaxUpdateBatch};
use focus_core::message::IncomingKind;

fn message_update(json: &str) -> MaxUpdate {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_update_batch_parsing() {
    let json = r#"{
        "updates": [
            {
                "update_type": "message_created",
                "timestamp": 1700000000000,
                "message": {
                    "sender": {"user_id": 42, "name": "Ann", "username": "ann"},
                    "recipient": {"chat_id": 100, "chat_type": "dialog"},
                    "body": {"mid": "m1", "seq": 1, "text": "hello"}
                }
            }
        ],
        "marker": 17
    }"#;
    let batch: MaxUpdateBatch = serde_json::from_str(json).unwrap();
    assert_eq!(batch.updates.len(), 1);
    assert_eq!(batch.marker, Some(17));
}

#[test]
fn test_map_text_message() {
    let update = message_update(
        r#"{
            "update_type": "message_created",
            "message": {
                "sender": {"user_id": 42, "name": "Ann", "username": "ann"},
                "recipient": {"chat_id": 100, "chat_type": "dialog"},
                "body": {"text": "hello"}
            }
        }"#,
    );
    let incoming = map_update(update, &[]).unwrap();
    assert_eq!(incoming.kind, IncomingKind::Text);
    assert_eq!(incoming.chat_id, 100);
    assert_eq!(incoming.user_id, Some(42));
    assert_eq!(incoming.sender_name.as_deref(), Some("@ann"));
    assert_eq!(incoming.text, "hello");
}

#[test]
fn test_map_bot_started() {
    let update = message_update(
        r#"{
            "update_type": "bot_started",
            "chat_id": 55,
            "user": {"user_id": 42, "name": "Ann"}
        }"#,
    );
    let incoming = map_update(update, &[]).unwrap();
    assert_eq!(incoming.kind, IncomingKind::BotStarted);
    assert_eq!(incoming.chat_id, 55);
    assert!(incoming.text.is_empty());
}

#[test]
fn test_unauthorized_user_dropped() {
    let update = message_update(
        r#"{
            "update_type": "message_created",
            "message": {
                "sender": {"user_id": 99},
                "recipient": {"chat_id": 100, "chat_type": "dialog"},
                "body": {"text": "hi"}
            }
        }"#,
    );
    assert!(map_update(update, &[42]).is_none());
}

#[test]
fn test_group_chat_dropped() {
    let update = message_update(
        r#"{
            "update_type": "message_created",
            "message": {
                "sender": {"user_id": 42},
                "recipient": {"chat_id": 100, "chat_type": "chat"},
                "body": {"text": "hi all"}
            }
        }"#,
    );
    assert!(map_update(update, &[]).is_none());
}

#[test]
fn test_textless_message_dropped() {
    let update = message_update(
        r#"{
            "update_type": "message_created",
            "message": {
                "sender": {"user_id": 42},
                "recipient": {"chat_id": 100, "chat_type": "dialog"},
                "body": {}
            }
        }"#,
    );
    assert!(map_update(update, &[]).is_none());
}

#[test]
fn test_error_body_parsing() {
    let err: MaxApiError =
        serde_json::from_str(r#"{"code": "chat.denied", "message": "dialog paused"}"#).unwrap();
    assert_eq!(err.code.as_deref(), Some("chat.denied"));
    assert_eq!(err.message.as_deref(), Some("dialog paused"));
}
