//! Golden wire-shape tests for the v1 session protocol.
//!
//! These tests pin the serialized form of every event to the frozen
//! camelCase wire contract. If a field or event is added, removed, or
//! renamed, these tests will fail, forcing an explicit protocol version
//! bump. The JSON literals here are the public contract; the session
//! service and every other client parse these exact shapes.

use gridcast_protocol::{
    AddColumnMessage, AddRowMessage, ClientEvent, FocusCellMessage, JoinSessionMessage,
    ServerEvent, SessionUpdate, SnapshotData, UnfocusCellMessage,
};
use serde_json::json;

fn to_value(event: &ClientEvent) -> serde_json::Value {
    serde_json::to_value(event).expect("client event should serialize")
}

#[test]
fn test_golden_join_session() {
    let ev = ClientEvent::JoinSession(JoinSessionMessage {
        session_id: "sess-1".into(),
        user_id: "user-1".into(),
        username: "alice".into(),
        email: "alice@example.com".into(),
    });

    assert_eq!(
        to_value(&ev),
        json!({
            "event": "joinSession",
            "sessionId": "sess-1",
            "userId": "user-1",
            "username": "alice",
            "email": "alice@example.com",
        })
    );
}

#[test]
fn test_golden_focus_and_unfocus() {
    let focus = ClientEvent::FocusCell(FocusCellMessage {
        session_id: "sess-1".into(),
        cell_id: "AA13".into(),
        username: "alice".into(),
    });
    assert_eq!(
        to_value(&focus),
        json!({
            "event": "focusCell",
            "sessionId": "sess-1",
            "cellId": "AA13",
            "username": "alice",
        })
    );

    let unfocus = ClientEvent::UnfocusCell(UnfocusCellMessage {
        session_id: "sess-1".into(),
        cell_id: "AA13".into(),
        username: "alice".into(),
    });
    assert_eq!(
        to_value(&unfocus),
        json!({
            "event": "unfocusCell",
            "sessionId": "sess-1",
            "cellId": "AA13",
            "username": "alice",
        })
    );
}

#[test]
fn test_golden_growth_requests() {
    let row = ClientEvent::AddRow(AddRowMessage {
        session_id: "sess-1".into(),
        user_id: "user-1".into(),
    });
    assert_eq!(
        to_value(&row),
        json!({ "event": "addRow", "sessionId": "sess-1", "userId": "user-1" })
    );

    let col = ClientEvent::AddColumn(AddColumnMessage {
        session_id: "sess-1".into(),
        user_id: "user-1".into(),
    });
    assert_eq!(
        to_value(&col),
        json!({ "event": "addColumn", "sessionId": "sess-1", "userId": "user-1" })
    );
}

#[test]
fn test_golden_session_update_body() {
    let update = SessionUpdate {
        session_data: vec![("A1".into(), "10".into()), ("B1".into(), "20".into())],
        sender_id: "user-1".into(),
    };

    assert_eq!(
        serde_json::to_value(&update).unwrap(),
        json!({
            "sessionData": [["A1", "10"], ["B1", "20"]],
            "senderId": "user-1",
        })
    );
}

#[test]
fn test_decode_snapshot_pairs_shape() {
    let raw = json!({
        "event": "sessionData",
        "sessionData": [["A1", "10"], ["B1", "20"]],
        "rows": 5,
        "columns": 5,
    });

    let ev: ServerEvent = serde_json::from_value(raw).unwrap();
    match ev {
        ServerEvent::SessionData(msg) => {
            assert_eq!(msg.rows, 5);
            assert_eq!(msg.columns, 5);
            let entries = msg.session_data.into_entries().unwrap();
            assert_eq!(
                entries,
                vec![
                    ("A1".to_string(), "10".to_string()),
                    ("B1".to_string(), "20".to_string()),
                ]
            );
        }
        other => panic!("expected SessionData, got {:?}", other),
    }
}

#[test]
fn test_decode_snapshot_map_shape() {
    let raw = json!({
        "event": "sessionData",
        "sessionData": { "B1": "20", "A1": "10" },
        "rows": 5,
        "columns": 5,
    });

    let ev: ServerEvent = serde_json::from_value(raw).unwrap();
    match ev {
        ServerEvent::SessionData(msg) => {
            let entries = msg.session_data.into_entries().unwrap();
            // Map shape normalizes in key order
            assert_eq!(entries[0].0, "A1");
            assert_eq!(entries[1].0, "B1");
        }
        other => panic!("expected SessionData, got {:?}", other),
    }
}

#[test]
fn test_decode_unrecognized_snapshot_shape_still_parses() {
    // A malformed sessionData must not fail the envelope; the handler
    // logs and ignores it, keeping the session alive.
    let raw = json!({
        "event": "sessionData",
        "sessionData": "not a snapshot",
        "rows": 5,
        "columns": 5,
    });

    let ev: ServerEvent = serde_json::from_value(raw).unwrap();
    match ev {
        ServerEvent::SessionData(msg) => {
            let err = msg.session_data.into_entries().unwrap_err();
            assert_eq!(err.0, "string");
        }
        other => panic!("expected SessionData, got {:?}", other),
    }
}

#[test]
fn test_decode_session_data_updated() {
    let raw = json!({
        "event": "sessionDataUpdated",
        "sessionData": [["C3", "hello"]],
        "rows": 52,
        "columns": 53,
        "senderId": "user-2",
    });

    let ev: ServerEvent = serde_json::from_value(raw).unwrap();
    match ev {
        ServerEvent::SessionDataUpdated(msg) => {
            assert_eq!(msg.sender_id, "user-2");
            assert_eq!(msg.columns, 53);
            assert_eq!(msg.session_data.len(), Some(1));
        }
        other => panic!("expected SessionDataUpdated, got {:?}", other),
    }
}

#[test]
fn test_decode_missing_dimensions_default_to_zero() {
    // Legacy map-shaped snapshots may omit rows/columns; they default to
    // 0 so the monotonic grow path treats them as a no-op.
    let raw = json!({
        "event": "sessionData",
        "sessionData": { "A1": "10" },
    });

    let ev: ServerEvent = serde_json::from_value(raw).unwrap();
    match ev {
        ServerEvent::SessionData(msg) => {
            assert_eq!(msg.rows, 0);
            assert_eq!(msg.columns, 0);
        }
        other => panic!("expected SessionData, got {:?}", other),
    }
}

#[test]
fn test_decode_presence_events() {
    let focused: ServerEvent = serde_json::from_value(json!({
        "event": "cellFocused",
        "cellId": "B1",
        "username": "bob",
    }))
    .unwrap();
    match focused {
        ServerEvent::CellFocused(msg) => {
            assert_eq!(msg.cell_id, "B1");
            assert_eq!(msg.username, "bob");
        }
        other => panic!("expected CellFocused, got {:?}", other),
    }

    let unfocused: ServerEvent = serde_json::from_value(json!({
        "event": "cellUnfocused",
        "cellId": "B1",
    }))
    .unwrap();
    assert!(matches!(unfocused, ServerEvent::CellUnfocused(_)));
}

#[test]
fn test_decode_error_event() {
    let ev: ServerEvent = serde_json::from_value(json!({
        "event": "error",
        "message": "Session is full",
    }))
    .unwrap();
    match ev {
        ServerEvent::Error(msg) => assert_eq!(msg.message, "Session is full"),
        other => panic!("expected Error, got {:?}", other),
    }
}

#[test]
fn test_client_events_roundtrip() {
    let events = vec![
        ClientEvent::JoinSession(JoinSessionMessage {
            session_id: "s".into(),
            user_id: "u".into(),
            username: "n".into(),
            email: "e".into(),
        }),
        ClientEvent::FocusCell(FocusCellMessage {
            session_id: "s".into(),
            cell_id: "A1".into(),
            username: "n".into(),
        }),
        ClientEvent::AddRow(AddRowMessage {
            session_id: "s".into(),
            user_id: "u".into(),
        }),
    ];

    for ev in events {
        let json = serde_json::to_string(&ev).unwrap();
        let back: ClientEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(
            serde_json::to_value(&back).unwrap(),
            serde_json::to_value(&ev).unwrap()
        );
    }
}

#[test]
fn test_snapshot_data_serializes_both_shapes() {
    let pairs = SnapshotData::Pairs(vec![("A1".into(), "1".into())]);
    assert_eq!(serde_json::to_value(&pairs).unwrap(), json!([["A1", "1"]]));

    let map = SnapshotData::Map([("A1".to_string(), "1".to_string())].into_iter().collect());
    assert_eq!(serde_json::to_value(&map).unwrap(), json!({ "A1": "1" }));
}
