//! gridcast Session Protocol — v1 Frozen Wire Format
//!
//! This crate defines the canonical event types exchanged between a grid
//! client and the session service. Payloads are JSON-shaped; the casing
//! on the wire is camelCase (`joinSession`, `sessionDataUpdated`,
//! `senderId`, ...) and is frozen. Changes require:
//! 1. Version bump in PROTOCOL_VERSION
//! 2. New golden vectors in `tests/wire_golden.rs`
//! 3. Backward compatibility handling
//!
//! The transport itself (socket establishment, delivery, reconnects) is
//! not specified here, only the event names, payload shapes, and the
//! companion update-submission body.
//!
//! # Usage
//!
//! ```ignore
//! use gridcast_protocol::{ClientEvent, ServerEvent, JoinSessionMessage};
//!
//! let ev = ClientEvent::JoinSession(JoinSessionMessage { /* ... */ });
//! let json = serde_json::to_string(&ev)?;
//!
//! let inbound: ServerEvent = serde_json::from_str(&line)?;
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Current protocol version. Increment for breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

// =============================================================================
// Client → Session Events
// =============================================================================

/// Events emitted by a client onto the session channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Enter a session. Must be the first event a client sends.
    JoinSession(JoinSessionMessage),

    /// Announce that this participant focused a cell.
    FocusCell(FocusCellMessage),

    /// Announce that this participant left a cell.
    UnfocusCell(UnfocusCellMessage),

    /// Ask the session authority to append one row.
    AddRow(AddRowMessage),

    /// Ask the session authority to append one column.
    AddColumn(AddColumnMessage),
}

/// Join request carrying the full session identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionMessage {
    pub session_id: String,
    pub user_id: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusCellMessage {
    pub session_id: String,
    pub cell_id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfocusCellMessage {
    pub session_id: String,
    pub cell_id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRowMessage {
    pub session_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddColumnMessage {
    pub session_id: String,
    pub user_id: String,
}

// =============================================================================
// Session → Client Events
// =============================================================================

/// Events a client receives from the session channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Initial full snapshot, sent once after joining.
    SessionData(SessionDataMessage),

    /// Incremental broadcast of another participant's update round.
    SessionDataUpdated(SessionDataUpdatedMessage),

    /// A participant focused a cell.
    CellFocused(CellFocusedMessage),

    /// A participant left a cell.
    CellUnfocused(CellUnfocusedMessage),

    /// Non-fatal notice from the session service.
    Error(ErrorMessage),
}

/// Initial snapshot payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDataMessage {
    pub session_data: SnapshotData,
    #[serde(default)]
    pub rows: usize,
    #[serde(default)]
    pub columns: usize,
}

/// Incremental broadcast payload, tagged with the sender so clients can
/// discard echoes of their own updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDataUpdatedMessage {
    pub session_data: SnapshotData,
    #[serde(default)]
    pub rows: usize,
    #[serde(default)]
    pub columns: usize,
    pub sender_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFocusedMessage {
    pub cell_id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellUnfocusedMessage {
    pub cell_id: String,
}

/// Non-fatal error notice. Surfaced to the user, never fatal to the
/// session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

// =============================================================================
// Snapshot Payload
// =============================================================================

/// The two accepted wire shapes for grid contents, plus a catch-all so a
/// message with an unrecognized shape still parses and can be rejected
/// at normalization instead of failing the whole envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotData {
    /// Ordered sequence of (id, value) pairs: `[["A1","10"],["B1","20"]]`
    Pairs(Vec<(String, String)>),
    /// Direct id → value map: `{"A1":"10","B1":"20"}`
    Map(BTreeMap<String, String>),
    /// Anything else. Rejected by [`SnapshotData::into_entries`].
    Other(serde_json::Value),
}

impl SnapshotData {
    /// Normalize into the canonical in-memory shape: an ordered entry
    /// list. The unrecognized shape is a protocol error the caller is
    /// expected to log and ignore.
    pub fn into_entries(self) -> Result<Vec<(String, String)>, SnapshotShapeError> {
        match self {
            SnapshotData::Pairs(pairs) => Ok(pairs),
            SnapshotData::Map(map) => Ok(map.into_iter().collect()),
            SnapshotData::Other(value) => Err(SnapshotShapeError(shape_of(&value))),
        }
    }

    /// Number of entries, if the shape is recognized.
    pub fn len(&self) -> Option<usize> {
        match self {
            SnapshotData::Pairs(pairs) => Some(pairs.len()),
            SnapshotData::Map(map) => Some(map.len()),
            SnapshotData::Other(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

fn shape_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// A snapshot arrived in neither the pairs nor the map shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotShapeError(pub &'static str);

impl fmt::Display for SnapshotShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session data is not pairs or a map (got {})", self.0)
    }
}

impl std::error::Error for SnapshotShapeError {}

// =============================================================================
// Companion Update Submission
// =============================================================================

/// Body of the update submission posted outside the event channel. The
/// full current cell map travels as an ordered pair sequence, tagged
/// with the sender so receivers can discard the echoed broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    pub session_data: Vec<(String, String)>,
    pub sender_id: String,
}
