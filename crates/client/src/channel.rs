//! The outbound event-channel seam.
//!
//! The sync core never opens sockets. It emits [`ClientEvent`]s through
//! whatever implements [`EventChannel`]: a websocket adapter in a real
//! deployment, an in-process loopback in tests and the demo harness.
//! Inbound events take the reverse path: the transport owner decodes
//! [`gridcast_protocol::ServerEvent`]s and feeds them to
//! [`crate::SyncSession::handle_event`].

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use gridcast_protocol::ClientEvent;

/// Bidirectional event channel, outbound half.
pub trait EventChannel {
    /// Send one event. Fire-and-forget with respect to acknowledgment;
    /// a synchronous transport failure still surfaces here.
    fn emit(&mut self, event: ClientEvent) -> Result<(), ChannelError>;

    /// Tear the channel down. Idempotent; every later `emit` fails with
    /// [`ChannelError::Closed`].
    fn close(&mut self);
}

/// Errors from the outbound channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel was closed, locally or by the peer.
    Closed,
    /// Transport-level send failure.
    Transport(String),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::Closed => write!(f, "event channel is closed"),
            ChannelError::Transport(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

impl std::error::Error for ChannelError {}

/// In-process channel delivering emitted events to an `mpsc` receiver.
///
/// Used by the demo harness and tests to observe the outbound stream
/// without a network.
pub struct LoopbackChannel {
    tx: Option<Sender<ClientEvent>>,
}

/// Create a loopback channel and the receiving end of its event stream.
pub fn loopback() -> (LoopbackChannel, Receiver<ClientEvent>) {
    let (tx, rx) = mpsc::channel();
    (LoopbackChannel { tx: Some(tx) }, rx)
}

impl EventChannel for LoopbackChannel {
    fn emit(&mut self, event: ClientEvent) -> Result<(), ChannelError> {
        match &self.tx {
            Some(tx) => tx.send(event).map_err(|_| ChannelError::Closed),
            None => Err(ChannelError::Closed),
        }
    }

    fn close(&mut self) {
        self.tx = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcast_protocol::AddRowMessage;

    fn add_row() -> ClientEvent {
        ClientEvent::AddRow(AddRowMessage {
            session_id: "s".into(),
            user_id: "u".into(),
        })
    }

    #[test]
    fn test_loopback_delivers_events() {
        let (mut chan, rx) = loopback();
        chan.emit(add_row()).unwrap();
        assert!(matches!(rx.recv().unwrap(), ClientEvent::AddRow(_)));
    }

    #[test]
    fn test_emit_after_close_fails() {
        let (mut chan, _rx) = loopback();
        chan.close();
        assert_eq!(chan.emit(add_row()), Err(ChannelError::Closed));
    }

    #[test]
    fn test_close_is_idempotent() {
        let (mut chan, _rx) = loopback();
        chan.close();
        chan.close();
        assert_eq!(chan.emit(add_row()), Err(ChannelError::Closed));
    }

    #[test]
    fn test_emit_fails_when_receiver_dropped() {
        let (mut chan, rx) = loopback();
        drop(rx);
        assert_eq!(chan.emit(add_row()), Err(ChannelError::Closed));
    }
}
