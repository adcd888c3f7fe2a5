//! gridcast-client — the client-side synchronization core.
//!
//! Reconciles locally originated edits, remotely broadcast edits, cell
//! focus presence signals, and grid growth into one consistent view,
//! without echo loops or lost updates over an unordered broadcast
//! channel.
//!
//! The transport is a seam: anything that can emit [`ClientEvent`]s
//! implements [`EventChannel`], and inbound [`ServerEvent`]s are fed to
//! [`SyncSession::handle_event`] by whoever owns the socket. Update
//! submissions go through the separate [`UpdateSubmitter`] seam
//! (HTTP in production, anything in tests).

pub mod channel;
pub mod identity;
pub mod submit;
pub mod sync;

pub use channel::{loopback, ChannelError, EventChannel, LoopbackChannel};
pub use identity::SessionIdentity;
pub use submit::{HttpSubmitter, RetryPolicy, RetryingSubmitter, SubmitError, UpdateSubmitter};
pub use sync::{ApplyOutcome, SkipReason, SyncError, SyncSession, SyncState, UpdateOrigin};

pub use gridcast_protocol::{ClientEvent, ServerEvent};
