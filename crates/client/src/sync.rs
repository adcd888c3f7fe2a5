//! The session sync state machine.
//!
//! One `SyncSession` per joined session, driven by exactly one event at
//! a time: the owner dequeues inbound [`ServerEvent`]s and feeds them to
//! [`SyncSession::handle_event`], and routes UI input through
//! [`SyncSession::edit_cell`] and the focus/growth methods. All grid,
//! presence, and lifecycle state lives here, single-writer, no locks.
//!
//! # State machine
//!
//! ```text
//! Disconnected --join()--> Joining --sessionData--> Synchronized
//!       ^                                                |
//!       +---------------------- leave() ----------------+
//! ```
//!
//! # Echo avoidance
//!
//! Every broadcast carries the sender's id; an inbound update whose
//! sender is this client is an echo of its own earlier submission and is
//! discarded whole. In the other direction, a cell change produced by
//! applying a remote update is tagged [`UpdateOrigin::Remote`] and is
//! never re-submitted; only [`UpdateOrigin::Local`] changes (typed by
//! the user) go back out. The two rules together keep edits from
//! ping-ponging between participants while the channel stays free to
//! reorder traffic across peers.

use gridcast_core::{GridState, Presence};
use gridcast_protocol::{
    AddColumnMessage, AddRowMessage, ClientEvent, FocusCellMessage, JoinSessionMessage,
    ServerEvent, SessionDataMessage, SessionDataUpdatedMessage, SessionUpdate, UnfocusCellMessage,
};

use crate::channel::{ChannelError, EventChannel};
use crate::identity::SessionIdentity;
use crate::submit::UpdateSubmitter;

use std::fmt;

/// Lifecycle of a sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No join emitted, or torn down.
    Disconnected,
    /// Join emitted, waiting for the initial snapshot.
    Joining,
    /// Snapshot applied; live.
    Synchronized,
}

/// Where a cell mutation came from.
///
/// Threaded explicitly through [`SyncSession::edit_cell`] instead of a
/// shared suppression flag, so one remote apply can never leak into an
/// unrelated local edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    /// Typed by this participant. Broadcast to the session.
    Local,
    /// Produced by applying a remote update. Never re-broadcast.
    Remote,
}

/// What [`SyncSession::handle_event`] did with an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Initial snapshot merged into the grid.
    SnapshotApplied { cells: usize },
    /// Remote update round merged into the grid.
    UpdateApplied { cells: usize },
    /// Presence indicator moved.
    FocusChanged,
    /// Presence indicator cleared.
    FocusCleared,
    /// Non-fatal notice for the user.
    ServerNotice(String),
    /// Event had no effect (see reason).
    Skipped(SkipReason),
}

/// Why an inbound event was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The update's sender is this client: an echo of its own submission.
    EchoDiscarded,
    /// Session data arrived in an unrecognized shape.
    MalformedSnapshot,
    /// Unfocus named a cell that is not the focused one.
    StaleUnfocus,
    /// The session was already torn down.
    Disconnected,
}

/// Errors from session operations.
#[derive(Debug)]
pub enum SyncError {
    /// `join` called on a session that already joined.
    AlreadyJoined,
    /// An operation that needs a joined session ran before `join`.
    NotJoined,
    /// The outbound channel failed.
    Channel(ChannelError),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::AlreadyJoined => write!(f, "session already joined"),
            SyncError::NotJoined => write!(f, "session not joined"),
            SyncError::Channel(e) => write!(f, "channel error: {}", e),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<ChannelError> for SyncError {
    fn from(e: ChannelError) -> Self {
        SyncError::Channel(e)
    }
}

/// The client-side synchronization core for one session.
pub struct SyncSession<C, S> {
    identity: SessionIdentity,
    channel: C,
    submitter: S,
    grid: GridState,
    presence: Presence,
    state: SyncState,
}

impl<C: EventChannel, S: UpdateSubmitter> SyncSession<C, S> {
    /// Create a session in the `Disconnected` state with an empty grid.
    pub fn new(identity: SessionIdentity, channel: C, submitter: S) -> Self {
        Self {
            identity,
            channel,
            submitter,
            grid: GridState::new(),
            presence: Presence::new(),
            state: SyncState::Disconnected,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// The reconciled grid view for a renderer to consume.
    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    /// The focus-indicator view for a renderer to consume.
    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Emit the join request and start waiting for the snapshot.
    pub fn join(&mut self) -> Result<(), SyncError> {
        if self.state != SyncState::Disconnected {
            return Err(SyncError::AlreadyJoined);
        }
        self.channel
            .emit(ClientEvent::JoinSession(JoinSessionMessage {
                session_id: self.identity.session_id.clone(),
                user_id: self.identity.user_id.clone(),
                username: self.identity.username.clone(),
                email: self.identity.email.clone(),
            }))?;
        self.state = SyncState::Joining;
        log::info!(
            "Joining session {} as {}",
            self.identity.session_id,
            self.identity.username
        );
        Ok(())
    }

    /// Tear the session down: close the channel and stop processing.
    /// In-flight submissions are not awaited or retried.
    pub fn leave(&mut self) {
        if self.state != SyncState::Disconnected {
            log::info!("Leaving session {}", self.identity.session_id);
        }
        self.channel.close();
        self.state = SyncState::Disconnected;
    }

    // ========================================================================
    // Inbound path
    // ========================================================================

    /// Process one inbound event to completion. Never fails: every bad
    /// input degrades to a logged [`ApplyOutcome::Skipped`].
    pub fn handle_event(&mut self, event: ServerEvent) -> ApplyOutcome {
        if self.state == SyncState::Disconnected {
            log::debug!("Dropping inbound event after teardown");
            return ApplyOutcome::Skipped(SkipReason::Disconnected);
        }

        match event {
            ServerEvent::SessionData(msg) => self.apply_snapshot(msg),
            ServerEvent::SessionDataUpdated(msg) => self.apply_update(msg),
            ServerEvent::CellFocused(msg) => {
                self.presence.focus(&msg.cell_id, &msg.username);
                ApplyOutcome::FocusChanged
            }
            ServerEvent::CellUnfocused(msg) => {
                if self.presence.unfocus(&msg.cell_id) {
                    ApplyOutcome::FocusCleared
                } else {
                    ApplyOutcome::Skipped(SkipReason::StaleUnfocus)
                }
            }
            ServerEvent::Error(msg) => {
                log::warn!("Session service error: {}", msg.message);
                ApplyOutcome::ServerNotice(msg.message)
            }
        }
    }

    fn apply_snapshot(&mut self, msg: SessionDataMessage) -> ApplyOutcome {
        let entries = match msg.session_data.into_entries() {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Ignoring snapshot: {}", e);
                return ApplyOutcome::Skipped(SkipReason::MalformedSnapshot);
            }
        };

        let cells = entries.len();
        self.grid.merge_cells(entries);
        self.grid.grow_rows(msg.rows);
        self.grid.grow_columns(msg.columns);

        if self.state == SyncState::Joining {
            self.state = SyncState::Synchronized;
            log::info!(
                "Synchronized: {} cells, {}x{}",
                cells,
                self.grid.rows(),
                self.grid.columns()
            );
        }
        ApplyOutcome::SnapshotApplied { cells }
    }

    fn apply_update(&mut self, msg: SessionDataUpdatedMessage) -> ApplyOutcome {
        if msg.sender_id == self.identity.user_id {
            log::debug!("Discarding echo of own update");
            return ApplyOutcome::Skipped(SkipReason::EchoDiscarded);
        }

        let entries = match msg.session_data.into_entries() {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Ignoring update from {}: {}", msg.sender_id, e);
                return ApplyOutcome::Skipped(SkipReason::MalformedSnapshot);
            }
        };

        let cells = entries.len();
        self.grid.merge_cells(entries);
        self.grid.grow_rows(msg.rows);
        self.grid.grow_columns(msg.columns);
        ApplyOutcome::UpdateApplied { cells }
    }

    // ========================================================================
    // Outbound path
    // ========================================================================

    /// Apply a cell edit to the local view, then broadcast it only if
    /// the change originated with this participant.
    ///
    /// The local apply is optimistic and unconditional; a failed
    /// submission is logged and not retried, leaving the local state in
    /// place until the next successful broadcast round heals the gap.
    pub fn edit_cell(&mut self, cell_id: &str, value: &str, origin: UpdateOrigin) {
        self.grid.set_cell(cell_id, value);

        if origin == UpdateOrigin::Remote {
            return;
        }

        let update = SessionUpdate {
            session_data: self.grid.snapshot_pairs(),
            sender_id: self.identity.user_id.clone(),
        };
        if let Err(e) = self.submitter.submit(&self.identity.session_id, &update) {
            log::error!("Update submission failed: {}", e);
        }
    }

    /// Announce focus on a cell. Fire-and-forget.
    pub fn focus_cell(&mut self, cell_id: &str) -> Result<(), SyncError> {
        self.ensure_joined()?;
        self.channel
            .emit(ClientEvent::FocusCell(FocusCellMessage {
                session_id: self.identity.session_id.clone(),
                cell_id: cell_id.to_string(),
                username: self.identity.username.clone(),
            }))?;
        Ok(())
    }

    /// Announce leaving a cell. Fire-and-forget.
    pub fn blur_cell(&mut self, cell_id: &str) -> Result<(), SyncError> {
        self.ensure_joined()?;
        self.channel
            .emit(ClientEvent::UnfocusCell(UnfocusCellMessage {
                session_id: self.identity.session_id.clone(),
                cell_id: cell_id.to_string(),
                username: self.identity.username.clone(),
            }))?;
        Ok(())
    }

    /// Ask the session authority for one more row. The local dimension
    /// changes only when the confirmation comes back on the inbound
    /// path.
    pub fn request_add_row(&mut self) -> Result<(), SyncError> {
        self.ensure_joined()?;
        self.channel.emit(ClientEvent::AddRow(AddRowMessage {
            session_id: self.identity.session_id.clone(),
            user_id: self.identity.user_id.clone(),
        }))?;
        Ok(())
    }

    /// Ask the session authority for one more column.
    pub fn request_add_column(&mut self) -> Result<(), SyncError> {
        self.ensure_joined()?;
        self.channel.emit(ClientEvent::AddColumn(AddColumnMessage {
            session_id: self.identity.session_id.clone(),
            user_id: self.identity.user_id.clone(),
        }))?;
        Ok(())
    }

    fn ensure_joined(&self) -> Result<(), SyncError> {
        if self.state == SyncState::Disconnected {
            Err(SyncError::NotJoined)
        } else {
            Ok(())
        }
    }
}
