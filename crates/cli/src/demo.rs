//! Loopback demo: the full sync story with two in-process clients.
//!
//! Proves end-to-end, with no network and no server: join -> snapshot ->
//! local edit -> broadcast round -> echo discard -> presence -> growth ->
//! teardown. The session authority is an in-process stand-in that stores
//! submitted rounds and re-broadcasts them tagged with the sender, which
//! is all the external collaborator contract requires.
//!
//! Each step prints an OK/FAIL line; the first failure aborts with a
//! clean error message.

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use gridcast_client::{
    loopback, ApplyOutcome, SessionIdentity, SkipReason, SubmitError, SyncSession, SyncState,
    UpdateOrigin, UpdateSubmitter,
};
use gridcast_protocol::{
    CellFocusedMessage, CellUnfocusedMessage, ClientEvent, ServerEvent, SessionDataMessage,
    SessionDataUpdatedMessage, SessionUpdate, SnapshotData,
};
use uuid::Uuid;

/// In-process session authority: stores update rounds for re-broadcast.
#[derive(Clone, Default)]
struct Authority {
    rounds: Arc<Mutex<Vec<SessionUpdate>>>,
}

impl Authority {
    fn round_count(&self) -> usize {
        self.rounds.lock().unwrap().len()
    }

    fn broadcast(&self, i: usize, rows: usize, columns: usize) -> ServerEvent {
        let round = self.rounds.lock().unwrap()[i].clone();
        ServerEvent::SessionDataUpdated(SessionDataUpdatedMessage {
            session_data: SnapshotData::Pairs(round.session_data),
            rows,
            columns,
            sender_id: round.sender_id,
        })
    }
}

impl UpdateSubmitter for Authority {
    fn submit(&mut self, _: &str, update: &SessionUpdate) -> Result<(), SubmitError> {
        self.rounds.lock().unwrap().push(update.clone());
        Ok(())
    }
}

struct DemoRunner {
    verbose: bool,
    step_times: Vec<(String, Duration)>,
}

impl DemoRunner {
    fn run_step<F>(&mut self, name: &str, f: F) -> Result<(), String>
    where
        F: FnOnce(&mut Self) -> Result<String, String>,
    {
        let start = Instant::now();
        match f(self) {
            Ok(detail) => {
                self.step_times.push((name.to_string(), start.elapsed()));
                println!("\x1b[32mOK\x1b[0m   step={} {}", name, detail);
                Ok(())
            }
            Err(e) => {
                println!("\x1b[31mFAIL\x1b[0m step={} {}", name, e);
                Err(e)
            }
        }
    }

    fn expect_event(
        &self,
        rx: &Receiver<ClientEvent>,
        what: &str,
    ) -> Result<ClientEvent, String> {
        let event = rx
            .try_recv()
            .map_err(|_| format!("expected outbound {} event, channel was empty", what))?;
        if self.verbose {
            eprintln!(">>> {}", serde_json::to_string(&event).unwrap_or_default());
        }
        Ok(event)
    }
}

/// Run the scripted walkthrough. `Err` carries the first failed step's
/// message.
pub fn run(username: &str, email: &str, verbose: bool) -> Result<(), String> {
    let mut runner = DemoRunner {
        verbose,
        step_times: Vec::new(),
    };

    let session_id = Uuid::new_v4().to_string();
    let authority = Authority::default();

    let local_identity = SessionIdentity::new(
        session_id.clone(),
        Uuid::new_v4().to_string(),
        username,
        email,
    );
    let peer_identity = SessionIdentity::new(
        session_id.clone(),
        Uuid::new_v4().to_string(),
        "remote-peer",
        "peer@example.com",
    );

    let (local_chan, local_rx) = loopback();
    let (peer_chan, peer_rx) = loopback();
    let mut local = SyncSession::new(local_identity, local_chan, authority.clone());
    let mut peer = SyncSession::new(peer_identity, peer_chan, authority.clone());

    println!(
        "\n\x1b[1mgridcast sync demo\x1b[0m  session={}\n",
        &session_id[..8]
    );

    // Step: join
    runner.run_step("join", |r| {
        local.join().map_err(|e| e.to_string())?;
        peer.join().map_err(|e| e.to_string())?;

        for (rx, who) in [(&local_rx, "local"), (&peer_rx, "peer")] {
            match r.expect_event(rx, "joinSession")? {
                ClientEvent::JoinSession(msg) => {
                    if msg.session_id != session_id {
                        return Err(format!("{} joined wrong session {}", who, msg.session_id));
                    }
                }
                other => return Err(format!("{} emitted {:?} instead of join", who, other)),
            }
        }
        Ok(format!("both participants joining session {}", &session_id[..8]))
    })?;

    // Step: snapshot
    runner.run_step("snapshot", |_| {
        let snapshot = || {
            ServerEvent::SessionData(SessionDataMessage {
                session_data: SnapshotData::Pairs(vec![
                    ("A1".into(), "10".into()),
                    ("B1".into(), "20".into()),
                ]),
                rows: 52,
                columns: 52,
            })
        };
        for session in [&mut local, &mut peer] {
            match session.handle_event(snapshot()) {
                ApplyOutcome::SnapshotApplied { cells: 2 } => {}
                other => return Err(format!("snapshot not applied: {:?}", other)),
            }
            if session.state() != SyncState::Synchronized {
                return Err(format!("state is {:?}, not Synchronized", session.state()));
            }
        }
        if local.grid().cell("A1") != "10" || local.grid().cell("B1") != "20" {
            return Err("snapshot cells missing from grid".to_string());
        }
        Ok(format!(
            "2 cells, {}x{} grid",
            local.grid().rows(),
            local.grid().columns()
        ))
    })?;

    // Step: edit + broadcast round
    runner.run_step("edit", |_| {
        local.edit_cell("C3", "hello", UpdateOrigin::Local);
        if authority.round_count() != 1 {
            return Err(format!(
                "expected exactly 1 submitted round, got {}",
                authority.round_count()
            ));
        }

        let round = authority.broadcast(0, 52, 52);
        match peer.handle_event(round.clone()) {
            ApplyOutcome::UpdateApplied { .. } => {}
            other => return Err(format!("peer did not apply the round: {:?}", other)),
        }
        peer.edit_cell("C3", "hello", UpdateOrigin::Remote);

        match local.handle_event(round) {
            ApplyOutcome::Skipped(SkipReason::EchoDiscarded) => {}
            other => return Err(format!("echo not discarded: {:?}", other)),
        }

        if authority.round_count() != 1 {
            return Err("remote apply re-broadcast the round (echo loop)".to_string());
        }
        if peer.grid().cell("C3") != "hello" {
            return Err("edit did not reach the peer".to_string());
        }
        Ok("1 round, applied by peer, echo discarded".to_string())
    })?;

    // Step: presence
    runner.run_step("presence", |r| {
        peer.focus_cell("B1").map_err(|e| e.to_string())?;
        let focused = match r.expect_event(&peer_rx, "focusCell")? {
            ClientEvent::FocusCell(msg) => msg,
            other => return Err(format!("peer emitted {:?} instead of focus", other)),
        };

        local.handle_event(ServerEvent::CellFocused(CellFocusedMessage {
            cell_id: focused.cell_id,
            username: focused.username,
        }));
        if local.presence().focused_cell() != Some("B1") {
            return Err("focus indicator not set".to_string());
        }

        // A stale unfocus for another cell must not clear it.
        match local.handle_event(ServerEvent::CellUnfocused(CellUnfocusedMessage {
            cell_id: "A1".into(),
        })) {
            ApplyOutcome::Skipped(SkipReason::StaleUnfocus) => {}
            other => return Err(format!("stale unfocus not ignored: {:?}", other)),
        }
        if local.presence().focused_cell() != Some("B1") {
            return Err("stale unfocus clobbered the indicator".to_string());
        }

        local.handle_event(ServerEvent::CellUnfocused(CellUnfocusedMessage {
            cell_id: "B1".into(),
        }));
        if local.presence().focused_cell().is_some() {
            return Err("matching unfocus did not clear the indicator".to_string());
        }
        Ok("focus tracked, stale unfocus ignored, cleared on match".to_string())
    })?;

    // Step: growth
    runner.run_step("growth", |r| {
        local.request_add_row().map_err(|e| e.to_string())?;
        match r.expect_event(&local_rx, "addRow")? {
            ClientEvent::AddRow(_) => {}
            other => return Err(format!("emitted {:?} instead of addRow", other)),
        }
        if local.grid().rows() != 52 {
            return Err("dimension changed before confirmation".to_string());
        }

        let confirmation = ServerEvent::SessionDataUpdated(SessionDataUpdatedMessage {
            session_data: SnapshotData::Pairs(vec![]),
            rows: 53,
            columns: 52,
            sender_id: "authority".into(),
        });
        local.handle_event(confirmation.clone());
        peer.handle_event(confirmation);

        if local.grid().rows() != 53 || peer.grid().rows() != 53 {
            return Err("growth confirmation did not land on both clients".to_string());
        }
        Ok("52 -> 53 rows on confirmation, both participants".to_string())
    })?;

    // Step: teardown
    runner.run_step("teardown", |_| {
        local.leave();
        if local.state() != SyncState::Disconnected {
            return Err(format!("state is {:?} after leave", local.state()));
        }
        match local.handle_event(ServerEvent::SessionDataUpdated(SessionDataUpdatedMessage {
            session_data: SnapshotData::Pairs(vec![("A1".into(), "late".into())]),
            rows: 53,
            columns: 52,
            sender_id: "authority".into(),
        })) {
            ApplyOutcome::Skipped(SkipReason::Disconnected) => {}
            other => return Err(format!("event processed after teardown: {:?}", other)),
        }
        if local.grid().cell("A1") != "10" {
            return Err("grid mutated after teardown".to_string());
        }
        Ok("channel closed, late events dropped".to_string())
    })?;

    println!("\n\x1b[32mAll steps passed.\x1b[0m");
    let total: Duration = runner.step_times.iter().map(|(_, d)| *d).sum();
    println!("Total time: {:?}", total);
    if verbose {
        for (name, dur) in &runner.step_times {
            println!("  {}: {:?}", name, dur);
        }
    }
    Ok(())
}
