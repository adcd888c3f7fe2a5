//! gridcast-core - grid state, cell references, presence.
//!
//! The data half of the sync client: a single-writer view of the shared
//! grid, the A1-style cell identifier codec, and the ephemeral focus
//! indicator state. No I/O lives here.

pub mod cell_ref;
pub mod grid;
pub mod presence;

pub use cell_ref::CellRef;
pub use grid::{GridState, DEFAULT_COLUMNS, DEFAULT_ROWS};
pub use presence::Presence;
