//! The local view of a shared grid.
//!
//! One `GridState` per joined session, owned and mutated exclusively by
//! that session's sync handler. Cells are stored sparsely by wire
//! identifier; an absent identifier renders as the empty string, never as
//! an error. Dimensions only ever grow - there is no shrink operation in
//! the protocol, and none here.

use std::collections::HashMap;

/// Row count a renderer shows before any snapshot has arrived.
pub const DEFAULT_ROWS: usize = 52;
/// Column count a renderer shows before any snapshot has arrived.
pub const DEFAULT_COLUMNS: usize = 52;

/// Sparse cell contents plus current dimensions.
///
/// A fresh state is 0x0; dimensions are learned from the session
/// snapshot and subsequent updates. Renderers that want to paint an
/// empty grid before joining can seed with
/// [`GridState::with_dimensions`] and [`DEFAULT_ROWS`]/[`DEFAULT_COLUMNS`].
#[derive(Debug, Clone, Default)]
pub struct GridState {
    cells: HashMap<String, String>,
    rows: usize,
    columns: usize,
}

impl GridState {
    /// Empty 0x0 state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty state with seeded dimensions.
    pub fn with_dimensions(rows: usize, columns: usize) -> Self {
        Self {
            cells: HashMap::new(),
            rows,
            columns,
        }
    }

    /// Cell text by wire identifier. Unknown identifiers are empty, not
    /// an error.
    pub fn cell(&self, id: &str) -> &str {
        self.cells.get(id).map(String::as_str).unwrap_or("")
    }

    /// Replace a cell's text wholesale. Setting the empty string keeps
    /// the key out of the sparse map.
    pub fn set_cell(&mut self, id: &str, value: &str) {
        if value.is_empty() {
            self.cells.remove(id);
        } else {
            self.cells.insert(id.to_string(), value.to_string());
        }
    }

    /// Apply a batch of (id, value) entries as individual `set_cell`
    /// calls. Entries are independent keys; if the batch repeats a key
    /// the last value wins.
    pub fn merge_cells<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (id, value) in entries {
            self.set_cell(id.as_ref(), value.as_ref());
        }
    }

    /// Current row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Current column count.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of non-empty cells.
    pub fn populated(&self) -> usize {
        self.cells.len()
    }

    /// Raise the row count to `to`. A lesser or equal value is a no-op;
    /// returns whether the dimension changed.
    pub fn grow_rows(&mut self, to: usize) -> bool {
        if to > self.rows {
            self.rows = to;
            true
        } else {
            false
        }
    }

    /// Raise the column count to `to`. A lesser or equal value is a
    /// no-op; returns whether the dimension changed.
    pub fn grow_columns(&mut self, to: usize) -> bool {
        if to > self.columns {
            self.columns = to;
            true
        } else {
            false
        }
    }

    /// Full cell contents as an ordered (id, value) sequence - the shape
    /// broadcast to other participants. Sorted by identifier so the
    /// output is deterministic regardless of map iteration order.
    pub fn snapshot_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .cells
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_cell_is_empty() {
        let grid = GridState::new();
        assert_eq!(grid.cell("A1"), "");
        assert_eq!(grid.cell("ZZ999"), "");
    }

    #[test]
    fn test_set_and_get() {
        let mut grid = GridState::new();
        grid.set_cell("B2", "x");
        assert_eq!(grid.cell("B2"), "x");
        grid.set_cell("B2", "y");
        assert_eq!(grid.cell("B2"), "y");
    }

    #[test]
    fn test_clearing_removes_key() {
        let mut grid = GridState::new();
        grid.set_cell("A1", "10");
        grid.set_cell("A1", "");
        assert_eq!(grid.cell("A1"), "");
        assert_eq!(grid.populated(), 0);
    }

    #[test]
    fn test_merge_cells() {
        let mut grid = GridState::new();
        grid.merge_cells(vec![("A1", "10"), ("B1", "20")]);
        assert_eq!(grid.cell("A1"), "10");
        assert_eq!(grid.cell("B1"), "20");
    }

    #[test]
    fn test_merge_duplicate_key_last_wins() {
        let mut grid = GridState::new();
        grid.merge_cells(vec![("A1", "first"), ("A1", "second")]);
        assert_eq!(grid.cell("A1"), "second");
    }

    #[test]
    fn test_grow_is_monotonic() {
        let mut grid = GridState::new();
        assert!(grid.grow_rows(5));
        assert!(grid.grow_columns(5));
        assert!(!grid.grow_rows(3));
        assert!(!grid.grow_columns(5));
        assert_eq!(grid.rows(), 5);
        assert_eq!(grid.columns(), 5);
        assert!(grid.grow_rows(6));
        assert_eq!(grid.rows(), 6);
    }

    #[test]
    fn test_snapshot_pairs_sorted() {
        let mut grid = GridState::new();
        grid.set_cell("C3", "3");
        grid.set_cell("A1", "1");
        grid.set_cell("B2", "2");
        let pairs = grid.snapshot_pairs();
        assert_eq!(
            pairs,
            vec![
                ("A1".to_string(), "1".to_string()),
                ("B2".to_string(), "2".to_string()),
                ("C3".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_seeded_dimensions() {
        let grid = GridState::with_dimensions(DEFAULT_ROWS, DEFAULT_COLUMNS);
        assert_eq!(grid.rows(), 52);
        assert_eq!(grid.columns(), 52);
        assert_eq!(grid.populated(), 0);
    }
}
