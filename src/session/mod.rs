pub mod stats;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scramble::PuzzleId;
use crate::session::stats::{SessionStats, session_stats};
use crate::store::json_store::JsonStore;
use crate::store::schema::SolveData;

/// Solves retained per puzzle; the oldest record is evicted past this.
pub const RETENTION_WINDOW: usize = 50;

/// Recent-times sidebar depth.
pub const RECENT_LIMIT: usize = 13;

/// One timed solve. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolveRecord {
    pub elapsed_secs: f64,
    pub scramble: String,
    pub recorded_at: DateTime<Utc>,
}

impl SolveRecord {
    pub fn new(elapsed_secs: f64, scramble: impl Into<String>) -> Self {
        Self {
            elapsed_secs,
            scramble: scramble.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Per-puzzle insertion-ordered solve history, capped at
/// [`RETENTION_WINDOW`]. Persists through the injected store after every
/// mutation; statistics are recomputed on demand from the retained times.
pub struct SolveHistory {
    puzzles: HashMap<PuzzleId, Vec<SolveRecord>>,
    store: JsonStore,
}

impl SolveHistory {
    pub fn load(store: JsonStore) -> Self {
        let puzzles = store.load_solves().puzzles;
        Self { puzzles, store }
    }

    pub fn append(&mut self, puzzle: &PuzzleId, record: SolveRecord) {
        let records = self.puzzles.entry(puzzle.clone()).or_default();
        records.push(record);
        if records.len() > RETENTION_WINDOW {
            let overflow = records.len() - RETENTION_WINDOW;
            records.drain(..overflow);
        }
        self.persist();
    }

    /// Removes and returns the most recent solve. No-op on empty history.
    pub fn delete_last(&mut self, puzzle: &PuzzleId) -> Option<SolveRecord> {
        let removed = self.puzzles.get_mut(puzzle).and_then(Vec::pop);
        if removed.is_some() {
            self.persist();
        }
        removed
    }

    pub fn reset(&mut self, puzzle: &PuzzleId) {
        if let Some(records) = self.puzzles.get_mut(puzzle) {
            records.clear();
        }
        self.persist();
    }

    pub fn reset_all(&mut self) {
        self.puzzles.clear();
        self.persist();
    }

    pub fn records(&self, puzzle: &PuzzleId) -> &[SolveRecord] {
        self.puzzles.get(puzzle).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn last(&self, puzzle: &PuzzleId) -> Option<&SolveRecord> {
        self.records(puzzle).last()
    }

    /// Newest first, at most `limit` entries.
    pub fn recent(&self, puzzle: &PuzzleId, limit: usize) -> Vec<&SolveRecord> {
        self.records(puzzle).iter().rev().take(limit).collect()
    }

    pub fn times(&self, puzzle: &PuzzleId) -> Vec<f64> {
        self.records(puzzle).iter().map(|r| r.elapsed_secs).collect()
    }

    pub fn stats(&self, puzzle: &PuzzleId) -> SessionStats {
        session_stats(&self.times(puzzle))
    }

    fn persist(&self) {
        let data = SolveData {
            puzzles: self.puzzles.clone(),
            ..SolveData::default()
        };
        let _ = self.store.save_solves(&data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_history() -> (TempDir, SolveHistory) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, SolveHistory::load(store))
    }

    fn cube() -> PuzzleId {
        PuzzleId::new("3x3x3")
    }

    #[test]
    fn append_and_stats() {
        let (_dir, mut history) = make_history();
        for t in [10.0, 20.0, 30.0, 40.0, 50.0] {
            history.append(&cube(), SolveRecord::new(t, "R U R'"));
        }
        let stats = history.stats(&cube());
        assert_eq!(stats.count, 5);
        assert_eq!(stats.best, Some(10.0));
        assert_eq!(stats.ao5, Some(30.0));
    }

    #[test]
    fn eviction_keeps_exactly_the_last_fifty_in_order() {
        let (_dir, mut history) = make_history();
        for i in 0..60 {
            history.append(&cube(), SolveRecord::new(i as f64, format!("scramble {i}")));
        }
        let records = history.records(&cube());
        assert_eq!(records.len(), RETENTION_WINDOW);
        assert_eq!(records[0].scramble, "scramble 10");
        assert_eq!(records[49].scramble, "scramble 59");
        assert_eq!(history.stats(&cube()).count, 50);
    }

    #[test]
    fn delete_last_removes_the_tail() {
        let (_dir, mut history) = make_history();
        history.append(&cube(), SolveRecord::new(9.5, "a"));
        history.append(&cube(), SolveRecord::new(8.5, "b"));
        let removed = history.delete_last(&cube()).unwrap();
        assert_eq!(removed.scramble, "b");
        assert_eq!(history.stats(&cube()).count, 1);
    }

    #[test]
    fn delete_last_on_empty_is_a_noop() {
        let (_dir, mut history) = make_history();
        assert!(history.delete_last(&cube()).is_none());
        assert_eq!(history.stats(&cube()).count, 0);
    }

    #[test]
    fn recent_is_newest_first_and_capped() {
        let (_dir, mut history) = make_history();
        for i in 0..20 {
            history.append(&cube(), SolveRecord::new(i as f64, "s"));
        }
        let recent = history.recent(&cube(), RECENT_LIMIT);
        assert_eq!(recent.len(), 13);
        assert_eq!(recent[0].elapsed_secs, 19.0);
        assert_eq!(recent[12].elapsed_secs, 7.0);
    }

    #[test]
    fn history_survives_reload() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        {
            let mut history = SolveHistory::load(store.clone());
            history.append(&cube(), SolveRecord::new(14.2, "D2 F R"));
        }
        let reloaded = SolveHistory::load(store);
        assert_eq!(reloaded.stats(&cube()).count, 1);
        assert_eq!(reloaded.records(&cube())[0].scramble, "D2 F R");
    }

    #[test]
    fn reset_clears_one_puzzle_only() {
        let (_dir, mut history) = make_history();
        history.append(&cube(), SolveRecord::new(1.0, "a"));
        history.append(&PuzzleId::new("Skewb"), SolveRecord::new(2.0, "b"));
        history.reset(&cube());
        assert_eq!(history.stats(&cube()).count, 0);
        assert_eq!(history.stats(&PuzzleId::new("Skewb")).count, 1);
    }
}
