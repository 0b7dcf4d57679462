//! Fastest-run leaderboard
//!
//! Persisted as a JSON list sorted ascending by finish time, top 10 kept.
//! Only completed runs are ranked.

use serde::{Deserialize, Serialize};

use crate::persistence::{Storage, StorageError};
use crate::sim::{RunOutcome, RunStats};

/// Maximum number of entries to keep
pub const MAX_ENTRIES: usize = 10;

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    /// Finish time in seconds
    pub time: f64,
    pub collisions: u32,
    pub score: u32,
}

impl LeaderboardEntry {
    /// Build an entry from a completed run; None for game-over runs
    pub fn from_run(name: &str, stats: &RunStats) -> Option<Self> {
        if stats.outcome != RunOutcome::Completed {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            time: stats.elapsed,
            collisions: stats.collisions,
            score: stats.score,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "lane_dash_leaderboard";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best (lowest) time, if any
    pub fn best_time(&self) -> Option<f64> {
        self.entries.first().map(|e| e.time)
    }

    /// Check if a finish time would make the board
    pub fn qualifies(&self, time: f64) -> bool {
        if !time.is_finite() {
            return false;
        }
        if self.entries.len() < MAX_ENTRIES {
            return true;
        }
        self.entries.last().map(|e| time < e.time).unwrap_or(true)
    }

    /// Rank a time would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, time: f64) -> Option<usize> {
        if !self.qualifies(time) {
            return None;
        }
        let rank = self.entries.iter().position(|e| time < e.time);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert an entry, keeping ascending order and the size cap.
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify.
    pub fn insert(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        if !self.qualifies(entry.time) {
            return None;
        }

        // Ties go after existing entries
        let pos = self.entries.iter().position(|e| entry.time < e.time);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_ENTRIES);

        Some(rank)
    }

    /// Parse a persisted list. Corrupt data yields an empty board.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Vec<LeaderboardEntry>>(json) {
            Ok(mut entries) => {
                entries.retain(|e| e.time.is_finite());
                entries.sort_by(|a, b| a.time.total_cmp(&b.time));
                entries.truncate(MAX_ENTRIES);
                Self { entries }
            }
            Err(e) => {
                log::warn!("Corrupt leaderboard ignored: {}", e);
                Self::new()
            }
        }
    }

    pub fn to_json(&self) -> String {
        // Plain data; serializing a Vec of these cannot fail
        serde_json::to_string(&self.entries).unwrap_or_else(|_| "[]".to_string())
    }

    /// Load from storage; absent or corrupt storage is an empty board
    pub fn load(storage: &dyn Storage) -> Self {
        match storage.load(Self::STORAGE_KEY) {
            Some(json) => {
                let board = Self::from_json(&json);
                log::info!("Loaded {} leaderboard entries", board.entries.len());
                board
            }
            None => {
                log::info!("No leaderboard found, starting fresh");
                Self::new()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        storage.store(Self::STORAGE_KEY, &self.to_json())?;
        log::info!("Leaderboard saved ({} entries)", self.entries.len());
        Ok(())
    }
}

/// Format a finish time as `m:ss.cc`
pub fn format_time(seconds: f64) -> String {
    let centis = (seconds.max(0.0) * 100.0).round() as u64;
    format!("{}:{:02}.{:02}", centis / 6000, (centis / 100) % 60, centis % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    fn entry(name: &str, time: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.into(),
            time,
            collisions: 0,
            score: 2000,
        }
    }

    #[test]
    fn test_insert_keeps_ascending_order() {
        let mut board = Leaderboard::new();
        assert_eq!(board.insert(entry("b", 90.0)), Some(1));
        assert_eq!(board.insert(entry("a", 80.0)), Some(1));
        assert_eq!(board.insert(entry("c", 100.0)), Some(3));
        assert_eq!(board.insert(entry("tie", 90.0)), Some(3));
        let names: Vec<&str> = board.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "tie", "c"]);
    }

    #[test]
    fn test_capped_at_ten() {
        let mut board = Leaderboard::new();
        for i in 0..10 {
            board.insert(entry("x", 100.0 + i as f64));
        }
        assert!(!board.qualifies(200.0));
        assert_eq!(board.insert(entry("slow", 200.0)), None);
        assert_eq!(board.potential_rank(50.0), Some(1));
        assert_eq!(board.insert(entry("fast", 50.0)), Some(1));
        assert_eq!(board.entries().len(), MAX_ENTRIES);
        assert_eq!(board.entries().last().unwrap().time, 108.0);
    }

    #[test]
    fn test_only_completed_runs_make_entries() {
        let mut stats = RunStats {
            outcome: RunOutcome::GameOver,
            seed: 1,
            elapsed: 60.0,
            distance: 900.0,
            average_speed: 15.0,
            collisions: 3,
            score: 900,
        };
        assert!(LeaderboardEntry::from_run("p", &stats).is_none());
        stats.outcome = RunOutcome::Completed;
        let e = LeaderboardEntry::from_run("p", &stats).unwrap();
        assert_eq!(e.time, 60.0);
        assert_eq!(e.score, 900);
    }

    #[test]
    fn test_corrupt_or_missing_is_empty() {
        let mut storage = MemoryStorage::new();
        assert!(Leaderboard::load(&storage).is_empty());
        storage.store(Leaderboard::STORAGE_KEY, "{ not json").unwrap();
        assert!(Leaderboard::load(&storage).is_empty());
    }

    #[test]
    fn test_save_load_normalizes() {
        let mut storage = MemoryStorage::new();
        storage
            .store(
                Leaderboard::STORAGE_KEY,
                r#"[{"name":"b","time":9.0,"collisions":1,"score":5},
                    {"name":"a","time":3.0,"collisions":0,"score":7}]"#,
            )
            .unwrap();
        let mut board = Leaderboard::load(&storage);
        assert_eq!(board.best_time(), Some(3.0));
        board.insert(entry("c", 5.0));
        board.save(&mut storage).unwrap();
        let reloaded = Leaderboard::load(&storage);
        assert_eq!(reloaded, board);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(83.456), "1:23.46");
        assert_eq!(format_time(5.0), "0:05.00");
    }
}
