//! Best-time records and the storage boundary around them.
//!
//! The engine never touches storage on its own; after a won game a host
//! reads `elapsed_secs` and the preset name from the session and records
//! the result here.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::GameConfig;

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Score storage could not be accessed")]
    Io(#[from] io::Error),
    #[error("Score storage holds unreadable data")]
    Encoding(#[from] serde_json::Error),
}

/// One recorded win.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub seconds: u32,
    pub achieved_at: DateTime<Utc>,
}

impl ScoreEntry {
    pub fn new(name: impl Into<String>, seconds: u32) -> Self {
        Self {
            name: name.into(),
            seconds,
            achieved_at: Utc::now(),
        }
    }

    /// `mm:ss` rendering used by score tables.
    pub fn formatted_time(&self) -> String {
        format!("{:02}:{:02}", self.seconds / 60, self.seconds % 60)
    }
}

/// Best times per difficulty preset, fastest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    tables: BTreeMap<String, Vec<ScoreEntry>>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a win, keeping the preset's table ordered by time. Custom
    /// configurations have no preset name and are not recorded; earlier
    /// entries with the same time keep their position.
    pub fn record(&mut self, config: GameConfig, entry: ScoreEntry) -> bool {
        let Some(preset) = config.preset_name() else {
            log::warn!("not recording a score for custom difficulty {:?}", config);
            return false;
        };

        let table = self.tables.entry(preset.to_owned()).or_default();
        let at = table.partition_point(|existing| existing.seconds <= entry.seconds);
        table.insert(at, entry);
        true
    }

    pub fn entries(&self, preset: &str) -> &[ScoreEntry] {
        self.tables.get(preset).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(Vec::is_empty)
    }
}

/// Where winners' times end up.
///
/// Loading is forgiving: missing or unreadable storage yields an empty
/// board so a broken score file never blocks a new game. Saving reports
/// success and failure honestly through its `Result`.
pub trait ScoreStorage {
    fn load(&self) -> Scoreboard;
    fn save(&self, scores: &Scoreboard) -> Result<(), ScoreError>;
}

/// Keeps the whole scoreboard as a single JSON document on disk.
#[derive(Clone, Debug)]
pub struct JsonScoreStorage {
    path: PathBuf,
}

impl JsonScoreStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScoreStorage for JsonScoreStorage {
    fn load(&self) -> Scoreboard {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    log::warn!("could not read score file {:?}: {}", self.path, err);
                }
                return Scoreboard::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(scores) => scores,
            Err(err) => {
                log::warn!("discarding corrupt score file {:?}: {}", self.path, err);
                Scoreboard::new()
            }
        }
    }

    fn save(&self, scores: &Scoreboard) -> Result<(), ScoreError> {
        let contents = serde_json::to_string_pretty(scores)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(tag: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("sapper-scores-{}-{}.json", tag, std::process::id()));
        path
    }

    #[test]
    fn entries_stay_ordered_by_time() {
        let mut scores = Scoreboard::new();

        assert!(scores.record(GameConfig::EASY, ScoreEntry::new("b", 45)));
        assert!(scores.record(GameConfig::EASY, ScoreEntry::new("a", 30)));
        assert!(scores.record(GameConfig::EASY, ScoreEntry::new("c", 45)));

        let names: Vec<_> = scores
            .entries("easy")
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn custom_difficulties_are_not_recorded() {
        let mut scores = Scoreboard::new();
        let custom = GameConfig::new((10, 10), 12).unwrap();

        assert!(!scores.record(custom, ScoreEntry::new("a", 10)));
        assert!(scores.is_empty());
    }

    #[test]
    fn presets_keep_separate_tables() {
        let mut scores = Scoreboard::new();

        scores.record(GameConfig::EASY, ScoreEntry::new("a", 10));
        scores.record(GameConfig::HARD, ScoreEntry::new("b", 300));

        assert_eq!(scores.entries("easy").len(), 1);
        assert_eq!(scores.entries("hard").len(), 1);
        assert_eq!(scores.entries("medium").len(), 0);
    }

    #[test]
    fn formatted_time_is_minutes_and_seconds() {
        assert_eq!(ScoreEntry::new("a", 75).formatted_time(), "01:15");
        assert_eq!(ScoreEntry::new("a", 9).formatted_time(), "00:09");
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = scratch_file("roundtrip");
        let storage = JsonScoreStorage::new(&path);

        let mut scores = Scoreboard::new();
        scores.record(GameConfig::MEDIUM, ScoreEntry::new("winner", 123));

        storage.save(&scores).unwrap();
        let loaded = storage.load();
        fs::remove_file(&path).unwrap();

        assert_eq!(loaded, scores);
    }

    #[test]
    fn missing_file_loads_an_empty_board() {
        let storage = JsonScoreStorage::new(scratch_file("missing"));

        assert!(storage.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_an_empty_board() {
        let path = scratch_file("corrupt");
        fs::write(&path, "not json at all").unwrap();
        let storage = JsonScoreStorage::new(&path);

        let loaded = storage.load();
        fs::remove_file(&path).unwrap();

        assert!(loaded.is_empty());
    }

    #[test]
    fn save_reports_failure_for_an_unwritable_path() {
        let storage = JsonScoreStorage::new("/definitely/not/a/dir/scores.json");

        assert!(storage.save(&Scoreboard::new()).is_err());
    }
}
