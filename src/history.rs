use crate::nav::Protocol;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const MAX_ENTRIES: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub target: String,
    pub protocol: Protocol,
    pub timestamp: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    entries: Vec<HistoryEntry>,
}

// Recent connections, newest first. Persistence is best effort: a
// missing or corrupt file degrades to an empty log and a failed write
// never interrupts a connection.
#[derive(Debug)]
pub struct History {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new(path: PathBuf) -> Self {
        let entries = load_entries(&path);
        Self { path, entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn record(&mut self, target: &str, protocol: Protocol) {
        self.entries
            .retain(|entry| !(entry.target == target && entry.protocol == protocol));
        self.entries.insert(
            0,
            HistoryEntry {
                target: target.to_string(),
                protocol,
                timestamp: now(),
            },
        );
        self.entries.truncate(MAX_ENTRIES);
        self.persist();
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                tracing::debug!("unable to create history dir: {err}");
                return;
            }
        }
        let file = HistoryFile {
            entries: self.entries.clone(),
        };
        let contents = match toml::to_string_pretty(&file) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::debug!("unable to serialize history: {err}");
                return;
            }
        };
        if let Err(err) = fs::write(&self.path, contents) {
            tracing::debug!("unable to write history: {err}");
        }
    }
}

pub fn history_path(config: &Path) -> PathBuf {
    config.with_file_name("history.toml")
}

fn load_entries(path: &Path) -> Vec<HistoryEntry> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::debug!("no history at {}: {err}", path.display());
            return Vec::new();
        }
    };
    match toml::from_str::<HistoryFile>(&contents) {
        Ok(file) => file.entries,
        Err(err) => {
            tracing::debug!("ignoring unreadable history: {err}");
            Vec::new()
        }
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(history: &History) -> Vec<&str> {
        history
            .entries()
            .iter()
            .map(|entry| entry.target.as_str())
            .collect()
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let history = History::new(dir.path().join("history.toml"));
        assert!(history.entries().is_empty());
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("history.toml");
        fs::write(&path, "entries = \"nope\"").expect("write history");
        let history = History::new(path);
        assert!(history.entries().is_empty());
    }

    #[test]
    fn record_persists_newest_first() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("history.toml");

        let mut history = History::new(path.clone());
        history.record("web1.prod.example.com", Protocol::Ssh);
        history.record("db1.prod.example.com", Protocol::Ssh);

        let reloaded = History::new(path);
        assert_eq!(
            targets(&reloaded),
            ["db1.prod.example.com", "web1.prod.example.com"]
        );
    }

    #[test]
    fn duplicate_target_and_protocol_moves_to_front() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut history = History::new(dir.path().join("history.toml"));

        history.record("web1", Protocol::Ssh);
        history.record("db1", Protocol::Ssh);
        history.record("web1", Protocol::Ssh);

        assert_eq!(targets(&history), ["web1", "db1"]);
    }

    #[test]
    fn same_target_different_protocol_keeps_both() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut history = History::new(dir.path().join("history.toml"));

        history.record("web1", Protocol::Ssh);
        history.record("web1", Protocol::Sftp);

        assert_eq!(history.entries().len(), 2);
        assert_eq!(history.entries()[0].protocol, Protocol::Sftp);
        assert_eq!(history.entries()[1].protocol, Protocol::Ssh);
    }

    #[test]
    fn log_is_bounded_and_evicts_the_oldest() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut history = History::new(dir.path().join("history.toml"));

        for n in 0..11 {
            history.record(&format!("host{n}"), Protocol::Ssh);
        }

        assert_eq!(history.entries().len(), 10);
        assert_eq!(history.entries()[0].target, "host10");
        assert!(!targets(&history).contains(&"host0"));
    }

    #[test]
    fn failed_write_still_updates_in_memory_log() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut history = History::new(dir.path().to_path_buf());
        history.record("web1", Protocol::Ssh);
        assert_eq!(targets(&history), ["web1"]);
    }

    #[test]
    fn history_path_sits_beside_the_config() {
        assert_eq!(
            history_path(Path::new("/home/u/.config/hopper/hosts.toml")),
            Path::new("/home/u/.config/hopper/history.toml")
        );
    }
}
