use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CheckpointError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct ProgressRecord {
    #[serde(default)]
    timesteps: u64,
}

/// Cumulative-timesteps counter persisted as `{"timesteps": N}`.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProgressStore { path: path.into() }
    }

    /// `progress.json` inside a checkpoint directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("progress.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored timesteps, or 0 when the file does not exist.
    pub fn load(&self) -> Result<u64, CheckpointError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(CheckpointError::ProgressRead {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        let record: ProgressRecord =
            serde_json::from_str(&content).map_err(|e| CheckpointError::ProgressParse {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(record.timesteps)
    }

    /// Overwrite the stored value.
    pub fn save(&self, timesteps: u64) -> Result<(), CheckpointError> {
        let json = serde_json::to_string(&ProgressRecord { timesteps })?;
        write_atomic(&self.path, json.as_bytes())?;
        Ok(())
    }

    /// Read, add `by`, write back. Returns the new total.
    pub fn advance(&self, by: u64) -> Result<u64, CheckpointError> {
        let total = self.load()? + by;
        self.save(total)?;
        Ok(total)
    }
}

/// Write through a sibling temp file and rename, so a crash never leaves a
/// half-written file behind.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::in_dir(dir.path());
        assert_eq!(store.load().unwrap(), 0);
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::in_dir(dir.path());
        store.save(100_000).unwrap();
        assert_eq!(store.load().unwrap(), 100_000);

        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"{"timesteps":100000}"#);
    }

    #[test]
    fn test_reads_externally_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::in_dir(dir.path());
        fs::write(store.path(), r#"{ "timesteps": 100000 }"#).unwrap();
        assert_eq!(store.load().unwrap(), 100_000);
    }

    #[test]
    fn test_missing_key_defaults_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::in_dir(dir.path());
        fs::write(store.path(), "{}").unwrap();
        assert_eq!(store.load().unwrap(), 0);
    }

    #[test]
    fn test_advance_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::in_dir(dir.path());
        assert_eq!(store.advance(100_000).unwrap(), 100_000);
        assert_eq!(store.advance(100_000).unwrap(), 200_000);
        assert_eq!(store.load().unwrap(), 200_000);
        assert!(!dir.path().join("progress.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::in_dir(dir.path());
        fs::write(store.path(), "{\"timesteps\": 10").unwrap();
        assert!(matches!(
            store.load(),
            Err(CheckpointError::ProgressParse { .. })
        ));
    }
}
