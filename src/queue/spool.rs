//! On-disk persistence for queued messages.

use std::ffi::OsStr;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::QueueError;

/// Current spool file format version.
///
/// Files with any other version are skipped on load.
const SPOOL_FILE_VERSION: u32 = 1;

/// A queued message as held in memory and on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct StoredMessage {
    pub id: u64,
    pub payload: Vec<u8>,
    /// Earliest time (ms since epoch) the message may be delivered.
    pub visible_at_ms: u64,
    /// Time (ms since epoch) after which the message is dropped.
    pub expires_at_ms: u64,
    /// How many times the message has been handed to a consumer.
    #[serde(default)]
    pub deliveries: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct SpoolFile {
    version: u32,
    message: StoredMessage,
}

/// Directory of one JSON file per pending message.
///
/// # Atomic Writes
///
/// Uses write-to-temp-then-rename:
/// 1. Write to `{id}.json.tmp`
/// 2. Rename `{id}.json.tmp` to `{id}.json`
///
/// A crash mid-write leaves at most a stray `.tmp` file, which is ignored.
#[derive(Debug, Clone)]
pub(super) struct Spool {
    dir: PathBuf,
}

impl Spool {
    /// Opens (creating if needed) the spool directory and loads every
    /// readable message in it.
    ///
    /// Unreadable or incompatible files are logged and skipped.
    pub fn open(dir: impl Into<PathBuf>) -> Result<(Self, Vec<StoredMessage>), QueueError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(QueueError::Spool)?;

        let mut messages = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(QueueError::Spool)? {
            let path = entry.map_err(QueueError::Spool)?.path();
            if path.extension() != Some(OsStr::new("json")) {
                continue;
            }
            match load_file(&path) {
                Ok(message) => messages.push(message),
                Err(reason) => {
                    tracing::warn!(path = %path.display(), %reason, "Skipping unreadable spool file");
                }
            }
        }

        messages.sort_by_key(|m| m.id);
        Ok((Self { dir }, messages))
    }

    /// Returns the spool directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists a message.
    pub async fn write(&self, message: StoredMessage) -> Result<(), QueueError> {
        let dir = self.dir.clone();
        run_blocking(move || write_blocking(&dir, message)).await
    }

    /// Deletes a message's file. Missing files are not an error.
    pub async fn remove(&self, id: u64) -> Result<(), QueueError> {
        let path = file_path(&self.dir, id);
        run_blocking(move || remove_blocking(&path)).await
    }
}

fn file_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("{id:020}.json"))
}

fn load_file(path: &Path) -> Result<StoredMessage, String> {
    let content = std::fs::read(path).map_err(|e| format!("Failed to read file: {e}"))?;
    let file: SpoolFile =
        serde_json::from_slice(&content).map_err(|e| format!("Invalid JSON: {e}"))?;

    if file.version != SPOOL_FILE_VERSION {
        return Err(format!(
            "Incompatible version: expected {SPOOL_FILE_VERSION}, got {}",
            file.version
        ));
    }
    Ok(file.message)
}

fn write_blocking(dir: &Path, message: StoredMessage) -> Result<(), QueueError> {
    let path = file_path(dir, message.id);
    let file = SpoolFile {
        version: SPOOL_FILE_VERSION,
        message,
    };
    let content = serde_json::to_vec(&file).map_err(QueueError::Serialize)?;

    // Append .tmp so the temp file never matches the *.json filter on load
    let temp_path = PathBuf::from(format!("{}.tmp", path.display()));
    std::fs::write(&temp_path, content).map_err(QueueError::Spool)?;
    std::fs::rename(&temp_path, &path).map_err(QueueError::Spool)?;

    Ok(())
}

fn remove_blocking(path: &Path) -> Result<(), QueueError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(QueueError::Spool(e)),
    }
}

async fn run_blocking<F>(f: F) -> Result<(), QueueError>
where
    F: FnOnce() -> Result<(), QueueError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| QueueError::Spool(io::Error::other(e)))?
}
