//! Snapshot files.
//!
//! The store is saved as pretty JSON. Writes go to a sibling temp file
//! that is then renamed over the target, so a crash mid-write leaves the
//! previous snapshot intact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use codeshop_core::StoreSnapshot;
use codeshop_core::runner::SharedStore;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Errors reading or writing snapshot files.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// A filesystem operation failed.
    #[error("failed to {action} {path}: {source}")]
    Io {
        /// What was being attempted.
        action: &'static str,
        /// The file involved.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The snapshot could not be encoded or decoded.
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The blocking write task panicked or was cancelled.
    #[error("snapshot write task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PersistenceError {
    fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.display().to_string(),
            source,
        }
    }
}

/// Read the snapshot at `path`. `Ok(None)` when no file exists.
///
/// # Errors
///
/// Returns [`PersistenceError`] if the file exists but cannot be read or
/// parsed.
pub fn load_snapshot(path: &Path) -> Result<Option<StoreSnapshot>, PersistenceError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(PersistenceError::io("read", path, err)),
    };
    let snapshot = serde_json::from_str(&contents)?;
    Ok(Some(snapshot))
}

/// Write `snapshot` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`PersistenceError`] if encoding or any filesystem step fails.
pub fn save_snapshot(path: &Path, snapshot: &StoreSnapshot) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| PersistenceError::io("create directory", parent, e))?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, json).map_err(|e| PersistenceError::io("write", &tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| PersistenceError::io("rename", &tmp, e))?;
    Ok(())
}

/// Snapshot the shared store and write it. Returns the tick saved.
///
/// The lock is held only while the snapshot is taken; the file work runs
/// on the blocking pool.
///
/// # Errors
///
/// Returns [`PersistenceError`] if the write fails.
pub async fn save_store(store: &SharedStore, path: &Path) -> Result<u64, PersistenceError> {
    let snapshot = store.lock().await.snapshot();
    let tick = snapshot.clock.tick();
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || save_snapshot(&target, &snapshot)).await??;
    debug!(tick, path = %path.display(), "Snapshot written");
    Ok(tick)
}

/// Save the store every time `due` is notified. Failures are logged and
/// the writer keeps running.
pub fn spawn_snapshot_writer(store: SharedStore, path: PathBuf, due: Arc<Notify>) -> JoinHandle<()> {
    info!(path = %path.display(), "Snapshot writer started");
    tokio::spawn(async move {
        loop {
            due.notified().await;
            if let Err(err) = save_store(&store, &path).await {
                warn!(error = %err, "Periodic snapshot failed");
            }
        }
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
