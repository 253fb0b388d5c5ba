use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::SessionError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only, timestamped text log for one session.
///
/// Every append opens the file, writes one `[timestamp] text\n` record and
/// closes it again while holding the write lock, so records from different
/// tasks never interleave and timestamps never go backwards.
#[derive(Debug)]
pub struct ActivityLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, text: &str) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().await;
        let line = format!("[{}] {}\n", Local::now().format(TIMESTAMP_FORMAT), text);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(SessionError::io(&self.path))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(SessionError::io(&self.path))?;
        file.flush().await.map_err(SessionError::io(&self.path))
    }

    /// Whole log content. A log that was never written reads as empty.
    pub async fn read_all(&self) -> Result<String, SessionError> {
        let _guard = self.write_lock.lock().await;
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(SessionError::io(&self.path)(e)),
        }
    }

    /// Truncate the log to empty, creating it if needed.
    pub async fn clear(&self) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().await;
        fs::write(&self.path, b"")
            .await
            .map_err(SessionError::io(&self.path))
    }
}
