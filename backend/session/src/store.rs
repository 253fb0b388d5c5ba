use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{Local, NaiveDateTime};
use tokio::fs;
use tracing::{info, warn};

use crate::activity_log::ActivityLog;
use crate::error::SessionError;

pub const LOG_FILE_NAME: &str = "trace_log.txt";
pub const SCREENSHOTS_DIR_NAME: &str = "screenshots";

/// Session ids are local timestamps, so lexicographic order is chronological.
const ID_FORMAT: &str = "%Y%m%d_%H%M%S";
const ID_STAMP_LEN: usize = 15;

/// On-disk identity of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub dir: PathBuf,
    pub log_path: PathBuf,
    pub screenshots_dir: PathBuf,
}

impl Session {
    fn at(root: &Path, id: &str) -> Self {
        let dir = root.join(id);
        Self {
            id: id.to_string(),
            log_path: dir.join(LOG_FILE_NAME),
            screenshots_dir: dir.join(SCREENSHOTS_DIR_NAME),
            dir,
        }
    }

    /// `screenshots/screenshot_0007.png` and friends.
    pub fn screenshot_path(&self, counter: u32, extension: &str) -> PathBuf {
        self.screenshots_dir
            .join(format!("screenshot_{counter:04}.{extension}"))
    }
}

/// `20241019_101500` sorts before `20241019_101500_1`, which sorts before `_10`.
fn recency_key(id: &str) -> Option<(NaiveDateTime, u32)> {
    let stamp = id.get(..ID_STAMP_LEN)?;
    let when = NaiveDateTime::parse_from_str(stamp, ID_FORMAT).ok()?;
    let rest = &id[ID_STAMP_LEN..];
    let suffix = if rest.is_empty() {
        0
    } else {
        rest.strip_prefix('_')?.parse().ok()?
    };
    Some((when, suffix))
}

/// The session currently receiving captures and answers.
#[derive(Debug)]
pub struct ActiveSession {
    pub session: Session,
    pub log: ActivityLog,
}

impl ActiveSession {
    pub fn id(&self) -> &str {
        &self.session.id
    }
}

/// Owns the sessions root and the single current session.
///
/// Replacing the current session swaps one `Arc`; holders of the old one keep
/// a valid handle to its (untouched) files.
#[derive(Debug)]
pub struct SessionStore {
    root: PathBuf,
    current: RwLock<Option<Arc<ActiveSession>>>,
}

impl SessionStore {
    /// Open (and create if needed) the sessions root.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(SessionError::io(&root))?;
        Ok(Self {
            root,
            current: RwLock::new(None),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current(&self) -> Option<Arc<ActiveSession>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Create a fresh session and make it current.
    ///
    /// With `continue_from`, that session's log content is copied into the new
    /// log so history stays visible while the two files evolve independently.
    pub async fn create_session(
        &self,
        continue_from: Option<&Session>,
    ) -> Result<Arc<ActiveSession>, SessionError> {
        let id = self.claim_session_id().await?;
        let session = Session::at(&self.root, &id);

        fs::create_dir_all(&session.screenshots_dir)
            .await
            .map_err(SessionError::io(&session.screenshots_dir))?;

        let log = ActivityLog::new(&session.log_path);
        log.clear().await?;

        if let Some(previous) = continue_from {
            if fs::try_exists(&previous.log_path).await.unwrap_or(false) {
                fs::copy(&previous.log_path, &session.log_path)
                    .await
                    .map_err(SessionError::io(&previous.log_path))?;
                info!(session = %id, from = %previous.id, "Continued activity log");
            } else {
                warn!(session = %id, from = %previous.id, "Previous activity log missing; starting empty");
            }
        }

        let active = Arc::new(ActiveSession { session, log });
        let replaced = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::clone(&active));

        info!(
            session = %id,
            replaced = replaced.as_ref().map(|s| s.id()).unwrap_or("-"),
            "Session created"
        );
        Ok(active)
    }

    /// All sessions under the root, newest first. Other directories are ignored.
    pub async fn list_sessions(&self) -> Result<Vec<Session>, SessionError> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(SessionError::io(&self.root))?;

        let mut found = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(SessionError::io(&self.root))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if let (true, Some(key)) = (is_dir, recency_key(&name)) {
                found.push((key, Session::at(&self.root, &name)));
            }
        }

        found.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(found.into_iter().map(|(_, session)| session).collect())
    }

    /// The newest session, if it has log content worth continuing.
    ///
    /// `Ok(None)` when there are no sessions at all; `EmptySession` when the
    /// newest one has a missing or zero-length log.
    pub async fn most_recent_session(&self) -> Result<Option<Session>, SessionError> {
        let Some(latest) = self.list_sessions().await?.into_iter().next() else {
            return Ok(None);
        };
        match fs::metadata(&latest.log_path).await {
            Ok(meta) if meta.len() > 0 => Ok(Some(latest)),
            _ => Err(SessionError::EmptySession { id: latest.id }),
        }
    }

    /// Reserve a directory named after the current time, suffixing `_<n>` on collision.
    async fn claim_session_id(&self) -> Result<String, SessionError> {
        let base = Local::now().format(ID_FORMAT).to_string();
        let mut attempt = 0u32;
        loop {
            let id = if attempt == 0 {
                base.clone()
            } else {
                format!("{base}_{attempt}")
            };
            let dir = self.root.join(&id);
            match fs::create_dir(&dir).await {
                Ok(()) => return Ok(id),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(SessionError::io(&dir)(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("sessions")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn creates_layout_and_becomes_current() {
        let (_dir, store) = store().await;
        assert!(store.current().is_none());

        let active = store.create_session(None).await.unwrap();
        let session = &active.session;

        assert!(session.dir.starts_with(store.root()));
        assert!(session.screenshots_dir.is_dir());
        assert_eq!(std::fs::read_to_string(&session.log_path).unwrap(), "");
        assert_eq!(store.current().unwrap().id(), session.id);
        assert!(recency_key(&session.id).is_some());
        assert_eq!(
            session.screenshot_path(7, "png"),
            session.screenshots_dir.join("screenshot_0007.png")
        );
    }

    #[tokio::test]
    async fn continuation_copies_by_value() {
        let (_dir, store) = store().await;
        let a = store.create_session(None).await.unwrap();
        std::fs::write(&a.session.log_path, "X\n").unwrap();

        let b = store.create_session(Some(&a.session)).await.unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(std::fs::read_to_string(&b.session.log_path).unwrap(), "X\n");

        b.log.append("only in b").await.unwrap();
        assert_eq!(std::fs::read_to_string(&a.session.log_path).unwrap(), "X\n");
        assert_eq!(store.current().unwrap().id(), b.id());
    }

    #[tokio::test]
    async fn continuation_from_missing_log_starts_empty() {
        let (_dir, store) = store().await;
        let a = store.create_session(None).await.unwrap();
        std::fs::remove_file(&a.session.log_path).unwrap();

        let b = store.create_session(Some(&a.session)).await.unwrap();
        assert_eq!(b.log.read_all().await.unwrap(), "");
    }

    #[tokio::test]
    async fn same_second_sessions_get_distinct_ordered_ids() {
        let (_dir, store) = store().await;
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(store.create_session(None).await.unwrap().id().to_string());
        }
        let listed: Vec<String> = store
            .list_sessions()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();

        ids.reverse();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn most_recent_session_cases() {
        let (_dir, store) = store().await;
        assert!(store.most_recent_session().await.unwrap().is_none());

        let first = store.create_session(None).await.unwrap();
        first.log.append("did things").await.unwrap();
        assert_eq!(
            store.most_recent_session().await.unwrap().unwrap().id,
            first.id()
        );

        let second = store.create_session(None).await.unwrap();
        let err = store.most_recent_session().await.unwrap_err();
        assert!(matches!(err, SessionError::EmptySession { id } if id == second.id()));
    }

    #[tokio::test]
    async fn foreign_directories_are_ignored() {
        let (_dir, store) = store().await;
        std::fs::create_dir(store.root().join("logs")).unwrap();
        std::fs::write(store.root().join("20240101_000000"), "not a dir").unwrap();
        assert!(store.list_sessions().await.unwrap().is_empty());
    }

    #[test]
    fn recency_key_orders_suffixes_numerically() {
        let plain = recency_key("20241019_101500").unwrap();
        let two = recency_key("20241019_101500_2").unwrap();
        let ten = recency_key("20241019_101500_10").unwrap();
        assert!(plain < two && two < ten);
        assert!(recency_key("notes").is_none());
        assert!(recency_key("20241019_101500x").is_none());
    }
}
