//! Session persistence.
//!
//! Sessions are loaded and saved as whole documents. Every save carries the
//! version the caller loaded; a store refuses the write if the stored
//! version has moved on, so two racing submissions cannot silently drop
//! one another.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::{AdaptestError, RecordKind, Result};
use crate::session::Session;
use crate::types::SessionId;

/// Whole-document session storage with an optimistic concurrency guard.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a new session. Fails with `Conflict` if the id is taken.
    async fn insert(&self, session: &Session) -> Result<()>;

    /// Load a session by id.
    async fn get(&self, id: SessionId) -> Result<Option<Session>>;

    /// Replace a stored session.
    ///
    /// `expected_version` is the version the caller loaded. The write is
    /// refused with `Conflict` unless the stored version still matches.
    async fn save(&self, session: &Session, expected_version: u64) -> Result<()>;

    /// Ids of all stored sessions.
    async fn list(&self) -> Result<Vec<SessionId>>;
}

fn check_version(id: SessionId, expected: u64, found: u64) -> Result<()> {
    if expected == found {
        return Ok(());
    }
    warn!(session_id = %id, expected, found, "Rejected stale session write");
    Err(AdaptestError::Conflict {
        session_id: id,
        expected,
        found,
    })
}

fn missing(id: SessionId) -> AdaptestError {
    AdaptestError::not_found(RecordKind::Session, id)
}

/// In-memory store, for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&session.id) {
            return Err(AdaptestError::Conflict {
                session_id: session.id,
                expected: 0,
                found: existing.version,
            });
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn get(&self, id: SessionId) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn save(&self, session: &Session, expected_version: u64) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions.get(&session.id).ok_or_else(|| missing(session.id))?;
        check_version(session.id, expected_version, stored.version)?;
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionId>> {
        let mut ids: Vec<SessionId> = self.sessions.read().await.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

/// One pretty-printed JSON document per session under a directory.
///
/// Writes go through a temp file and a rename. The version check is
/// serialized within this process only.
#[derive(Debug)]
pub struct JsonFileSessionStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileSessionStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "Opened session store");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: SessionId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn read(&self, id: SessionId) -> Result<Option<Session>> {
        match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, session: &Session) -> Result<()> {
        let path = self.path_for(session.id);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn insert(&self, session: &Session) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if let Some(existing) = self.read(session.id).await? {
            return Err(AdaptestError::Conflict {
                session_id: session.id,
                expected: 0,
                found: existing.version,
            });
        }
        self.write(session).await
    }

    async fn get(&self, id: SessionId) -> Result<Option<Session>> {
        self.read(id).await
    }

    async fn save(&self, session: &Session, expected_version: u64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let stored = self.read(session.id).await?.ok_or_else(|| missing(session.id))?;
        check_version(session.id, expected_version, stored.version)?;
        self.write(session).await
    }

    async fn list(&self) -> Result<Vec<SessionId>> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| SessionId::parse(s).ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
