//! Session Store backends (spec §4.8).
//!
//! The store is the single place session state is read or written; the
//! Adaptive Agent Core never mutates a `Session` except through a locked
//! store handle, so `append` is the only mutating operation needed here.

use aar_kernel::error::{AarError, AarResult};
use aar_kernel::turn::{Session, SessionKey, Turn};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Storage abstraction over sessions, keyed by `SessionKey::as_storage_id`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &SessionKey) -> AarResult<Option<Session>>;
    async fn create(&self, key: SessionKey) -> AarResult<Session>;
    async fn append(&self, key: &SessionKey, turn: Turn) -> AarResult<()>;
    async fn delete(&self, key: &SessionKey) -> AarResult<()>;
    async fn list(&self, app: &str, user: &str) -> AarResult<Vec<SessionKey>>;
}

/// Default backend: process-local, lost on restart. Fine for tests and
/// single-process deployments.
#[derive(Default)]
pub struct InMemoryStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn get(&self, key: &SessionKey) -> AarResult<Option<Session>> {
        Ok(self.sessions.lock().get(&key.as_storage_id()).cloned())
    }

    async fn create(&self, key: SessionKey) -> AarResult<Session> {
        let mut sessions = self.sessions.lock();
        let id = key.as_storage_id();
        let session = sessions.entry(id).or_insert_with(|| Session::new(key)).clone();
        Ok(session)
    }

    async fn append(&self, key: &SessionKey, turn: Turn) -> AarResult<()> {
        let mut sessions = self.sessions.lock();
        let session = sessions.get_mut(&key.as_storage_id()).ok_or_else(|| AarError::SessionNotFound(key.as_storage_id()))?;
        session.append(turn);
        Ok(())
    }

    async fn delete(&self, key: &SessionKey) -> AarResult<()> {
        self.sessions.lock().remove(&key.as_storage_id());
        Ok(())
    }

    async fn list(&self, app: &str, user: &str) -> AarResult<Vec<SessionKey>> {
        Ok(self.sessions.lock().values().map(|s| s.key.clone()).filter(|k| k.app == app && k.user == user).collect())
    }
}

/// Durable backend: one JSON file per session under `root_dir`, guarded by
/// an in-process lock per store instance (not safe for multiple runtime
/// processes sharing one directory).
pub struct FileStore {
    root_dir: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> AarResult<Self> {
        let root_dir = root_dir.into();
        std::fs::create_dir_all(&root_dir).map_err(|e| AarError::ConfigError(format!("failed to create session store directory: {e}")))?;
        Ok(Self { root_dir, lock: Mutex::new(()) })
    }

    fn path_for(&self, storage_id: &str) -> PathBuf {
        self.root_dir.join(format!("{storage_id}.json"))
    }

    fn read_session(path: &Path) -> AarResult<Option<Session>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| AarError::Internal(format!("failed to read session file: {e}")))?;
        serde_json::from_str(&content).map(Some).map_err(|e| AarError::Internal(format!("corrupt session file {}: {e}", path.display())))
    }

    fn write_session(path: &Path, session: &Session) -> AarResult<()> {
        let content = serde_json::to_string_pretty(session).map_err(|e| AarError::Internal(format!("failed to serialize session: {e}")))?;
        std::fs::write(path, content).map_err(|e| AarError::Internal(format!("failed to write session file: {e}")))
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn get(&self, key: &SessionKey) -> AarResult<Option<Session>> {
        let _guard = self.lock.lock();
        Self::read_session(&self.path_for(&key.as_storage_id()))
    }

    async fn create(&self, key: SessionKey) -> AarResult<Session> {
        let _guard = self.lock.lock();
        let path = self.path_for(&key.as_storage_id());
        if let Some(existing) = Self::read_session(&path)? {
            return Ok(existing);
        }
        let session = Session::new(key);
        Self::write_session(&path, &session)?;
        Ok(session)
    }

    async fn append(&self, key: &SessionKey, turn: Turn) -> AarResult<()> {
        let _guard = self.lock.lock();
        let path = self.path_for(&key.as_storage_id());
        let mut session = Self::read_session(&path)?.ok_or_else(|| AarError::SessionNotFound(key.as_storage_id()))?;
        session.append(turn);
        Self::write_session(&path, &session)
    }

    async fn delete(&self, key: &SessionKey) -> AarResult<()> {
        let _guard = self.lock.lock();
        let path = self.path_for(&key.as_storage_id());
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| AarError::Internal(format!("failed to delete session file: {e}")))?;
        }
        Ok(())
    }

    async fn list(&self, app: &str, user: &str) -> AarResult<Vec<SessionKey>> {
        let _guard = self.lock.lock();
        let mut keys = Vec::new();
        let entries = std::fs::read_dir(&self.root_dir).map_err(|e| AarError::Internal(format!("failed to list session store: {e}")))?;
        for entry in entries {
            let entry = entry.map_err(|e| AarError::Internal(format!("failed to read session store entry: {e}")))?;
            if let Some(session) = Self::read_session(&entry.path())? {
                if session.key.app == app && session.key.user == user {
                    keys.push(session.key);
                }
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aar_kernel::turn::MessagePart;
    use tempfile::TempDir;

    fn key() -> SessionKey {
        SessionKey::new("demo-app", "alice", "sess-1")
    }

    #[tokio::test]
    async fn in_memory_create_then_append_then_get() {
        let store = InMemoryStore::new();
        store.create(key()).await.unwrap();
        store.append(&key(), Turn::UserMessage { text: "hi".into() }).await.unwrap();

        let session = store.get(&key()).await.unwrap().unwrap();
        assert_eq!(session.turns.len(), 1);
    }

    #[tokio::test]
    async fn in_memory_append_to_missing_session_is_not_found() {
        let store = InMemoryStore::new();
        let result = store.append(&key(), Turn::UserMessage { text: "hi".into() }).await;
        assert!(matches!(result, Err(AarError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn file_store_round_trips_across_instances() {
        let dir = TempDir::new().unwrap();
        {
            let store = FileStore::new(dir.path()).unwrap();
            store.create(key()).await.unwrap();
            store
                .append(&key(), Turn::ModelMessage { parts: vec![MessagePart::Text { text: "hello".into() }] })
                .await
                .unwrap();
        }

        let reopened = FileStore::new(dir.path()).unwrap();
        let session = reopened.get(&key()).await.unwrap().unwrap();
        assert_eq!(session.turns.len(), 1);
    }

    #[tokio::test]
    async fn file_store_list_filters_by_app_and_user() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        store.create(SessionKey::new("demo-app", "alice", "s1")).await.unwrap();
        store.create(SessionKey::new("demo-app", "bob", "s2")).await.unwrap();

        let keys = store.list("demo-app", "alice").await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].session_id, "s1");
    }
}
