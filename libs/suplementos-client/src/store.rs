use crate::secret::Secret;
use parking_lot::Mutex;
use std::path::PathBuf;

/// Snapshot of the stored session tokens.
///
/// Either slot may be absent independently: a session can hold an access
/// token without a refresh token (it will simply expire) and vice versa.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Short-lived token sent as `Authorization: Bearer <token>`
    pub access: Option<Secret>,
    /// Long-lived token exchanged for a fresh access token
    pub refresh: Option<Secret>,
}

impl Session {
    /// Whether neither slot holds a token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}

/// Partial update applied by [`TokenStore::set`].
///
/// Only slots that are `Some` are written; `None` slots keep their current
/// value. Use [`TokenStore::clear`] to drop tokens.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub access: Option<Secret>,
    pub refresh: Option<Secret>,
}

impl SessionUpdate {
    /// Update that replaces only the access token.
    #[must_use]
    pub fn access(token: Secret) -> Self {
        Self {
            access: Some(token),
            refresh: None,
        }
    }

    /// Update that replaces both tokens.
    #[must_use]
    pub fn both(access: Secret, refresh: Secret) -> Self {
        Self {
            access: Some(access),
            refresh: Some(refresh),
        }
    }
}

/// Durable storage for session tokens.
///
/// Implementations are infallible from the caller's point of view: a store
/// that cannot persist (disk full, permissions) logs the failure and keeps
/// serving from memory. Authentication flow must never abort because
/// persistence hiccupped.
pub trait TokenStore: Send + Sync {
    /// Read the current session snapshot.
    fn get(&self) -> Session;

    /// Apply a partial update. Slots absent from the update are untouched.
    fn set(&self, update: SessionUpdate);

    /// Drop both tokens.
    fn clear(&self);
}

/// In-memory token store.
///
/// Suitable for tests and short-lived processes; tokens are lost when the
/// process exits.
#[derive(Default)]
pub struct MemoryTokenStore {
    session: Mutex<Session>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Session {
        self.session.lock().clone()
    }

    fn set(&self, update: SessionUpdate) {
        let mut session = self.session.lock();
        if let Some(access) = update.access {
            session.access = Some(access);
        }
        if let Some(refresh) = update.refresh {
            session.refresh = Some(refresh);
        }
    }

    fn clear(&self) {
        *self.session.lock() = Session::default();
    }
}

/// On-disk serialized form. Field names match the storage keys used by the
/// web frontend so a session file is self-describing.
#[derive(serde::Serialize, serde::Deserialize, Default)]
struct StoredSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

/// File-backed token store.
///
/// The session is kept in memory and mirrored to a JSON file on every
/// mutation. Writes go through a temp file followed by a rename, so a crash
/// mid-write never leaves a truncated session file. Persistence failures are
/// logged at `warn` and do not surface to callers.
pub struct FileTokenStore {
    path: PathBuf,
    session: Mutex<Session>,
}

impl FileTokenStore {
    /// Open a store backed by `path`, loading any existing session.
    ///
    /// A missing file starts an empty session. A corrupt file is logged and
    /// treated as empty rather than failing open.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = load_session(&path);
        Self {
            path,
            session: Mutex::new(session),
        }
    }

    fn persist(&self, session: &Session) {
        let stored = StoredSession {
            access_token: session.access.as_ref().map(|s| s.expose().to_owned()),
            refresh_token: session.refresh.as_ref().map(|s| s.expose().to_owned()),
        };

        if let Err(err) = write_session(&self.path, &stored) {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "failed to persist session tokens; continuing with in-memory session"
            );
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Session {
        self.session.lock().clone()
    }

    fn set(&self, update: SessionUpdate) {
        let mut session = self.session.lock();
        if let Some(access) = update.access {
            session.access = Some(access);
        }
        if let Some(refresh) = update.refresh {
            session.refresh = Some(refresh);
        }
        self.persist(&session);
    }

    fn clear(&self) {
        let mut session = self.session.lock();
        *session = Session::default();
        if let Err(err) = std::fs::remove_file(&self.path)
            && err.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "failed to remove session file"
            );
        }
    }
}

fn load_session(path: &std::path::Path) -> Session {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Session::default(),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read session file; starting with empty session"
            );
            return Session::default();
        }
    };

    match serde_json::from_slice::<StoredSession>(&bytes) {
        Ok(stored) => Session {
            access: stored.access_token.map(Secret::from),
            refresh: stored.refresh_token.map(Secret::from),
        },
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "corrupt session file; starting with empty session"
            );
            Session::default()
        }
    }
}

fn write_session(path: &std::path::Path, stored: &StoredSession) -> std::io::Result<()> {
    let json = serde_json::to_vec_pretty(stored)?;

    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, &json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    // -- memory store ---------------------------------------------------------

    #[test]
    fn memory_store_starts_empty() {
        let store = MemoryTokenStore::new();
        assert!(store.get().is_empty());
    }

    #[test]
    fn set_access_only_keeps_refresh() {
        let store = MemoryTokenStore::new();
        store.set(SessionUpdate::both(
            Secret::new("access-1"),
            Secret::new("refresh-1"),
        ));

        store.set(SessionUpdate::access(Secret::new("access-2")));

        let session = store.get();
        assert_eq!(session.access.unwrap().expose(), "access-2");
        assert_eq!(session.refresh.unwrap().expose(), "refresh-1");
    }

    #[test]
    fn set_refresh_only_keeps_access() {
        let store = MemoryTokenStore::new();
        store.set(SessionUpdate::both(
            Secret::new("access-1"),
            Secret::new("refresh-1"),
        ));

        store.set(SessionUpdate {
            access: None,
            refresh: Some(Secret::new("refresh-2")),
        });

        let session = store.get();
        assert_eq!(session.access.unwrap().expose(), "access-1");
        assert_eq!(session.refresh.unwrap().expose(), "refresh-2");
    }

    #[test]
    fn empty_update_is_noop() {
        let store = MemoryTokenStore::new();
        store.set(SessionUpdate::both(
            Secret::new("access-1"),
            Secret::new("refresh-1"),
        ));

        store.set(SessionUpdate::default());

        let session = store.get();
        assert_eq!(session.access.unwrap().expose(), "access-1");
        assert_eq!(session.refresh.unwrap().expose(), "refresh-1");
    }

    #[test]
    fn clear_drops_both_slots() {
        let store = MemoryTokenStore::new();
        store.set(SessionUpdate::both(
            Secret::new("access-1"),
            Secret::new("refresh-1"),
        ));

        store.clear();
        assert!(store.get().is_empty());
    }

    #[test]
    fn store_trait_object_is_send_sync() {
        fn assert_traits<T: Send + Sync + ?Sized>() {}
        assert_traits::<dyn TokenStore>();
    }

    // -- file store -------------------------------------------------------------

    #[test]
    fn file_store_round_trips_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileTokenStore::open(&path);
        store.set(SessionUpdate::both(
            Secret::new("access-1"),
            Secret::new("refresh-1"),
        ));
        drop(store);

        let reopened = FileTokenStore::open(&path);
        let session = reopened.get();
        assert_eq!(session.access.unwrap().expose(), "access-1");
        assert_eq!(session.refresh.unwrap().expose(), "refresh-1");
    }

    #[test]
    fn file_store_uses_frontend_storage_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileTokenStore::open(&path);
        store.set(SessionUpdate::both(
            Secret::new("acc"),
            Secret::new("ref"),
        ));

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["access_token"], "acc");
        assert_eq!(value["refresh_token"], "ref");
    }

    #[test]
    fn file_store_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::open(dir.path().join("nope.json"));
        assert!(store.get().is_empty());
    }

    #[test]
    fn file_store_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileTokenStore::open(&path);
        assert!(store.get().is_empty());
    }

    #[test]
    fn file_store_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileTokenStore::open(&path);
        store.set(SessionUpdate::access(Secret::new("acc")));
        assert!(path.exists());

        store.clear();
        assert!(!path.exists());
        assert!(store.get().is_empty());
    }

    #[test]
    fn file_store_unwritable_path_does_not_panic() {
        let store = FileTokenStore::open("/nonexistent-dir/session.json");
        store.set(SessionUpdate::access(Secret::new("acc")));

        // Persistence failed, but the in-memory session still serves.
        assert_eq!(store.get().access.unwrap().expose(), "acc");
    }
}
