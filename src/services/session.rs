//! Authentication session and its persistent token store
//!
//! The session is an explicit object owned by whoever drives the app (a CLI
//! command or the TUI). It mirrors the bearer token and signed-in user into
//! a [`KeyValueStore`] under the keys `token` and `user`.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::services::capabilities::{capabilities_for, Capabilities};
use crate::types::{MilktrackError, Result, User};

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// A signed-in user and the bearer token issued to them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Opaque string key-value storage
pub trait KeyValueStore {
    /// Read a key; unreadable storage counts as missing
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store (tests, or running without persistence)
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// JSON-file store at `<data_dir>/session.json`.
///
/// Reads take a shared lock; writes go to a temp file that is renamed over
/// the target while holding an exclusive lock.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("session.json"),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()
            .map_err(|e| MilktrackError::Store(format!("Failed to acquire read lock: {}", e)))?;

        let mut content = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut content);
        let _ = file.unlock();
        read?;

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| MilktrackError::Store(format!("Corrupted session file: {}", e)))
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(values)
            .map_err(|e| MilktrackError::Store(format!("Serialization failed: {}", e)))?;

        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut file = File::create(&temp_path)
                .map_err(|e| MilktrackError::Store(format!("Failed to create temp file: {}", e)))?;
            restrict_permissions(&file);
            file.write_all(content.as_bytes())
                .map_err(|e| MilktrackError::Store(format!("Failed to write temp file: {}", e)))?;
            file.sync_all()
                .map_err(|e| MilktrackError::Store(format!("Failed to sync temp file: {}", e)))?;
        }

        let target = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;

        target
            .lock_exclusive()
            .map_err(|e| MilktrackError::Store(format!("Failed to acquire write lock: {}", e)))?;

        let renamed = fs::rename(&temp_path, &self.path)
            .map_err(|e| MilktrackError::Store(format!("Failed to rename temp file: {}", e)));

        let _ = target.unlock();
        renamed
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut values = self.load().unwrap_or_else(|e| {
            warn!(error = %e, "discarding unreadable session store");
            BTreeMap::new()
        });
        apply(&mut values);
        self.save(&values)
    }
}

/// Session files hold a bearer token; keep them owner-only
#[cfg(unix)]
fn restrict_permissions(file: &File) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
        warn!(error = %e, "could not restrict session file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &File) {}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(mut values) => values.remove(key),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read session store");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|values| {
            values.remove(key);
        })
    }
}

/// Session state backed by a key-value store
pub struct AuthSession<S: KeyValueStore> {
    store: S,
    current: Option<Session>,
}

impl<S: KeyValueStore> AuthSession<S> {
    /// Restore a previous session from the store.
    /// A stored user that fails to parse clears both keys.
    pub fn restore(mut store: S) -> Self {
        let current = match (store.get(TOKEN_KEY), store.get(USER_KEY)) {
            (Some(token), Some(user_json)) => match serde_json::from_str::<User>(&user_json) {
                Ok(user) => {
                    debug!(username = %user.username, "restored session");
                    Some(Session { token, user })
                }
                Err(e) => {
                    warn!(error = %e, "stored user is unreadable, clearing session");
                    let _ = store.remove(TOKEN_KEY);
                    let _ = store.remove(USER_KEY);
                    None
                }
            },
            _ => None,
        };

        Self { store, current }
    }

    /// Adopt a freshly issued session and persist it
    pub fn login(&mut self, session: Session) -> Result<()> {
        let user_json = serde_json::to_string(&session.user)
            .map_err(|e| MilktrackError::Store(format!("Failed to serialize user: {}", e)))?;
        self.store.set(TOKEN_KEY, &session.token)?;
        self.store.set(USER_KEY, &user_json)?;
        debug!(username = %session.user.username, "signed in");
        self.current = Some(session);
        Ok(())
    }

    /// Forget the session in memory and in the store
    pub fn logout(&mut self) -> Result<()> {
        self.current = None;
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        Ok(())
    }

    /// Replace the signed-in user (e.g. after editing one's own profile)
    pub fn set_user(&mut self, user: User) -> Result<()> {
        let Some(session) = self.current.as_mut() else {
            return Err(MilktrackError::NotSignedIn);
        };
        let user_json = serde_json::to_string(&user)
            .map_err(|e| MilktrackError::Store(format!("Failed to serialize user: {}", e)))?;
        self.store.set(USER_KEY, &user_json)?;
        session.user = user;
        Ok(())
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The current session, or [`MilktrackError::NotSignedIn`]
    pub fn require(&self) -> Result<&Session> {
        self.current.as_ref().ok_or(MilktrackError::NotSignedIn)
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.token.as_str())
    }

    pub fn capabilities(&self) -> Capabilities {
        capabilities_for(self.current.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, ROLE_ADMIN};
    use tempfile::TempDir;

    fn make_session() -> Session {
        Session {
            token: "jwt-token".into(),
            user: User {
                id: 3,
                username: "asha".into(),
                email: "asha@example.com".into(),
                phone_number: None,
                roles: vec![Role::named(ROLE_ADMIN)],
            },
        }
    }

    // ========== MemoryStore ==========

    #[test]
    fn test_restore_empty_store_is_signed_out() {
        let session = AuthSession::restore(MemoryStore::new());
        assert!(session.current().is_none());
        assert!(matches!(session.require(), Err(MilktrackError::NotSignedIn)));
        assert!(!session.capabilities().can_manage_users);
    }

    #[test]
    fn test_login_then_restore() {
        let mut auth = AuthSession::restore(MemoryStore::new());
        auth.login(make_session()).unwrap();
        assert_eq!(auth.token(), Some("jwt-token"));

        let store = auth.store.clone();
        let restored = AuthSession::restore(store);
        assert_eq!(restored.current(), Some(&make_session()));
        assert!(restored.capabilities().can_manage_users);
    }

    #[test]
    fn test_logout_clears_store() {
        let mut auth = AuthSession::restore(MemoryStore::new());
        auth.login(make_session()).unwrap();
        auth.logout().unwrap();

        assert!(auth.current().is_none());
        assert!(auth.store.get(TOKEN_KEY).is_none());
        assert!(auth.store.get(USER_KEY).is_none());
    }

    #[test]
    fn test_restore_with_corrupt_user_clears_both_keys() {
        let mut store = MemoryStore::new();
        store.set(TOKEN_KEY, "jwt").unwrap();
        store.set(USER_KEY, "{not json").unwrap();

        let auth = AuthSession::restore(store);

        assert!(auth.current().is_none());
        assert!(auth.store.get(TOKEN_KEY).is_none());
        assert!(auth.store.get(USER_KEY).is_none());
    }

    #[test]
    fn test_restore_requires_both_keys() {
        let mut store = MemoryStore::new();
        store.set(TOKEN_KEY, "jwt").unwrap();
        let auth = AuthSession::restore(store);
        assert!(auth.current().is_none());
    }

    #[test]
    fn test_set_user_persists() {
        let mut auth = AuthSession::restore(MemoryStore::new());
        auth.login(make_session()).unwrap();

        let mut user = make_session().user;
        user.email = "changed@example.com".into();
        auth.set_user(user).unwrap();

        let restored = AuthSession::restore(auth.store.clone());
        assert_eq!(restored.current().unwrap().user.email, "changed@example.com");
    }

    #[test]
    fn test_set_user_when_signed_out_fails() {
        let mut auth = AuthSession::restore(MemoryStore::new());
        let result = auth.set_user(make_session().user);
        assert!(matches!(result, Err(MilktrackError::NotSignedIn)));
    }

    // ========== FileStore ==========

    #[test]
    fn test_file_store_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileStore::new(tmp.path());

        assert!(store.get("token").is_none());
        store.set("token", "abc").unwrap();
        store.set("user", "{}").unwrap();
        assert_eq!(store.get("token").as_deref(), Some("abc"));

        store.remove("token").unwrap();
        assert!(store.get("token").is_none());
        assert_eq!(store.get("user").as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_store_creates_data_dir() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b");
        let mut store = FileStore::new(&nested);

        store.set("token", "abc").unwrap();

        assert!(nested.join("session.json").exists());
        assert!(!nested.join("session.json.tmp").exists());
    }

    #[test]
    fn test_file_store_remove_without_file_is_noop() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileStore::new(tmp.path());
        store.remove("token").unwrap();
        assert!(!tmp.path().join("session.json").exists());
    }

    #[test]
    fn test_file_store_corrupt_file_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("session.json"), "garbage").unwrap();
        let mut store = FileStore::new(tmp.path());

        assert!(store.get("token").is_none());
        store.set("token", "fresh").unwrap();
        assert_eq!(store.get("token").as_deref(), Some("fresh"));
    }

    #[test]
    fn test_auth_session_over_file_store() {
        let tmp = TempDir::new().unwrap();
        let mut auth = AuthSession::restore(FileStore::new(tmp.path()));
        auth.login(make_session()).unwrap();

        let restored = AuthSession::restore(FileStore::new(tmp.path()));
        assert_eq!(restored.current().unwrap().user.username, "asha");

        let mut restored = restored;
        restored.logout().unwrap();
        let after = AuthSession::restore(FileStore::new(tmp.path()));
        assert!(after.current().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let mut store = FileStore::new(tmp.path());
        store.set("token", "secret").unwrap();
        let mode = fs::metadata(tmp.path().join("session.json")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
