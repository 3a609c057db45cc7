//! Persisted session: auth token plus cached user record.
//!
//! DESIGN
//! ======
//! The session lives in a key-value store under two fixed keys, the raw token
//! and the JSON-serialized user. `FileStore` keeps one file per key under the
//! state directory so a login survives restarts; `MemoryStore` is
//! process-local.
//!
//! The token and user are written and cleared as a pair. `restore` repairs a
//! half-written pair (or an unreadable user record) by clearing both, so a
//! caller never sees a token without its user.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

use crate::error::{ErrorCode, StoreError};
use crate::types::{AuthSuccess, UserSummary};

pub const TOKEN_KEY: &str = "lumi_auth_token";
pub const USER_KEY: &str = "lumi_current_user";

// =============================================================================
// KEY-VALUE BACKENDS
// =============================================================================

/// Durable (or not) string storage keyed by name.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// The directory is created lazily on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        create_private_dir(&self.dir)?;
        // Readers never observe a partially written record.
        let tmp = self.dir.join(format!(".{key}.tmp"));
        let mut file = create_private_file(&tmp)?;
        file.write_all(value.as_bytes())?;
        drop(file);
        std::fs::rename(&tmp, self.path_for(key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// State directory readable by the owner only (unix).
fn create_private_dir(dir: &Path) -> io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

/// Truncating writer at mode 0600 (unix), including over a stale temp file.
fn create_private_file(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(file)
}

/// Process-local storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Snapshot of the persisted session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserSummary>,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

/// Typed access to the session keys of a [`KeyValueStore`].
pub struct SessionStore {
    backing: Box<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(backing: impl KeyValueStore + 'static) -> Self {
        Self { backing: Box::new(backing) }
    }

    /// Session persisted under `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileStore::new(dir))
    }

    /// Session that lives only as long as the process.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self::new(MemoryStore::new())
    }

    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    pub fn token(&self) -> Result<Option<String>, StoreError> {
        self.backing.get(TOKEN_KEY)
    }

    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    pub fn set_token(&self, token: &str) -> Result<(), StoreError> {
        self.backing.set(TOKEN_KEY, token)
    }

    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    pub fn clear_token(&self) -> Result<(), StoreError> {
        self.backing.remove(TOKEN_KEY)
    }

    /// # Errors
    ///
    /// Returns an error if the storage cannot be read or the record is malformed.
    pub fn user(&self) -> Result<Option<UserSummary>, StoreError> {
        match self.backing.get(USER_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    pub fn set_user(&self, user: &UserSummary) -> Result<(), StoreError> {
        let raw = serde_json::to_string(user)?;
        self.backing.set(USER_KEY, &raw)
    }

    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    pub fn clear_user(&self) -> Result<(), StoreError> {
        self.backing.remove(USER_KEY)
    }

    /// Persist a fresh login. If either write fails, both keys are cleared.
    ///
    /// # Errors
    ///
    /// Returns the write error after the rollback attempt.
    pub fn save(&self, auth: &AuthSuccess) -> Result<(), StoreError> {
        let written = self
            .set_token(&auth.token)
            .and_then(|()| self.set_user(&auth.user));
        if let Err(e) = written {
            warn!(code = e.error_code(), error = %e, "session save failed; clearing partial session");
            if let Err(rollback) = self.clear() {
                warn!(
                    code = rollback.error_code(),
                    error = %rollback,
                    "session rollback failed; a partial session may remain"
                );
            }
            return Err(e);
        }
        info!(user_id = auth.user.id, username = %auth.user.username, "session saved");
        Ok(())
    }

    /// Remove both keys. Both removals are attempted even if the first fails.
    ///
    /// # Errors
    ///
    /// Returns the first removal error.
    pub fn clear(&self) -> Result<(), StoreError> {
        let token = self.clear_token();
        let user = self.clear_user();
        token.and(user)?;
        info!("session cleared");
        Ok(())
    }

    /// Read both keys as stored.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or the user record is malformed.
    pub fn load(&self) -> Result<Session, StoreError> {
        Ok(Session { token: self.token()?, user: self.user()? })
    }

    /// Read the session at startup, clearing a half-written or unreadable pair.
    ///
    /// # Errors
    ///
    /// Returns an error only if storage itself fails.
    pub fn restore(&self) -> Result<Session, StoreError> {
        let session = match self.load() {
            Ok(session) => session,
            Err(StoreError::Malformed(e)) => {
                warn!(error = %e, "stored user record unreadable; clearing session");
                self.clear()?;
                return Ok(Session::default());
            }
            Err(e) => return Err(e),
        };

        if session.token.is_some() != session.user.is_some() {
            warn!(
                has_token = session.token.is_some(),
                has_user = session.user.is_some(),
                "half-written session; clearing"
            );
            self.clear()?;
            return Ok(Session::default());
        }
        Ok(session)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
