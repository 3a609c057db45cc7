use super::*;
use crate::error::ErrorCode;

fn user(id: i64) -> UserSummary {
    UserSummary {
        id,
        username: format!("user{id}"),
        email: Some(format!("user{id}@lumi.test")),
        full_name: Some(format!("User {id}")),
        role: Some("user".into()),
        avatar_url: None,
    }
}

fn auth(id: i64) -> AuthSuccess {
    AuthSuccess { token: format!("tok-{id}"), user: user(id) }
}

/// Accepts token writes, refuses user writes.
#[derive(Default)]
struct RefusesUserWrites {
    inner: MemoryStore,
}

impl KeyValueStore for RefusesUserWrites {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if key == USER_KEY {
            return Err(std::io::Error::other("disk full").into());
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}

// =============================================================================
// MemoryStore / FileStore
// =============================================================================

#[test]
fn memory_store_get_set_remove() {
    let store = MemoryStore::new();
    assert_eq!(store.get("k").unwrap(), None);
    store.set("k", "v").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    store.remove("k").unwrap();
    store.remove("k").unwrap();
    assert_eq!(store.get("k").unwrap(), None);
}

#[test]
fn file_store_creates_dir_and_persists() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("nested").join("state");
    let store = FileStore::new(&dir);

    assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    store.set(TOKEN_KEY, "abc").unwrap();
    assert!(dir.join(TOKEN_KEY).is_file());

    let reopened = FileStore::new(&dir);
    assert_eq!(reopened.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));

    reopened.remove(TOKEN_KEY).unwrap();
    reopened.remove(TOKEN_KEY).unwrap();
    assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
}

#[test]
fn file_store_overwrites_previous_value() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileStore::new(tmp.path());
    store.set(TOKEN_KEY, "first-and-longer").unwrap();
    store.set(TOKEN_KEY, "second").unwrap();
    assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("second"));
}

// =============================================================================
// SessionStore pairing
// =============================================================================

#[test]
fn save_then_load_returns_exact_pair() {
    let session = SessionStore::ephemeral();
    session.save(&auth(1)).unwrap();

    let loaded = session.load().unwrap();
    assert_eq!(loaded.token.as_deref(), Some("tok-1"));
    assert_eq!(loaded.user, Some(user(1)));
    assert!(loaded.is_authenticated());
}

#[test]
fn clear_removes_both_keys() {
    let session = SessionStore::ephemeral();
    session.save(&auth(2)).unwrap();
    session.clear().unwrap();

    assert_eq!(session.token().unwrap(), None);
    assert_eq!(session.user().unwrap(), None);
    assert!(!session.load().unwrap().is_authenticated());
}

#[test]
fn save_rolls_back_token_when_user_write_fails() {
    let session = SessionStore::new(RefusesUserWrites::default());
    let err = session.save(&auth(3)).unwrap_err();
    assert_eq!(err.error_code(), "E_STORE_IO");
    assert_eq!(session.token().unwrap(), None);
    assert_eq!(session.user().unwrap(), None);
}

/// Accepts the token, then refuses every further write or removal.
#[derive(Default)]
struct StuckAfterToken {
    inner: MemoryStore,
}

impl KeyValueStore for StuckAfterToken {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if key == USER_KEY {
            return Err(std::io::Error::other("disk full").into());
        }
        self.inner.set(key, value)
    }

    fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(std::io::Error::other("read-only").into())
    }
}

#[test]
fn failed_rollback_still_reports_the_write_error() {
    let session = SessionStore::new(StuckAfterToken::default());

    let err = session.save(&auth(5)).unwrap_err();

    assert!(err.to_string().contains("disk full"), "got {err}");
    // The rollback could not remove it; restore() repairs this pair later.
    assert_eq!(session.token().unwrap().as_deref(), Some("tok-5"));
}

#[cfg(unix)]
#[test]
fn file_store_keeps_session_private() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("state");
    let store = FileStore::new(&dir);
    store.set(TOKEN_KEY, "secret").unwrap();
    // Overwrite goes through the temp file again.
    store.set(TOKEN_KEY, "secret-2").unwrap();

    let file_mode = std::fs::metadata(dir.join(TOKEN_KEY)).unwrap().permissions().mode();
    let dir_mode = std::fs::metadata(&dir).unwrap().permissions().mode();
    assert_eq!(file_mode & 0o777, 0o600);
    assert_eq!(dir_mode & 0o077, 0);
    assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("secret-2"));
}

#[test]
fn session_survives_reopen_from_disk() {
    let tmp = tempfile::tempdir().unwrap();
    SessionStore::in_dir(tmp.path()).save(&auth(4)).unwrap();

    let restored = SessionStore::in_dir(tmp.path()).restore().unwrap();
    assert_eq!(restored.token.as_deref(), Some("tok-4"));
    assert_eq!(restored.user.map(|u| u.id), Some(4));
}

// =============================================================================
// restore repairs
// =============================================================================

#[test]
fn restore_empty_is_anonymous() {
    let session = SessionStore::ephemeral();
    assert_eq!(session.restore().unwrap(), Session::default());
}

#[test]
fn restore_clears_token_without_user() {
    let session = SessionStore::ephemeral();
    session.set_token("orphan").unwrap();

    let restored = session.restore().unwrap();
    assert!(!restored.is_authenticated());
    assert_eq!(session.token().unwrap(), None);
}

#[test]
fn restore_clears_user_without_token() {
    let session = SessionStore::ephemeral();
    session.set_user(&user(5)).unwrap();

    let restored = session.restore().unwrap();
    assert_eq!(restored, Session::default());
    assert_eq!(session.user().unwrap(), None);
}

#[test]
fn restore_clears_malformed_user_record() {
    let tmp = tempfile::tempdir().unwrap();
    let files = FileStore::new(tmp.path());
    files.set(TOKEN_KEY, "tok").unwrap();
    files.set(USER_KEY, "{not json").unwrap();

    let session = SessionStore::in_dir(tmp.path());
    assert!(matches!(session.load(), Err(StoreError::Malformed(_))));

    let restored = session.restore().unwrap();
    assert_eq!(restored, Session::default());
    assert_eq!(files.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(files.get(USER_KEY).unwrap(), None);
}
