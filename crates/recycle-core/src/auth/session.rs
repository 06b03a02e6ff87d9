use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use super::store::KeyValueStore;

/// Storage key the session token lives under
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Persisted session token.
///
/// The token is opaque to this client. It is written after a successful
/// login, read on start and only removed by an explicit sign-out.
/// Clone is cheap; clones share the underlying store.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn KeyValueStore>,
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the stored token, if any. Empty values count as absent.
    pub fn load(&self) -> Result<Option<String>> {
        let token = self
            .store
            .get(AUTH_TOKEN_KEY)
            .context("Failed to read session token")?;
        Ok(token.filter(|t| !t.is_empty()))
    }

    pub fn save(&self, token: &str) -> Result<()> {
        self.store
            .set(AUTH_TOKEN_KEY, token)
            .context("Failed to save session token")?;
        debug!("Session token saved");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.store
            .remove(AUTH_TOKEN_KEY)
            .context("Failed to clear session token")
    }

    /// Check whether a token is stored
    pub fn is_signed_in(&self) -> Result<bool> {
        Ok(self.load()?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{FileStore, MemoryStore};
    use tempfile::tempdir;

    #[test]
    fn test_session_save_load_clear() {
        let session = Session::new(Arc::new(MemoryStore::new()));
        assert_eq!(session.load().unwrap(), None);
        assert!(!session.is_signed_in().unwrap());

        session.save("jwt-token").unwrap();
        assert_eq!(session.load().unwrap().as_deref(), Some("jwt-token"));
        assert!(session.is_signed_in().unwrap());

        session.clear().unwrap();
        assert_eq!(session.load().unwrap(), None);
    }

    #[test]
    fn test_session_uses_fixed_key() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());
        session.save("jwt-token").unwrap();
        assert_eq!(store.get("authToken").unwrap().as_deref(), Some("jwt-token"));
    }

    #[test]
    fn test_session_empty_value_is_absent() {
        let store = Arc::new(MemoryStore::new());
        store.set(AUTH_TOKEN_KEY, "").unwrap();
        let session = Session::new(store);
        assert_eq!(session.load().unwrap(), None);
    }

    #[test]
    fn test_session_survives_restart_with_file_store() {
        let dir = tempdir().unwrap();
        Session::new(Arc::new(FileStore::new(dir.path())))
            .save("persisted")
            .unwrap();

        let session = Session::new(Arc::new(FileStore::new(dir.path())));
        assert_eq!(session.load().unwrap().as_deref(), Some("persisted"));
    }
}
