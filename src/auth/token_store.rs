use log::{debug, info, warn};
use std::sync::Arc;

use super::storage_trait::KeyValueStore;
use crate::constants::{REMEMBERED_EMAIL_KEY, TOKEN_KEY};
use crate::error::AppResult;

/// Sole owner of the persisted credential.
///
/// No validation happens here; see [`super::session::SessionContext`] for that.
#[derive(Debug, Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Current credential, if any. Backend failures read as "no credential".
    pub fn get(&self) -> Option<String> {
        match self.backend.get_item(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("TokenStore: Failed to read credential: {e}. Treating session as signed out.");
                None
            }
        }
    }

    pub fn set(&self, token: &str) -> AppResult<()> {
        self.backend.set_item(TOKEN_KEY, token)?;
        info!("TokenStore: Credential stored.");
        Ok(())
    }

    pub fn clear(&self) -> AppResult<()> {
        self.backend.remove_item(TOKEN_KEY)?;
        info!("TokenStore: Credential cleared.");
        Ok(())
    }

    pub fn remembered_email(&self) -> Option<String> {
        self.backend
            .get_item(REMEMBERED_EMAIL_KEY)
            .map_err(|e| warn!("TokenStore: Failed to read remembered email: {e}"))
            .ok()
            .flatten()
    }

    pub fn remember_email(&self, email: &str) -> AppResult<()> {
        debug!("TokenStore: Remembering login email.");
        self.backend.set_item(REMEMBERED_EMAIL_KEY, email)
    }

    pub fn forget_email(&self) -> AppResult<()> {
        self.backend.remove_item(REMEMBERED_EMAIL_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token_persistence::MemoryStorage;
    use crate::error::AppError;

    #[derive(Debug)]
    struct BrokenStorage;

    impl KeyValueStore for BrokenStorage {
        fn set_item(&self, _key: &str, _value: &str) -> AppResult<()> {
            Err(AppError::StorageError("read-only".into()))
        }
        fn get_item(&self, _key: &str) -> AppResult<Option<String>> {
            Err(AppError::StorageError("unavailable".into()))
        }
        fn remove_item(&self, _key: &str) -> AppResult<()> {
            Err(AppError::StorageError("read-only".into()))
        }
    }

    #[test]
    fn test_writes_are_immediately_visible() {
        let store = TokenStore::new(Arc::new(MemoryStorage::default()));
        assert_eq!(store.get(), None);

        store.set("first").unwrap();
        assert_eq!(store.get().as_deref(), Some("first"));

        store.set("second").unwrap();
        assert_eq!(store.get().as_deref(), Some("second"));

        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_clones_share_backend() {
        let store = TokenStore::new(Arc::new(MemoryStorage::default()));
        let other = store.clone();
        store.set("shared").unwrap();
        assert_eq!(other.get().as_deref(), Some("shared"));
    }

    #[test]
    fn test_broken_backend_reads_as_absent() {
        let store = TokenStore::new(Arc::new(BrokenStorage));
        assert_eq!(store.get(), None);
        assert!(store.set("x").is_err());
    }

    #[test]
    fn test_remembered_email_is_separate_from_token() {
        let store = TokenStore::new(Arc::new(MemoryStorage::default()));
        store.remember_email("ana@indhive.dev").unwrap();
        store.set("tok").unwrap();
        store.clear().unwrap();
        assert_eq!(store.remembered_email().as_deref(), Some("ana@indhive.dev"));
        store.forget_email().unwrap();
        assert_eq!(store.remembered_email(), None);
    }
}
