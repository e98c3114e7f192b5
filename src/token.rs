//! Bearer token custody. The token is an opaque string persisted under a
//! configurable key in the host's storage; presence of a token never implies
//! a valid session, only the bootstrap check establishes that.

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Host-provided persistent key/value storage, the seam for browser
/// `localStorage` or any equivalent the embedding shell offers.
pub trait TokenStorage: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;
    fn store(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory backend for native hosts and tests. Survives for the process
/// lifetime only.
#[derive(Default)]
pub struct MemoryTokenStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn store(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
    }
}

/// Process-wide token slot. Written on login, read on every authorized call,
/// cleared on logout or an authoritative invalid-credential signal.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn TokenStorage>,
    key: String,
}

impl TokenStore {
    #[must_use]
    pub fn new(storage: Arc<dyn TokenStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn set(&self, token: &SecretString) {
        self.storage.store(&self.key, token.expose_secret());
    }

    #[must_use]
    pub fn get(&self) -> Option<SecretString> {
        self.storage.load(&self.key).map(SecretString::from)
    }

    pub fn clear(&self) {
        self.storage.remove(&self.key);
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("key", &self.key)
            .field("token", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_clear_round_trip() {
        let store = TokenStore::new(Arc::new(MemoryTokenStorage::new()), "access_token");
        assert!(store.get().is_none());

        store.set(&SecretString::from("bearer-abc".to_string()));
        let loaded = store.get().expect("token should be present");
        assert_eq!(loaded.expose_secret(), "bearer-abc");

        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn distinct_keys_do_not_collide() {
        let storage: Arc<dyn TokenStorage> = Arc::new(MemoryTokenStorage::new());
        let user = TokenStore::new(Arc::clone(&storage), "user.access_token");
        let admin = TokenStore::new(Arc::clone(&storage), "admin.access_token");

        user.set(&SecretString::from("user-token".to_string()));
        assert!(admin.get().is_none());

        admin.set(&SecretString::from("admin-token".to_string()));
        user.clear();
        let kept = admin.get().expect("admin token should survive user logout");
        assert_eq!(kept.expose_secret(), "admin-token");
    }

    #[test]
    fn debug_redacts_token_material() {
        let store = TokenStore::new(Arc::new(MemoryTokenStorage::new()), "access_token");
        store.set(&SecretString::from("super-secret".to_string()));
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("super-secret"));
    }
}
