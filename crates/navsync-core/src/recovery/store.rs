use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{info, warn};

use super::errors::StorageError;

/// Session-scoped key-value store shared by every mount in one session.
///
/// Access is a single synchronous call. Implementations provide their own
/// interior mutability.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store. Clones share the same entries, so a clone handed to a
/// second coordinator behaves like the same browser session.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

const FLAG_SET: &str = "1";

/// The recovery marker. Backed by the session store until the first store
/// error; from then on an in-memory value is used for the lifetime of this
/// instance and the store is never touched again.
pub struct RecoveryFlag {
    store: Rc<dyn SessionStore>,
    key: String,
    fallback: Option<bool>,
    degradation: Option<StorageError>,
}

impl RecoveryFlag {
    pub fn new(store: Rc<dyn SessionStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            fallback: None,
            degradation: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_set(&mut self) -> bool {
        if let Some(value) = self.fallback {
            return value;
        }
        match self.store.get(&self.key) {
            Ok(value) => value.as_deref() == Some(FLAG_SET),
            Err(e) => self.degrade(e, false),
        }
    }

    pub fn set(&mut self) {
        if self.fallback.is_some() {
            self.fallback = Some(true);
            return;
        }
        if let Err(e) = self.store.set(&self.key, FLAG_SET) {
            self.degrade(e, true);
        }
    }

    pub fn clear(&mut self) {
        if self.fallback.is_some() {
            self.fallback = Some(false);
            return;
        }
        if let Err(e) = self.store.remove(&self.key) {
            self.degrade(e, false);
        }
    }

    /// Whether the store failed and the flag now lives in memory.
    pub fn is_degraded(&self) -> bool {
        self.fallback.is_some()
    }

    /// The store error that caused degradation, reported once.
    pub fn take_degradation(&mut self) -> Option<StorageError> {
        self.degradation.take()
    }

    fn degrade(&mut self, error: StorageError, value: bool) -> bool {
        warn!(
            event = "core.storage.degraded",
            key = %self.key,
            error = %error
        );
        info!(
            event = "core.storage.memory_fallback_enabled",
            key = %self.key
        );
        self.fallback = Some(value);
        self.degradation = Some(error);
        value
    }
}

impl std::fmt::Debug for RecoveryFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryFlag")
            .field("key", &self.key)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::UnavailableSessionStore;

    #[test]
    fn test_memory_store_clones_share_entries() {
        let store = MemorySessionStore::new();
        let other = store.clone();
        store.set("navsync.recovery", "1").unwrap();
        assert_eq!(other.get("navsync.recovery").unwrap().as_deref(), Some("1"));
        other.remove("navsync.recovery").unwrap();
        assert!(!store.contains("navsync.recovery"));
    }

    #[test]
    fn test_flag_round_trip_through_store() {
        let store = MemorySessionStore::new();
        let mut flag = RecoveryFlag::new(Rc::new(store.clone()), "navsync.recovery");

        assert!(!flag.is_set());
        flag.set();
        assert!(flag.is_set());
        assert!(store.contains("navsync.recovery"));
        flag.clear();
        assert!(!flag.is_set());
        assert!(!flag.is_degraded());
    }

    #[test]
    fn test_flag_visible_to_other_instance() {
        let store: Rc<dyn SessionStore> = Rc::new(MemorySessionStore::new());
        let mut first = RecoveryFlag::new(store.clone(), "navsync.recovery");
        let mut second = RecoveryFlag::new(store, "navsync.recovery");

        first.set();
        assert!(second.is_set());
    }

    #[test]
    fn test_unavailable_store_falls_back_to_memory() {
        let store = UnavailableSessionStore::default();
        let mut flag = RecoveryFlag::new(Rc::new(store.clone()), "navsync.recovery");

        assert!(!flag.is_set());
        assert!(flag.is_degraded());
        assert!(matches!(
            flag.take_degradation(),
            Some(StorageError::Unavailable { .. })
        ));
        assert!(flag.take_degradation().is_none());

        flag.set();
        assert!(flag.is_set());
        flag.clear();
        assert!(!flag.is_set());
        assert_eq!(store.calls(), 1, "store is never retried after the first failure");
    }
}
