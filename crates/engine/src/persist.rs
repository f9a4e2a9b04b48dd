//! Module-scoped persistence slot.
//!
//! Every failure degrades to "nothing stored": reads that fail or return
//! malformed JSON yield `None`, writes that fail are logged and dropped.
//! Callers keep working from their in-memory state either way.

use std::rc::Rc;

use moa_config::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Clone)]
pub struct Slot {
    store: Rc<dyn KeyValueStore>,
    key: String,
}

impl Slot {
    pub fn new(store: Rc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn load<T: DeserializeOwned>(&self) -> Option<T> {
        let text = match self.store.get(&self.key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("{e}; using defaults");
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("malformed value for '{}': {e}; using defaults", self.key);
                None
            }
        }
    }

    /// Returns false when the write was dropped.
    pub fn save<T: Serialize>(&self, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("cannot serialize '{}': {e}", self.key);
                return false;
            }
        };

        match self.store.set(&self.key, &json) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{e}; keeping in-memory state only");
                false
            }
        }
    }

    pub fn flush(&self) {
        if let Err(e) = self.store.flush() {
            log::warn!("flush failed for '{}': {e}", self.key);
        }
    }
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot").field("key", &self.key).finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::BrokenStore;
    use super::*;
    use moa_config::MemoryStore;

    #[test]
    fn load_missing_is_none() {
        let slot = Slot::new(Rc::new(MemoryStore::new()), "audit:nav-state");
        assert_eq!(slot.load::<Vec<String>>(), None);
    }

    #[test]
    fn malformed_value_is_none() {
        let store = Rc::new(MemoryStore::new());
        store.set("audit:recent-commands", "{oops").unwrap();
        let slot = Slot::new(store, "audit:recent-commands");
        assert_eq!(slot.load::<Vec<String>>(), None);
    }

    #[test]
    fn save_then_load() {
        let slot = Slot::new(Rc::new(MemoryStore::new()), "k");
        assert!(slot.save(&vec!["a", "b"]));
        assert_eq!(slot.load::<Vec<String>>(), Some(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn broken_store_degrades() {
        let store = Rc::new(BrokenStore::default());
        let slot = Slot::new(store.clone(), "k");
        assert_eq!(slot.load::<Vec<String>>(), None);
        assert!(!slot.save(&vec!["a"]));
        slot.flush();
        assert_eq!(store.writes.get(), 1);
    }
}
