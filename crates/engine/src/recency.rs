//! Most-recently-used command ids, per module.

use moa_core::CommandId;
use serde::{Deserialize, Serialize};

use crate::persist::Slot;

/// Ordered most-recent-first, de-duplicated, capped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecencyList {
    ids: Vec<CommandId>,
}

impl RecencyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary ids, keeping the first occurrence of each and at
    /// most `limit` entries.
    pub fn from_ids<I>(ids: I, limit: usize) -> Self
    where
        I: IntoIterator,
        I::Item: Into<CommandId>,
    {
        let mut list = Self::new();
        for id in ids {
            let id = id.into();
            if list.ids.len() >= limit {
                break;
            }
            if !list.ids.contains(&id) {
                list.ids.push(id);
            }
        }
        list
    }

    /// Move `id` to the front, dropping the oldest entries beyond `limit`.
    pub fn record(&mut self, id: CommandId, limit: usize) {
        // Remove if already present (we'll add to front)
        self.ids.retain(|c| c != &id);

        // Add to front
        self.ids.insert(0, id);

        // Limit size
        self.ids.truncate(limit);
    }

    /// 0 = most recent
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|c| c.as_str() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn ids(&self) -> &[CommandId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Recency list bound to its persistence key.
#[derive(Debug)]
pub struct RecencyStore {
    list: RecencyList,
    limit: usize,
    slot: Slot,
}

impl RecencyStore {
    /// Restore from `slot`, starting empty when nothing usable is stored.
    pub fn open(slot: Slot, limit: usize) -> Self {
        let stored: Vec<CommandId> = slot.load().unwrap_or_default();
        let list = RecencyList::from_ids(stored, limit);
        Self { list, limit, slot }
    }

    pub fn list(&self) -> &RecencyList {
        &self.list
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record a successful execution and persist.
    pub fn record(&mut self, id: CommandId) {
        self.list.record(id, self.limit);
        self.slot.save(&self.list);
    }

    pub fn flush(&self) {
        self.slot.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::testing::BrokenStore;
    use moa_config::{KeyValueStore, MemoryStore};
    use std::rc::Rc;

    #[test]
    fn record_moves_to_front_and_caps() {
        let mut list = RecencyList::new();
        for id in ["a", "b", "c", "a", "d", "e", "f"] {
            list.record(id.into(), 5);
        }
        let ids: Vec<&str> = list.iter().map(|c| c.as_str()).collect();
        assert_eq!(ids, vec!["f", "e", "d", "a", "c"]);
        assert_eq!(list.position("f"), Some(0));
        assert!(!list.contains("b"));
    }

    #[test]
    fn from_ids_dedups_and_caps() {
        let list = RecencyList::from_ids(["x", "y", "x", "z"], 2);
        assert_eq!(list.ids(), &[CommandId::from("x"), CommandId::from("y")]);
    }

    #[test]
    fn store_persists_across_sessions() {
        let store: Rc<MemoryStore> = Rc::new(MemoryStore::new());
        let slot = Slot::new(store.clone(), "payments:recent-commands");

        let mut recency = RecencyStore::open(slot.clone(), 5);
        recency.record("export".into());
        recency.record("refresh".into());

        assert_eq!(
            store.get("payments:recent-commands").unwrap().as_deref(),
            Some(r#"["refresh","export"]"#)
        );

        let reopened = RecencyStore::open(slot, 5);
        assert_eq!(reopened.list().position("export"), Some(1));
    }

    #[test]
    fn stored_list_is_sanitized_on_open() {
        let store: Rc<MemoryStore> = Rc::new(MemoryStore::new());
        store
            .set("k", r#"["a","a","b","c","d","e","f","g"]"#)
            .unwrap();
        let recency = RecencyStore::open(Slot::new(store, "k"), 3);
        assert_eq!(recency.list().len(), 3);
        assert_eq!(recency.list().position("c"), Some(2));
    }

    #[test]
    fn broken_storage_keeps_in_memory_list() {
        let mut recency = RecencyStore::open(Slot::new(Rc::new(BrokenStore::default()), "k"), 5);
        assert!(recency.list().is_empty());
        recency.record("export".into());
        assert_eq!(recency.list().position("export"), Some(0));
    }
}
