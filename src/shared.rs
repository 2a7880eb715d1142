//! Thread-safe store handle
//!
//! Wraps a [`PersonStore`] in one `RwLock`: commands take the write
//! lock for their whole read-compute-publish cycle, queries take the read
//! lock. Listeners run under the write lock and must not call back into
//! the same handle; the snapshot they receive carries everything.
//!
//! Author: Moroya Sakamoto

use std::sync::Arc;

use parking_lot::RwLock;

use crate::audit::ChangeLogEntry;
use crate::error::Result;
use crate::person::{Forest, Person, PersonFields};
use crate::store::{PersonStore, Snapshot, SubscriptionId};

/// Cloneable, shareable handle to one store
#[derive(Debug, Clone, Default)]
pub struct SharedPersonStore {
    inner: Arc<RwLock<PersonStore>>,
}

impl SharedPersonStore {
    pub fn new(store: PersonStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.read().snapshot()
    }

    pub fn find_by_id(&self, id: &str) -> Option<Arc<Person>> {
        self.inner.read().find_by_id(id)
    }

    pub fn find_path(&self, id: &str) -> Option<Vec<Arc<Person>>> {
        self.inner.read().find_path(id)
    }

    pub fn entries_for(&self, id: &str) -> Vec<ChangeLogEntry> {
        self.inner
            .read()
            .entries_for(id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn create(&self, fields: PersonFields) -> Result<Arc<Person>> {
        self.inner.write().create(fields)
    }

    pub fn update(&self, id: &str, fields: PersonFields) -> Result<Arc<Person>> {
        self.inner.write().update(id, fields)
    }

    pub fn delete(&self, id: &str) -> Option<Arc<Person>> {
        self.inner.write().delete(id)
    }

    pub fn set_all(&self, records: impl Into<Forest>) -> Result<()> {
        self.inner.write().set_all(records)
    }

    pub fn set_loading(&self, loading: bool) {
        self.inner.write().set_loading(loading)
    }

    pub fn clear_log(&self) {
        self.inner.write().clear_log()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.inner.write().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.write().unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::person::Status;
    use std::collections::HashSet;
    use std::thread;

    fn fields(name: &str) -> PersonFields {
        PersonFields::new()
            .with_name(name)
            .with_age(20)
            .with_status(Status::Active)
    }

    #[test]
    fn test_clones_share_state() {
        let a = SharedPersonStore::default();
        let b = a.clone();
        let created = a.create(fields("Ann")).unwrap();
        assert_eq!(b.find_by_id(&created.id).unwrap().name, "Ann");
        assert_eq!(b.entries_for(&created.id).len(), 1);
    }

    #[test]
    fn test_concurrent_creates_are_serialized() {
        let store = SharedPersonStore::default();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    (0..25)
                        .map(|i| store.create(fields(&format!("p{t}-{i}"))).unwrap().id.clone())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id), "duplicate id issued");
            }
        }

        let snap = store.snapshot();
        assert_eq!(snap.forest.len(), 100);
        assert_eq!(snap.log.len(), 100);
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let store = SharedPersonStore::new(PersonStore::with_config(StoreConfig::demo()));
        let before = store.snapshot();
        store.delete("1");
        assert!(before.forest.find_by_id("1").is_some());
        assert!(store.find_by_id("1").is_none());
        assert_eq!(store.find_path("2-1").unwrap().len(), 2);
    }

    #[test]
    fn test_commands_through_handle() {
        let store = SharedPersonStore::new(PersonStore::with_config(StoreConfig::demo()));
        store.update("2-1", fields("Chuck")).unwrap();
        store.set_loading(true);
        assert!(store.snapshot().is_loading);
        store.set_all(Forest::new()).unwrap();
        assert!(store.snapshot().forest.is_empty());
        store.clear_log();
        assert!(store.snapshot().log.is_empty());

        let sub = store.subscribe(|_| {});
        assert!(store.unsubscribe(sub));
    }
}
