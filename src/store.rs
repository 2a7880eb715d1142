//! Person store
//!
//! The one entry point callers use. Each command reads the current
//! [`Snapshot`], computes the next forest from it, then installs that
//! forest and appends one audit entry in a single step. A snapshot a
//! reader holds is never touched: the store copies it before writing.
//! A command either fully succeeds or publishes nothing, so readers only
//! ever see complete snapshots.
//!
//! | Command | Audit entry |
//! |---------|-------------|
//! | [`create`](PersonStore::create) | CREATE, after |
//! | [`update`](PersonStore::update) | UPDATE, before + after |
//! | [`delete`](PersonStore::delete) | DELETE, before; none if absent |
//! | [`set_all`](PersonStore::set_all) | UPDATE on the bulk sentinel |
//! | [`set_loading`](PersonStore::set_loading) | none |
//! | [`clear_log`](PersonStore::clear_log) | none (empties the log) |
//!
//! Author: Moroya Sakamoto

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audit::{ChangeAction, ChangeLog, ChangeLogEntry, PendingEntry};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError, ValidationError};
use crate::ids::IdClock;
use crate::mutate;
use crate::person::{Forest, Person, PersonFields};
use crate::sample::sample_forest;
use crate::traverse;

/// Store state at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub forest: Forest,
    pub log: ChangeLog,
    pub is_loading: bool,
}

/// Handle returned by [`PersonStore::subscribe`]
pub type SubscriptionId = u64;

type Listener = Box<dyn Fn(&Snapshot) + Send + Sync>;

/// In-memory person store with an audit trail
pub struct PersonStore {
    current: Arc<Snapshot>,
    ids: IdClock,
    config: StoreConfig,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl Default for PersonStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PersonStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersonStore")
            .field("current", &self.current)
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl PersonStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        let forest = if config.seed_sample_data {
            sample_forest()
        } else {
            Forest::new()
        };
        Self {
            current: Arc::new(Snapshot {
                forest,
                ..Snapshot::default()
            }),
            ids: IdClock::new(),
            config,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Current snapshot; stays valid and unchanged after later commands
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current)
    }

    pub fn forest(&self) -> &Forest {
        &self.current.forest
    }

    pub fn log(&self) -> &ChangeLog {
        &self.current.log
    }

    pub fn is_loading(&self) -> bool {
        self.current.is_loading
    }

    pub fn find_by_id(&self, id: &str) -> Option<Arc<Person>> {
        self.current.forest.find_by_id(id).cloned()
    }

    pub fn find_path(&self, id: &str) -> Option<Vec<Arc<Person>>> {
        self.current.forest.find_path(id)
    }

    /// Audit entries about `id`, oldest first
    pub fn entries_for(&self, id: &str) -> Vec<&ChangeLogEntry> {
        self.current.log.entries_for(id)
    }

    // ── Commands ───────────────────────────────────────────────────────

    /// Append a new root record
    pub fn create(&mut self, fields: PersonFields) -> Result<Arc<Person>> {
        let draft = fields.validate().map_err(|err| reject("create", err))?;

        let (forest, person) = mutate::insert_root(&self.current.forest, draft, &mut self.ids);
        let pending = PendingEntry::new(ChangeAction::Create, &person.id, &person.name)
            .after(person.snapshot().with_id(&person.id));

        self.commit(forest, pending);
        debug!(person_id = %person.id, "person created");
        Ok(person)
    }

    /// Replace the fields of an existing record, wherever it sits
    ///
    /// Children are kept unless `fields.children` is given. Fails with
    /// [`StoreError::NotFound`] when `id` is absent.
    pub fn update(&mut self, id: &str, fields: PersonFields) -> Result<Arc<Person>> {
        let draft = fields.validate().map_err(|err| reject("update", err))?;

        let existing = self
            .current
            .forest
            .find_by_id(id)
            .cloned()
            .ok_or_else(|| reject("update", StoreError::NotFound(String::from(id))))?;
        let updated = Arc::new(mutate::apply_fields(
            &existing,
            draft,
            &self.current.forest,
            &mut self.ids,
        ));

        let forest = mutate::replace(&self.current.forest, id, Arc::clone(&updated))?;
        let pending = PendingEntry::new(ChangeAction::Update, id, &updated.name)
            .before(existing.snapshot())
            .after(updated.snapshot());

        self.commit(forest, pending);
        debug!(person_id = %id, "person updated");
        Ok(updated)
    }

    /// Remove a record and its subtree
    ///
    /// Returns the removed record. Deleting an absent id is a no-op: no
    /// audit entry, nothing published, `None` returned.
    pub fn delete(&mut self, id: &str) -> Option<Arc<Person>> {
        let Some(existing) = self.current.forest.find_by_id(id).cloned() else {
            debug!(person_id = %id, "delete of absent person ignored");
            return None;
        };

        let forest = mutate::remove_by_id(&self.current.forest, id);
        let pending = PendingEntry::new(ChangeAction::Delete, id, &existing.name)
            .before(existing.snapshot());

        self.commit(forest, pending);
        debug!(person_id = %id, "person deleted");
        Some(existing)
    }

    /// Replace the whole forest
    ///
    /// Ids must be unique across the supplied forest, none may equal the
    /// bulk sentinel and every name must be non-empty. Records one UPDATE
    /// entry on the bulk sentinel.
    pub fn set_all(&mut self, records: impl Into<Forest>) -> Result<()> {
        let forest = records.into();
        if let Some(dup) = traverse::first_duplicate_id(&forest) {
            return Err(reject("set_all", ValidationError::DuplicateId(dup)));
        }
        let sentinel = &self.config.bulk_person_id;
        if forest.contains(sentinel) {
            return Err(reject("set_all", ValidationError::ReservedId(sentinel.clone())));
        }
        if forest.walk().any(|p| p.name.trim().is_empty()) {
            return Err(reject("set_all", ValidationError::EmptyName));
        }

        let pending = PendingEntry::new(
            ChangeAction::Update,
            &self.config.bulk_person_id,
            &self.config.bulk_person_name,
        );

        let records = forest.record_count();
        self.commit(forest, pending);
        info!(records, "forest replaced");
        Ok(())
    }

    /// Set the loading flag; never audited
    pub fn set_loading(&mut self, loading: bool) {
        Arc::make_mut(&mut self.current).is_loading = loading;
        self.notify();
    }

    /// Discard the whole audit log
    pub fn clear_log(&mut self) {
        let discarded = self.current.log.len();
        let next = Arc::make_mut(&mut self.current);
        next.log = next.log.clear();
        self.notify();
        info!(discarded, "change log cleared");
    }

    // ── Subscriptions ──────────────────────────────────────────────────

    /// Call `listener` with every snapshot published from now on
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `true` if the subscription existed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Install `forest`, append `pending` and publish
    ///
    /// The snapshot is updated in place; it is copied first only while a
    /// reader still holds it.
    fn commit(&mut self, forest: Forest, pending: PendingEntry) {
        let next = Arc::make_mut(&mut self.current);
        next.forest = forest;
        next.log.append(pending, &mut self.ids);
        self.notify();
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(self.current.as_ref());
        }
    }
}

fn reject(command: &'static str, err: impl Into<StoreError>) -> StoreError {
    let err = err.into();
    warn!(command, error = %err, "command rejected");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::{PersonSnapshot, Status};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    }

    fn fields(name: &str, age: i64, status: Status) -> PersonFields {
        PersonFields::new()
            .with_name(name)
            .with_age(age)
            .with_status(status)
    }

    fn john_alice_store() -> PersonStore {
        let mut store = PersonStore::new();
        store
            .set_all(vec![Person::new("1", "John", 30, Status::Active)
                .with_children(vec![Person::new("1-1", "Alice", 25, Status::Active)])])
            .unwrap();
        store.clear_log();
        store
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = PersonStore::new();
        assert!(store.forest().is_empty());
        assert!(store.log().is_empty());
        assert!(!store.is_loading());
    }

    #[test]
    fn test_demo_store_is_seeded_without_audit() {
        let store = PersonStore::with_config(StoreConfig::demo());
        assert_eq!(store.forest().len(), 2);
        assert!(store.find_by_id("2-1").is_some());
        assert!(store.log().is_empty());
    }

    #[test]
    fn test_create_round_trip() {
        init_tracing();
        let mut store = PersonStore::new();
        let created = store.create(fields("Eve", 41, Status::Active)).unwrap();

        let found = store.find_by_id(&created.id).unwrap();
        assert_eq!(found, created);
        assert_eq!(found.name, "Eve");
        assert_eq!(found.age, 41);

        let entry = store.log().latest().unwrap();
        assert_eq!(entry.action, ChangeAction::Create);
        assert_eq!(entry.person_id, created.id);
        assert!(entry.before_state.is_none());
        assert_eq!(entry.after_state, Some(created.snapshot().with_id(&created.id)));
        assert_eq!(entry.description, "CREATE operation on Eve");
    }

    #[test]
    fn test_create_appends_as_last_root() {
        let mut store = PersonStore::with_config(StoreConfig::demo());
        let created = store.create(fields("Eve", 41, Status::Active)).unwrap();
        assert_eq!(store.forest().len(), 3);
        assert_eq!(store.forest().roots()[2].id, created.id);
    }

    #[test]
    fn test_create_rejects_invalid_without_change() {
        let mut store = PersonStore::with_config(StoreConfig::demo());
        let before = store.snapshot();

        let err = store.create(fields("", 3, Status::Active)).unwrap_err();
        assert_eq!(err, StoreError::Validation(ValidationError::EmptyName));

        let err = store.create(fields("Neg", -1, Status::Active)).unwrap_err();
        assert_eq!(err, StoreError::Validation(ValidationError::NegativeAge(-1)));

        let err = store.create(PersonFields::new().with_name("x").with_age(1)).unwrap_err();
        assert_eq!(err, StoreError::Validation(ValidationError::MissingField("status")));

        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn test_update_nested_scenario() {
        init_tracing();
        let mut store = john_alice_store();
        let old_forest = store.forest().clone();

        store
            .update("1-1", fields("Alice B.", 26, Status::Inactive))
            .unwrap();

        let john = &store.forest().roots()[0];
        assert_eq!(john.children().len(), 1);
        let alice = &john.children()[0];
        assert_eq!(alice.id, "1-1");
        assert_eq!(alice.name, "Alice B.");
        assert_eq!(alice.age, 26);
        assert_eq!(alice.status, Status::Inactive);

        assert_eq!(store.log().len(), 1);
        let entry = store.log().latest().unwrap();
        assert_eq!(entry.action, ChangeAction::Update);
        assert_eq!(entry.person_id, "1-1");

        assert_eq!(
            serde_json::to_value(&entry.before_state).unwrap(),
            serde_json::json!({"name": "Alice", "age": 25, "status": "active"})
        );
        assert_eq!(
            serde_json::to_value(&entry.after_state).unwrap(),
            serde_json::json!({"name": "Alice B.", "age": 26, "status": "inactive"})
        );

        // the forest held before the update is unchanged
        assert_eq!(old_forest.find_by_id("1-1").unwrap().name, "Alice");
    }

    #[test]
    fn test_update_keeps_children_unless_overridden() {
        let mut store = john_alice_store();
        store.update("1", fields("Johnny", 31, Status::Active)).unwrap();
        let john = store.find_by_id("1").unwrap();
        assert_eq!(john.children().len(), 1);
        assert_eq!(john.children()[0].id, "1-1");

        store
            .update("1", fields("Johnny", 31, Status::Active).with_children(vec![]))
            .unwrap();
        assert!(store.find_by_id("1").unwrap().is_leaf());
        assert!(store.find_by_id("1-1").is_none());
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut store = john_alice_store();
        let before = store.snapshot();
        let err = store.update("9", fields("X", 1, Status::Active)).unwrap_err();
        assert_eq!(err, StoreError::NotFound(String::from("9")));
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn test_update_validates_before_lookup() {
        let mut store = john_alice_store();
        let err = store.update("9", fields("X", -5, Status::Active)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.log().is_empty());
    }

    #[test]
    fn test_delete_root_scenario() {
        let mut store = john_alice_store();
        let removed = store.delete("1").unwrap();
        assert_eq!(removed.id, "1");
        assert!(store.forest().is_empty());
        assert!(store.find_by_id("1-1").is_none());

        assert_eq!(store.log().len(), 1);
        let entry = store.log().latest().unwrap();
        assert_eq!(entry.action, ChangeAction::Delete);
        assert_eq!(entry.person_id, "1");
        assert_eq!(entry.before_state.as_ref().unwrap().name.as_deref(), Some("John"));
        assert!(entry.after_state.is_none());
    }

    #[test]
    fn test_delete_twice_is_idempotent() {
        let mut store = PersonStore::with_config(StoreConfig::demo());
        assert!(store.delete("1-2").is_some());
        let after_first = store.forest().clone();
        assert!(store.delete("1-2").is_none());
        assert_eq!(*store.forest(), after_first);
        assert_eq!(store.log().len(), 1);
    }

    #[test]
    fn test_delete_then_update_asymmetry() {
        let mut store = PersonStore::with_config(StoreConfig::demo());
        assert!(store.delete("nobody").is_none());
        assert!(store.update("nobody", fields("x", 1, Status::Active)).is_err());
        assert!(store.log().is_empty());
    }

    #[test]
    fn test_find_path_scenario() {
        let store = john_alice_store();
        let path = store.find_path("1-1").unwrap();
        let ids: Vec<&str> = path.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["1", "1-1"]);
        assert!(store.find_path("missing").is_none());
    }

    #[test]
    fn test_entries_for_tracks_one_person() {
        let mut store = PersonStore::with_config(StoreConfig::demo());
        store.update("1-1", fields("Alice", 26, Status::Active)).unwrap();
        store.update("2", fields("Sara", 26, Status::Active)).unwrap();
        store.delete("1-1");

        let actions: Vec<ChangeAction> = store
            .entries_for("1-1")
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, [ChangeAction::Update, ChangeAction::Delete]);
        assert!(store.entries_for("1-2").is_empty());
    }

    #[test]
    fn test_set_all_records_bulk_update() {
        let mut store = PersonStore::with_config(StoreConfig::demo());
        store
            .set_all(vec![Person::new("a", "Ann", 50, Status::Inactive)])
            .unwrap();
        assert_eq!(store.forest().len(), 1);

        let entry = store.log().latest().unwrap();
        assert_eq!(entry.action, ChangeAction::Update);
        assert_eq!(entry.person_id, "*");
        assert_eq!(entry.person_name, "All records");
        assert_eq!(entry.description, "UPDATE operation on All records");
    }

    #[test]
    fn test_set_all_uses_configured_sentinel() {
        let config = StoreConfig {
            bulk_person_id: String::from("bulk"),
            ..StoreConfig::default()
        };
        let mut store = PersonStore::with_config(config);
        store.set_all(Forest::new()).unwrap();
        assert_eq!(store.entries_for("bulk").len(), 1);
    }

    #[test]
    fn test_set_all_rejects_duplicate_ids() {
        let mut store = PersonStore::with_config(StoreConfig::demo());
        let before = store.snapshot();
        let err = store
            .set_all(vec![
                Person::new("x", "A", 1, Status::Active),
                Person::new("y", "B", 1, Status::Active)
                    .with_children(vec![Person::new("x", "C", 1, Status::Active)]),
            ])
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Validation(ValidationError::DuplicateId(String::from("x")))
        );
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn test_set_all_rejects_empty_name() {
        let mut store = PersonStore::new();
        let err = store
            .set_all(vec![Person::new("x", " ", 1, Status::Active)])
            .unwrap_err();
        assert_eq!(err, StoreError::Validation(ValidationError::EmptyName));
    }

    #[test]
    fn test_set_all_rejects_bulk_sentinel_id() {
        let mut store = PersonStore::with_config(StoreConfig::demo());
        let before = store.snapshot();
        let err = store
            .set_all(vec![Person::new("1", "A", 1, Status::Active)
                .with_children(vec![Person::new("*", "Star", 2, Status::Active)])])
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Validation(ValidationError::ReservedId(String::from("*")))
        );
        assert_eq!(*store.snapshot(), *before);

        let config = StoreConfig {
            bulk_person_id: String::from("bulk"),
            ..StoreConfig::empty()
        };
        let mut store = PersonStore::with_config(config);
        store.set_all(vec![Person::new("*", "Star", 2, Status::Active)]).unwrap();
        assert_eq!(store.entries_for("*").len(), 0);
        assert_eq!(store.entries_for("bulk").len(), 1);
    }

    #[test]
    fn test_created_ids_avoid_bulk_loaded_ids() {
        let mut store = PersonStore::new();
        store.set_all(vec![Person::new("1", "A", 1, Status::Active)]).unwrap();
        let created = store.create(fields("B", 2, Status::Active)).unwrap();
        assert_ne!(created.id, "1");
    }

    #[test]
    fn test_set_loading_is_not_audited() {
        let mut store = PersonStore::new();
        store.set_loading(true);
        assert!(store.is_loading());
        assert!(store.log().is_empty());
        store.set_loading(false);
        assert!(!store.is_loading());
    }

    #[test]
    fn test_loading_flag_survives_mutations() {
        let mut store = PersonStore::new();
        store.set_loading(true);
        store.create(fields("A", 1, Status::Active)).unwrap();
        assert!(store.is_loading());
    }

    #[test]
    fn test_clear_log_keeps_forest() {
        let mut store = PersonStore::with_config(StoreConfig::demo());
        store.create(fields("A", 1, Status::Active)).unwrap();
        store.delete("2");
        assert_eq!(store.log().len(), 2);

        let forest = store.forest().clone();
        store.clear_log();
        assert!(store.log().is_empty());
        assert_eq!(*store.forest(), forest);
    }

    #[test]
    fn test_commands_write_unshared_snapshot_in_place() {
        let mut store = PersonStore::with_config(StoreConfig::demo());
        store.create(fields("A", 1, Status::Active)).unwrap();
        let first_entry = Arc::clone(&store.log().entries()[0]);
        let slot = Arc::as_ptr(&store.current);

        store.update("1", fields("Jon", 31, Status::Active)).unwrap();
        store.delete("2");
        store.set_loading(true);

        assert_eq!(Arc::as_ptr(&store.current), slot);
        assert_eq!(store.log().len(), 3);
        assert!(Arc::ptr_eq(&first_entry, &store.log().entries()[0]));
    }

    #[test]
    fn test_old_snapshot_is_unchanged() {
        let mut store = PersonStore::with_config(StoreConfig::demo());
        let old = store.snapshot();
        store.update("1", fields("Jon", 31, Status::Inactive)).unwrap();
        store.delete("2");
        assert_eq!(old.forest.find_by_id("1").unwrap().name, "John");
        assert!(old.forest.find_by_id("2").is_some());
        assert!(old.log.is_empty());
    }

    #[test]
    fn test_subscribers_see_each_published_snapshot() {
        let mut store = PersonStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let sub = store.subscribe(move |_snap| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        store.create(fields("A", 1, Status::Active)).unwrap();
        store.set_loading(true);
        let _ = store.update("missing", fields("B", 1, Status::Active));
        store.delete("missing");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(store.unsubscribe(sub));
        assert!(!store.unsubscribe(sub));
        store.clear_log();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscriber_receives_new_state() {
        let mut store = PersonStore::new();
        let last = Arc::new(parking_lot::Mutex::new(None::<PersonSnapshot>));
        let sink = Arc::clone(&last);
        store.subscribe(move |snap| {
            *sink.lock() = snap.forest.roots().last().map(|p| p.snapshot());
        });

        let created = store.create(fields("Zoe", 9, Status::Inactive)).unwrap();
        assert_eq!(*last.lock(), Some(created.snapshot()));
    }

    #[test]
    fn test_snapshot_json_contract() {
        let store = PersonStore::with_config(StoreConfig::demo());
        let json = serde_json::to_value(&*store.snapshot()).unwrap();
        assert_eq!(json["isLoading"], false);
        assert_eq!(json["forest"][0]["children"][1]["name"], "Bob");
        assert!(json["log"].as_array().unwrap().is_empty());
    }
}
