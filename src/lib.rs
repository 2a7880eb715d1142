//! ALICE-Roster — Hierarchical person records with an audit trail
//!
//! Edit the tree, keep every version, log every change.
//!
//! In-memory store for a forest of person records:
//! - Depth-first, pre-order lookup of any record and its ancestor path
//! - Copy-on-write edits (only the path to the target is rebuilt)
//! - Append-only change log with before/after snapshots
//! - Atomic snapshot publishing with subscriptions
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`person`] | `Person`, `Forest`, input fields and validation |
//! | [`traverse`] | Find by id, ancestor paths, pre-order walk |
//! | [`mutate`] | Pure insert / replace / remove over a forest |
//! | [`audit`] | Change-log entries and the append-only log |
//! | [`store`] | `PersonStore` façade and `Snapshot` |
//! | [`shared`] | `RwLock`-guarded handle for multi-threaded hosts |
//! | [`ids`] | Timestamp-derived monotonic ids |
//! | [`config`] | `StoreConfig` and TOML loading |
//! | [`sample`] | Demo forest |
//! | [`error`] | `StoreError`, `ValidationError`, `ConfigError` |
//!
//! # Quick Start
//!
//! ```
//! use alice_roster::{ChangeAction, PersonFields, PersonStore, Status, StoreConfig};
//!
//! let mut store = PersonStore::with_config(StoreConfig::demo());
//!
//! // Edit a nested record in place
//! let fields = PersonFields::new()
//!     .with_name("Alice B.")
//!     .with_age(26)
//!     .with_status(Status::Inactive);
//! store.update("1-1", fields).unwrap();
//!
//! // Ancestry is recovered by traversal
//! let path = store.find_path("1-1").unwrap();
//! assert_eq!(path[0].name, "John");
//!
//! // One audit entry per accepted change
//! let history = store.entries_for("1-1");
//! assert_eq!(history.len(), 1);
//! assert_eq!(history[0].action, ChangeAction::Update);
//! ```
//!
//! Author: Moroya Sakamoto

pub mod audit;
pub mod config;
pub mod error;
pub mod ids;
pub mod mutate;
pub mod person;
pub mod sample;
pub mod shared;
pub mod store;
pub mod traverse;

pub use audit::{ChangeAction, ChangeLog, ChangeLogEntry, FieldChange, PendingEntry};
pub use config::StoreConfig;
pub use error::{ConfigError, Result, StoreError, ValidationError};
pub use ids::IdClock;
pub use person::{Forest, Person, PersonDraft, PersonFields, PersonId, PersonSnapshot, Status};
pub use sample::sample_forest;
pub use shared::SharedPersonStore;
pub use store::{PersonStore, Snapshot, SubscriptionId};
pub use traverse::{find_by_id, find_path};
