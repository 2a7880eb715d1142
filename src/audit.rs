//! Audit trail
//!
//! Append-only change log. Entries are immutable once recorded and the
//! log is a total order of events, oldest first. Like the forest, a
//! [`ChangeLog`] is a value: [`record`](ChangeLog::record) returns a new
//! log and leaves the previous one as it was, while
//! [`append`](ChangeLog::append) grows a log the caller owns.
//!
//! Author: Moroya Sakamoto

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::IdClock;
use crate::person::{PersonId, PersonSnapshot};

/// Kind of change recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "CREATE",
            ChangeAction::Update => "UPDATE",
            ChangeAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    /// Unique, increasing entry id
    pub id: String,
    /// When the change was recorded
    pub timestamp: DateTime<Utc>,
    pub action: ChangeAction,
    /// Affected record, or the bulk sentinel for whole-forest changes
    pub person_id: PersonId,
    pub person_name: String,
    /// Present for UPDATE and DELETE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_state: Option<PersonSnapshot>,
    /// Present for CREATE and UPDATE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_state: Option<PersonSnapshot>,
    pub description: String,
}

/// A single field that differs between before and after
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl ChangeLogEntry {
    /// Field-level differences between `before_state` and `after_state`
    ///
    /// Fields equal or absent on both sides are skipped; the id is not
    /// reported.
    pub fn changes(&self) -> Vec<FieldChange> {
        let empty = PersonSnapshot::default();
        let before = self.before_state.as_ref().unwrap_or(&empty);
        let after = self.after_state.as_ref().unwrap_or(&empty);

        let fields = [
            ("name", before.name.clone(), after.name.clone()),
            ("age", render(before.age), render(after.age)),
            ("status", render(before.status), render(after.status)),
        ];

        fields
            .into_iter()
            .filter(|(_, b, a)| b != a)
            .map(|(field, before, after)| FieldChange { field, before, after })
            .collect()
    }
}

fn render<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// Entry contents before an id and timestamp are assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    action: ChangeAction,
    person_id: PersonId,
    person_name: String,
    before_state: Option<PersonSnapshot>,
    after_state: Option<PersonSnapshot>,
    description: Option<String>,
}

impl PendingEntry {
    pub fn new(action: ChangeAction, person_id: &str, person_name: &str) -> Self {
        Self {
            action,
            person_id: String::from(person_id),
            person_name: String::from(person_name),
            before_state: None,
            after_state: None,
            description: None,
        }
    }

    pub fn before(mut self, state: PersonSnapshot) -> Self {
        self.before_state = Some(state);
        self
    }

    pub fn after(mut self, state: PersonSnapshot) -> Self {
        self.after_state = Some(state);
        self
    }

    /// Override the default `"<ACTION> operation on <name>"` text
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// Append-only, ordered change log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeLog {
    entries: Vec<Arc<ChangeLogEntry>>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// New log with `pending` appended as the newest entry
    pub fn record(&self, pending: PendingEntry, ids: &mut IdClock) -> ChangeLog {
        let mut next = self.clone();
        next.append(pending, ids);
        next
    }

    /// Append `pending` to this log in place
    pub fn append(&mut self, pending: PendingEntry, ids: &mut IdClock) {
        let description = pending.description.unwrap_or_else(|| {
            format!("{} operation on {}", pending.action, pending.person_name)
        });
        self.entries.push(Arc::new(ChangeLogEntry {
            id: ids.next_entry_id(),
            timestamp: Utc::now(),
            action: pending.action,
            person_id: pending.person_id,
            person_name: pending.person_name,
            before_state: pending.before_state,
            after_state: pending.after_state,
            description,
        }));
    }

    /// Entries about one record, oldest first
    pub fn entries_for(&self, person_id: &str) -> Vec<&ChangeLogEntry> {
        self.iter().filter(|e| e.person_id == person_id).collect()
    }

    /// An empty log; all history is discarded
    pub fn clear(&self) -> ChangeLog {
        ChangeLog::new()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeLogEntry> {
        self.entries.iter().map(|e| e.as_ref())
    }

    pub fn entries(&self) -> &[Arc<ChangeLogEntry>] {
        &self.entries
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&ChangeLogEntry> {
        self.entries.last().map(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
