//! Identifier generation
//!
//! Ids are derived from the UTC wall clock in milliseconds and bumped
//! past the previously issued value, so they stay strictly increasing
//! when several are issued within one millisecond or the clock steps
//! backwards. Person ids additionally skip anything already present in
//! the forest (seeded or bulk-loaded records may carry arbitrary ids).
//!
//! Author: Moroya Sakamoto

use chrono::Utc;

use crate::person::{Forest, PersonId};

/// Monotonic, timestamp-derived id source
#[derive(Debug, Clone, Default)]
pub struct IdClock {
    last: u64,
}

impl IdClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock whose next id is strictly greater than `last`
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    /// Next raw id: max(now in ms, previous + 1)
    pub fn next(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let next = now.max(self.last.saturating_add(1));
        self.last = next;
        next
    }

    /// Most recently issued id, 0 before the first call
    pub fn last(&self) -> u64 {
        self.last
    }

    /// Fresh person id not present anywhere in `taken`
    pub fn next_person_id(&mut self, taken: &Forest) -> PersonId {
        loop {
            let id = self.next().to_string();
            if !taken.contains(&id) {
                return id;
            }
        }
    }

    /// Fresh change-log entry id
    pub fn next_entry_id(&mut self) -> String {
        self.next().to_string()
    }
}
