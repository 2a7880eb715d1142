//! Copy-on-write forest edits
//!
//! Every edit takes a forest by reference and returns a new one. The
//! records on the path from the affected root down to the target are
//! rebuilt; every other branch is shared with the input by `Arc` clone,
//! so a caller holding the old forest never observes a change.
//!
//! Targets are resolved with [`traverse::locate`], i.e. the first match
//! in pre-order.
//!
//! Author: Moroya Sakamoto

use std::sync::Arc;

use crate::error::{Result, StoreError};
use crate::ids::IdClock;
use crate::person::{Forest, Person, PersonDraft};
use crate::traverse;

/// Append a new root built from `draft`
///
/// The record and every child in the draft get fresh ids. Returns the new
/// forest and the inserted record.
pub fn insert_root(
    forest: &Forest,
    draft: PersonDraft,
    ids: &mut IdClock,
) -> (Forest, Arc<Person>) {
    let person = Arc::new(assign_ids(draft, forest, ids));
    let mut roots = forest.roots().to_vec();
    roots.push(Arc::clone(&person));
    (Forest::from_roots(roots), person)
}

/// Substitute the whole subtree rooted at `target_id`
///
/// `replacement` is inserted as given, children included.
pub fn replace(
    forest: &Forest,
    target_id: &str,
    replacement: impl Into<Arc<Person>>,
) -> Result<Forest> {
    let address = traverse::locate(forest, target_id)
        .ok_or_else(|| StoreError::NotFound(String::from(target_id)))?;
    let roots = rebuild(forest.roots(), &address, Edit::Replace(replacement.into()));
    Ok(Forest::from_roots(roots))
}

/// Drop the record `target_id` and its whole subtree
///
/// A missing id returns an equal forest; deletion is idempotent.
pub fn remove_by_id(forest: &Forest, target_id: &str) -> Forest {
    match traverse::locate(forest, target_id) {
        Some(address) => Forest::from_roots(rebuild(forest.roots(), &address, Edit::Remove)),
        None => forest.clone(),
    }
}

/// Updated copy of `existing` carrying the draft's fields
///
/// The id is kept. Existing children are kept unless the draft supplies
/// its own, in which case those are new records with fresh ids.
pub fn apply_fields(
    existing: &Person,
    draft: PersonDraft,
    taken: &Forest,
    ids: &mut IdClock,
) -> Person {
    let children = match draft.children {
        Some(kids) => Some(
            kids.into_iter()
                .map(|kid| Arc::new(assign_ids(kid, taken, ids)))
                .collect(),
        ),
        None => existing.children.clone(),
    };
    Person {
        id: existing.id.clone(),
        name: draft.name,
        age: draft.age,
        status: draft.status,
        children,
    }
}

/// Materialize a draft subtree, giving every record an id not in `taken`
pub fn assign_ids(draft: PersonDraft, taken: &Forest, ids: &mut IdClock) -> Person {
    let id = ids.next_person_id(taken);
    let children = draft.children.map(|kids| {
        kids.into_iter()
            .map(|kid| Arc::new(assign_ids(kid, taken, ids)))
            .collect()
    });
    Person {
        id,
        name: draft.name,
        age: draft.age,
        status: draft.status,
        children,
    }
}

enum Edit {
    Replace(Arc<Person>),
    Remove,
}

fn rebuild(nodes: &[Arc<Person>], address: &[usize], edit: Edit) -> Vec<Arc<Person>> {
    let mut out = nodes.to_vec();
    let Some((&idx, rest)) = address.split_first() else {
        return out;
    };

    if rest.is_empty() {
        match edit {
            Edit::Replace(person) => out[idx] = person,
            Edit::Remove => {
                out.remove(idx);
            }
        }
    } else {
        let parent = &nodes[idx];
        out[idx] = Arc::new(Person {
            id: parent.id.clone(),
            name: parent.name.clone(),
            age: parent.age,
            status: parent.status,
            children: Some(rebuild(parent.children(), rest, edit)),
        });
    }
    out
}
