//! Forest traversal
//!
//! Read-only searches over a [`Forest`]. Every function walks depth-first
//! in pre-order: roots in order, each root's children before the next
//! root. When an id occurs more than once (which the store never
//! produces) the first record in that order wins, and the mutation
//! engine resolves targets through [`locate`] so it agrees.
//!
//! Author: Moroya Sakamoto

use std::collections::HashSet;
use std::sync::Arc;

use crate::person::{Forest, Person, PersonId};

/// Find a record anywhere in the forest
pub fn find_by_id<'a>(forest: &'a Forest, id: &str) -> Option<&'a Arc<Person>> {
    find_in(forest.roots(), id)
}

fn find_in<'a>(nodes: &'a [Arc<Person>], id: &str) -> Option<&'a Arc<Person>> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_in(node.children(), id) {
            return Some(found);
        }
    }
    None
}

/// Ancestors of `id` from its root down to the record itself
///
/// The target is always the last element.
pub fn find_path(forest: &Forest, id: &str) -> Option<Vec<Arc<Person>>> {
    let mut path = Vec::new();
    if path_in(forest.roots(), id, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn path_in(nodes: &[Arc<Person>], id: &str, path: &mut Vec<Arc<Person>>) -> bool {
    for node in nodes {
        path.push(Arc::clone(node));
        if node.id == id || path_in(node.children(), id, path) {
            return true;
        }
        path.pop();
    }
    false
}

/// Positional address of `id`: root index, then child index at each level
pub fn locate(forest: &Forest, id: &str) -> Option<Vec<usize>> {
    let mut address = Vec::new();
    if locate_in(forest.roots(), id, &mut address) {
        Some(address)
    } else {
        None
    }
}

fn locate_in(nodes: &[Arc<Person>], id: &str, address: &mut Vec<usize>) -> bool {
    for (i, node) in nodes.iter().enumerate() {
        address.push(i);
        if node.id == id || locate_in(node.children(), id, address) {
            return true;
        }
        address.pop();
    }
    false
}

pub fn contains(forest: &Forest, id: &str) -> bool {
    find_by_id(forest, id).is_some()
}

/// Total records at every depth
pub fn count(forest: &Forest) -> usize {
    walk(forest).count()
}

/// Ids of a record and all its descendants, pre-order
pub fn collect_ids(person: &Person) -> Vec<PersonId> {
    let mut ids = Vec::new();
    collect_into(person, &mut ids);
    ids
}

fn collect_into(person: &Person, ids: &mut Vec<PersonId>) {
    ids.push(person.id.clone());
    for child in person.children() {
        collect_into(child, ids);
    }
}

/// First id (in pre-order) that occurs more than once
pub fn first_duplicate_id(forest: &Forest) -> Option<PersonId> {
    let mut seen: HashSet<&str> = HashSet::new();
    for person in walk(forest) {
        if !seen.insert(person.id.as_str()) {
            return Some(person.id.clone());
        }
    }
    None
}

/// Pre-order iterator over every record in a forest
pub struct Walk<'a> {
    stack: Vec<&'a Arc<Person>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Arc<Person>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

pub fn walk(forest: &Forest) -> Walk<'_> {
    Walk {
        stack: forest.roots().iter().rev().collect(),
    }
}
