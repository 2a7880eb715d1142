//! Demo data
//!
//! The two-family forest the roster application starts with.
//!
//! Author: Moroya Sakamoto

use crate::person::{Forest, Person, Status};

/// John (Alice, Bob) and Sara (Charlie)
pub fn sample_forest() -> Forest {
    Forest::from(vec![
        Person::new("1", "John", 30, Status::Active).with_children(vec![
            Person::new("1-1", "Alice", 25, Status::Active),
            Person::new("1-2", "Bob", 28, Status::Inactive),
        ]),
        Person::new("2", "Sara", 25, Status::Inactive)
            .with_children(vec![Person::new("2-1", "Charlie", 22, Status::Active)]),
    ])
}
