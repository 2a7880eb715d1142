//! Person records
//!
//! Entity model for the roster. Each [`Person`] owns an ordered list of
//! children; a [`Forest`] is the ordered list of root records. Nodes sit
//! behind `Arc` so successive forest versions share every branch an edit
//! did not touch, while each version stays immutable.
//!
//! Author: Moroya Sakamoto

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::traverse;

/// Opaque, store-assigned person identifier
pub type PersonId = String;

/// Activity status of a person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Inactive,
}

impl Status {
    /// Every status, in display order
    pub const ALL: [Status; 2] = [Status::Active, Status::Inactive];

    /// Wire value (`active` / `inactive`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Status::Active),
            "inactive" => Ok(Status::Inactive),
            other => Err(ValidationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// A person record and its owned sub-tree
///
/// `children: None` is a leaf. `Some(vec![])` is kept distinct so that a
/// record round-trips exactly as it was supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub age: u32,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Arc<Person>>>,
}

impl Person {
    pub fn new(id: &str, name: &str, age: u32, status: Status) -> Self {
        Self {
            id: String::from(id),
            name: String::from(name),
            age,
            status,
            children: None,
        }
    }

    pub fn with_children(mut self, children: Vec<Person>) -> Self {
        self.children = Some(children.into_iter().map(Arc::new).collect());
        self
    }

    /// Children in order; empty for a leaf
    pub fn children(&self) -> &[Arc<Person>] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Snapshot of this record's own fields; no id, no children
    pub fn snapshot(&self) -> PersonSnapshot {
        PersonSnapshot {
            id: None,
            name: Some(self.name.clone()),
            age: Some(self.age),
            status: Some(self.status),
        }
    }
}

/// Partial view of a person, as captured in audit entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PersonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl PersonSnapshot {
    /// Same snapshot, tagged with the record's id
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(String::from(id));
        self
    }
}

/// Caller-supplied fields for create and update
///
/// Everything is optional so that missing input can be reported as a
/// [`ValidationError`] instead of failing at construction. `age` is
/// signed so negative input is representable and rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonFields {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub status: Option<Status>,
    pub children: Option<Vec<PersonFields>>,
}

impl PersonFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(String::from(name));
        self
    }

    pub fn with_age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_children(mut self, children: Vec<PersonFields>) -> Self {
        self.children = Some(children);
        self
    }

    /// Check required fields and domains, recursively through children
    pub fn validate(&self) -> Result<PersonDraft, ValidationError> {
        let name = self
            .name
            .as_deref()
            .ok_or(ValidationError::MissingField("name"))?;
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let age = self.age.ok_or(ValidationError::MissingField("age"))?;
        if age < 0 {
            return Err(ValidationError::NegativeAge(age));
        }
        let age = u32::try_from(age).map_err(|_| ValidationError::AgeOutOfRange(age))?;

        let status = self.status.ok_or(ValidationError::MissingField("status"))?;

        let children = match &self.children {
            Some(list) => Some(
                list.iter()
                    .map(PersonFields::validate)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        Ok(PersonDraft {
            name: String::from(name),
            age,
            status,
            children,
        })
    }
}

impl From<&Person> for PersonFields {
    /// Prefill an edit form; children are left untouched on update
    fn from(person: &Person) -> Self {
        Self {
            name: Some(person.name.clone()),
            age: Some(i64::from(person.age)),
            status: Some(person.status),
            children: None,
        }
    }
}

/// Validated person fields, not yet assigned an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonDraft {
    pub name: String,
    pub age: u32,
    pub status: Status,
    pub children: Option<Vec<PersonDraft>>,
}

/// Ordered sequence of independent person trees
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Forest {
    roots: Vec<Arc<Person>>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_roots(roots: Vec<Arc<Person>>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[Arc<Person>] {
        &self.roots
    }

    /// Number of root records
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of records at every depth
    pub fn record_count(&self) -> usize {
        traverse::count(self)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Arc<Person>> {
        traverse::find_by_id(self, id)
    }

    pub fn find_path(&self, id: &str) -> Option<Vec<Arc<Person>>> {
        traverse::find_path(self, id)
    }

    pub fn contains(&self, id: &str) -> bool {
        traverse::contains(self, id)
    }

    /// Pre-order walk over every record
    pub fn walk(&self) -> traverse::Walk<'_> {
        traverse::walk(self)
    }
}

impl From<Vec<Person>> for Forest {
    fn from(roots: Vec<Person>) -> Self {
        roots.into_iter().collect()
    }
}

impl FromIterator<Person> for Forest {
    fn from_iter<I: IntoIterator<Item = Person>>(iter: I) -> Self {
        Self {
            roots: iter.into_iter().map(Arc::new).collect(),
        }
    }
}
