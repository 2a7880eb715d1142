//! Error taxonomy
//!
//! Lookups that miss are not errors (`Option`), with one exception:
//! updating a record that does not exist is a caller error and surfaces
//! as [`StoreError::NotFound`]. Deleting a missing record is a no-op.
//!
//! Author: Moroya Sakamoto

use thiserror::Error;

use crate::person::PersonId;

/// Result type for store commands
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors returned by store commands
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("person not found: {0}")]
    NotFound(PersonId),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Input rejected before any mutation or audit entry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("name must not be empty")]
    EmptyName,

    #[error("age must not be negative, got {0}")]
    NegativeAge(i64),

    #[error("age {0} is out of range")]
    AgeOutOfRange(i64),

    #[error("unknown status `{0}` (expected `active` or `inactive`)")]
    UnknownStatus(String),

    #[error("duplicate person id `{0}`")]
    DuplicateId(PersonId),

    #[error("person id `{0}` is reserved for bulk changes")]
    ReservedId(PersonId),
}

/// Store configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
