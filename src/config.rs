//! Store configuration
//!
//! Settings for how a [`PersonStore`](crate::store::PersonStore) starts
//! up and how it labels whole-forest changes in the audit log.
//!
//! Author: Moroya Sakamoto

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default `person_id` recorded for bulk replacements
pub const DEFAULT_BULK_PERSON_ID: &str = "*";

/// Default `person_name` recorded for bulk replacements
pub const DEFAULT_BULK_PERSON_NAME: &str = "All records";

/// Configuration for a person store
///
/// - Demo: seed the forest with the sample family
/// - Empty: start with no records (tests, embedding)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Start with [`sample_forest`](crate::sample::sample_forest) instead
    /// of an empty forest. Seeding writes no audit entries.
    pub seed_sample_data: bool,

    /// Sentinel `person_id` for entries that describe the whole forest
    pub bulk_person_id: String,

    /// `person_name` paired with the bulk sentinel
    pub bulk_person_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed_sample_data: false,
            bulk_person_id: String::from(DEFAULT_BULK_PERSON_ID),
            bulk_person_name: String::from(DEFAULT_BULK_PERSON_NAME),
        }
    }
}

impl StoreConfig {
    /// Empty store with default labels
    pub fn empty() -> Self {
        Self::default()
    }

    /// Store seeded with the demo family
    pub fn demo() -> Self {
        Self {
            seed_sample_data: true,
            ..Self::default()
        }
    }

    /// Parse from TOML; missing keys take their defaults
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }
}
