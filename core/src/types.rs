//! Shared primitive types used across the generator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A master seed for one generator run.
pub type Seed = u64;

/// The three raw record sets produced for one simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordCategory {
    User,
    UserPreference,
    Transaction,
}

impl RecordCategory {
    pub const ALL: [RecordCategory; 3] = [
        RecordCategory::User,
        RecordCategory::UserPreference,
        RecordCategory::Transaction,
    ];

    /// Warehouse table name for this record set.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::User           => "users",
            Self::UserPreference => "user_preferences",
            Self::Transaction    => "transactions",
        }
    }

    /// Local file the record set is written to before upload.
    pub fn raw_file_name(&self) -> String {
        format!("raw_{}.csv", self.table_name())
    }
}

impl fmt::Display for RecordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Inclusive integer range read from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u64,
    pub max: u64,
}

impl CountRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}
