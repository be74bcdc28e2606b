//! Strongly-typed names used across resources.

use crate::newtype_string::define_newtype_string;

/// Bookkeeping table used when a resource does not name one.
pub const DEFAULT_MIGRATION_TABLE: &str = "goose_db_version";

define_newtype_string! {
    /// A non-empty resource name, unique within a project.
    pub struct ResourceName;
}

define_newtype_string! {
    /// Name of the backend table recording which migration versions are applied.
    ///
    /// Passed explicitly to every driver and backend call; there is no
    /// process-wide table selection.
    pub struct MigrationTable;
}

impl Default for MigrationTable {
    fn default() -> Self {
        Self::new(DEFAULT_MIGRATION_TABLE)
    }
}
