//! Backend trait definitions

use crate::error::DbResult;
use async_trait::async_trait;
use tl_core::{ConnectionDescriptor, Direction, MigrationScript, MigrationTable};

/// The migration-execution primitive: applies or reverts one script and
/// reports the applied version.
///
/// The bookkeeping table is an argument of every call. Implementations must
/// not remember a "current" table between calls.
#[async_trait]
pub trait MigrationBackend: Send + Sync {
    /// Create the bookkeeping table if it does not exist yet
    async fn ensure_version_table(&self, table: &MigrationTable) -> DbResult<()>;

    /// Highest applied version, 0 when nothing is applied or the table is missing.
    /// Must not modify the database.
    async fn current_version(&self, table: &MigrationTable) -> DbResult<i64>;

    /// Run one script in `direction` and record the result in `table`
    async fn apply(
        &self,
        table: &MigrationTable,
        script: &MigrationScript,
        direction: Direction,
    ) -> DbResult<()>;

    /// Release the underlying connection. Further calls fail with `ConnectionClosed`.
    async fn close(&self) -> DbResult<()>;

    /// Backend type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Opens backends from connection descriptors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection to the database described by `descriptor`
    async fn open(&self, descriptor: &ConnectionDescriptor) -> DbResult<Box<dyn MigrationBackend>>;
}
