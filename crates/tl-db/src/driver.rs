//! Migration driver
//!
//! Turns a version delta into ordered script executions against one opened
//! backend. Every backend call runs under the caller's [`Deadline`].

use crate::error::{DbError, DbResult};
use crate::traits::{Connector, MigrationBackend};
use std::future::Future;
use tl_core::{ConnectionDescriptor, Deadline, Direction, MigrationScript, MigrationSet, MigrationTable};

/// Executes up/down migrations over an opened backend.
///
/// A driver owns its backend for the duration of one lifecycle operation.
/// Callers release it with [`finish`](Self::finish) on every exit path;
/// dropping the driver releases the handle as a backstop.
pub struct MigrationDriver {
    backend: Box<dyn MigrationBackend>,
}

async fn bounded<T, F>(deadline: &Deadline, operation: &str, fut: F) -> DbResult<T>
where
    F: Future<Output = DbResult<T>>,
{
    deadline
        .run(fut)
        .await
        .map_err(|e| DbError::DeadlineExceeded {
            budget: e.budget,
            operation: operation.to_string(),
        })?
}

impl MigrationDriver {
    pub fn new(backend: Box<dyn MigrationBackend>) -> Self {
        Self { backend }
    }

    /// Open a backend for `descriptor` through `connector`.
    pub async fn open(
        connector: &dyn Connector,
        descriptor: &ConnectionDescriptor,
        deadline: &Deadline,
    ) -> DbResult<Self> {
        log::debug!("Connecting to {}", descriptor.redacted());
        let backend = bounded(deadline, "connect", connector.open(descriptor)).await?;
        Ok(Self::new(backend))
    }

    pub fn db_type(&self) -> &'static str {
        self.backend.db_type()
    }

    /// Applied version recorded in `table`. Read-only.
    pub async fn current_version(&self, table: &MigrationTable, deadline: &Deadline) -> DbResult<i64> {
        bounded(deadline, "current_version", self.backend.current_version(table)).await
    }

    /// Apply every pending script in `set`.
    pub async fn up(&self, table: &MigrationTable, set: &MigrationSet, deadline: &Deadline) -> DbResult<i64> {
        let max = set.max_version().unwrap_or(0);
        self.up_to(table, set, max, deadline).await
    }

    /// Apply pending scripts ascending until `version` is reached.
    ///
    /// Stops at the first failing script; the scripts before it stay applied.
    /// Returns the applied version afterwards.
    pub async fn up_to(
        &self,
        table: &MigrationTable,
        set: &MigrationSet,
        version: i64,
        deadline: &Deadline,
    ) -> DbResult<i64> {
        bounded(deadline, "ensure_version_table", self.backend.ensure_version_table(table)).await?;
        let current = self.current_version(table, deadline).await?;
        if current >= version {
            log::debug!("{} already at version {} (requested {})", table, current, version);
            return Ok(current);
        }

        let mut applied = current;
        for script in set.pending(current, version) {
            self.apply(table, script, Direction::Up, deadline).await?;
            applied = script.version;
        }
        Ok(applied)
    }

    /// Revert applied scripts descending until the applied version is at or
    /// below `version`. `0` reverts everything.
    pub async fn down_to(
        &self,
        table: &MigrationTable,
        set: &MigrationSet,
        version: i64,
        deadline: &Deadline,
    ) -> DbResult<i64> {
        let mut current = self.current_version(table, deadline).await?;
        if current <= version {
            log::debug!("{} already at version {} (requested {})", table, current, version);
            return Ok(current);
        }

        while current > version {
            let script = set
                .get(current)
                .ok_or(DbError::MissingMigration { version: current })?;
            self.apply(table, script, Direction::Down, deadline).await?;

            let next = self.current_version(table, deadline).await?;
            if next >= current {
                return Err(DbError::ExecutionError(format!(
                    "reverting {} did not lower the applied version",
                    script.identifier
                )));
            }
            current = next;
        }
        Ok(current)
    }

    async fn apply(
        &self,
        table: &MigrationTable,
        script: &MigrationScript,
        direction: Direction,
        deadline: &Deadline,
    ) -> DbResult<()> {
        log::info!("Applying {} ({})", script.identifier, direction);
        let result = bounded(deadline, &script.identifier, self.backend.apply(table, script, direction)).await;
        match result {
            Ok(()) => Ok(()),
            Err(err @ DbError::DeadlineExceeded { .. }) => Err(err),
            Err(err) => Err(DbError::MigrationScriptFailure {
                version: script.version,
                identifier: script.identifier.clone(),
                direction,
                message: err.to_string(),
            }),
        }
    }

    /// Release the backend connection.
    pub async fn close(self) -> DbResult<()> {
        self.backend.close().await
    }

    /// Close the connection and pass `result` through.
    ///
    /// A close failure is only reported when `result` is `Ok`; otherwise it
    /// is logged and the original error wins.
    pub async fn finish<T>(self, result: DbResult<T>) -> DbResult<T> {
        let closed = self.close().await;
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                log::warn!("Failed to close connection after error: {}", close_err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
