//! DuckDB migration backend
//!
//! Used for local development and tests. The bookkeeping table mirrors the
//! layout remote backends use: one row per applied version plus a version-0
//! baseline row written when the table is created.
//!
//! Every call runs on tokio's blocking pool so a caller's deadline can fire
//! while a script is still executing.

use crate::error::{DbError, DbResult};
use crate::traits::{Connector, MigrationBackend};
use async_trait::async_trait;
use duckdb::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tl_core::{ConnectionDescriptor, Direction, MigrationScript, MigrationTable};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Arc<Mutex<Option<Connection>>>,
}

/// Quote an identifier, doubling embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn run_statements(conn: &Connection, script: &MigrationScript, direction: Direction) -> DbResult<()> {
    for statement in script.statements(direction) {
        conn.execute_batch(statement)
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, statement)))?;
    }
    Ok(())
}

fn record(
    conn: &Connection,
    table: &MigrationTable,
    version: i64,
    direction: Direction,
) -> DbResult<()> {
    let table = quote_ident(table);
    match direction {
        Direction::Up => conn.execute(
            &format!("INSERT INTO {table} (version_id, is_applied) VALUES (?, TRUE)"),
            params![version],
        ),
        Direction::Down => conn.execute(
            &format!("DELETE FROM {table} WHERE version_id = ?"),
            params![version],
        ),
    }
    .map_err(|e| DbError::ExecutionError(format!("failed to record version {version}: {e}")))?;
    Ok(())
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionFailure(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionFailure(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Run `f` against the open connection on the blocking pool.
    ///
    /// A caller that stops waiting does not stop `f`; the connection stays
    /// locked until it returns.
    async fn with_conn<T, F>(&self, f: F) -> DbResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> DbResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
            let conn = guard.as_mut().ok_or(DbError::ConnectionClosed)?;
            f(conn)
        })
        .await
        .map_err(|e| DbError::ExecutionError(format!("DuckDB task failed: {e}")))?
    }

    fn table_exists(conn: &Connection, table: &MigrationTable) -> DbResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            params![table.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[async_trait]
impl MigrationBackend for DuckDbBackend {
    async fn ensure_version_table(&self, table: &MigrationTable) -> DbResult<()> {
        let table = table.clone();
        self.with_conn(move |conn| {
            if Self::table_exists(conn, &table)? {
                return Ok(());
            }
            log::debug!("Creating bookkeeping table {}", table);
            let quoted = quote_ident(&table);
            conn.execute_batch(&format!(
                "CREATE TABLE {quoted} (
                     version_id BIGINT NOT NULL,
                     is_applied BOOLEAN NOT NULL,
                     tstamp     TIMESTAMP NOT NULL DEFAULT now()
                 );
                 INSERT INTO {quoted} (version_id, is_applied) VALUES (0, TRUE);"
            ))?;
            Ok(())
        })
        .await
    }

    async fn current_version(&self, table: &MigrationTable) -> DbResult<i64> {
        let table = table.clone();
        self.with_conn(move |conn| {
            if !Self::table_exists(conn, &table)? {
                return Ok(0);
            }
            let version: i64 = conn.query_row(
                &format!(
                    "SELECT COALESCE(MAX(version_id), 0) FROM {} WHERE is_applied",
                    quote_ident(&table)
                ),
                [],
                |row| row.get(0),
            )?;
            Ok(version)
        })
        .await
    }

    async fn apply(
        &self,
        table: &MigrationTable,
        script: &MigrationScript,
        direction: Direction,
    ) -> DbResult<()> {
        let table = table.clone();
        let script = script.clone();
        self.with_conn(move |conn| {
            if !script.use_transaction {
                run_statements(conn, &script, direction)?;
                return record(conn, &table, script.version, direction);
            }

            // Dropping the transaction without commit rolls it back.
            let tx = conn.transaction()?;
            run_statements(&tx, &script, direction)?;
            record(&tx, &table, script.version, direction)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn close(&self) -> DbResult<()> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
            match guard.take() {
                Some(conn) => conn
                    .close()
                    .map_err(|(_, e)| DbError::ExecutionError(format!("failed to close: {e}"))),
                None => Ok(()),
            }
        })
        .await
        .map_err(|e| DbError::ExecutionError(format!("DuckDB task failed: {e}")))?
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

/// Opens DuckDB backends for connection descriptors.
///
/// With a data directory, each `<endpoint><database>` maps to its own database
/// file under that directory, so successive opens of the same descriptor see
/// the same data. Without one, every open gets a fresh in-memory database.
/// The token is not used; DuckDB has no authentication.
#[derive(Debug, Clone, Default)]
pub struct DuckDbConnector {
    data_dir: Option<PathBuf>,
}

impl DuckDbConnector {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
        }
    }

    pub fn in_memory() -> Self {
        Self { data_dir: None }
    }

    /// Database file a descriptor maps to, `None` for in-memory connectors.
    pub fn database_path(&self, descriptor: &ConnectionDescriptor) -> Option<PathBuf> {
        let data_dir = self.data_dir.as_ref()?;
        let endpoint = descriptor.endpoint.replace([':', '/', '\\'], "_");
        let mut path = data_dir.join(endpoint);
        let segments: Vec<&str> = descriptor
            .database
            .split('/')
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .collect();
        if segments.is_empty() {
            path.push("default");
        } else {
            path.extend(segments);
        }
        path.set_extension("duckdb");
        Some(path)
    }
}

#[async_trait]
impl Connector for DuckDbConnector {
    async fn open(&self, descriptor: &ConnectionDescriptor) -> DbResult<Box<dyn MigrationBackend>> {
        log::debug!("Opening DuckDB backend for {}", descriptor.redacted());
        let backend = match self.database_path(descriptor) {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DbError::ConnectionFailure(format!("{}: {}", parent.display(), e))
                    })?;
                }
                DuckDbBackend::from_path(&path)?
            }
            None => DuckDbBackend::in_memory()?,
        };
        Ok(Box::new(backend))
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
