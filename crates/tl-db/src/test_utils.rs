//! Shared test utilities for tl-db
//!
//! `MemoryConnector` hands out backends that share one in-memory store and
//! record every call, so tests can assert exactly which operations ran.

use crate::error::{DbError, DbResult};
use crate::traits::{Connector, MigrationBackend};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tl_core::{ConnectionDescriptor, Direction, MigrationScript, MigrationTable};

/// One recorded backend interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open { address: String },
    EnsureTable { table: String },
    CurrentVersion { table: String },
    Apply { table: String, version: i64, direction: Direction },
    Close,
}

#[derive(Debug, Default)]
struct Store {
    applied: HashMap<String, Vec<i64>>,
    calls: Vec<Call>,
    fail_on: Option<(i64, Direction)>,
    fail_open: Option<String>,
    apply_delay: Option<Duration>,
}

/// Connector over a shared in-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    store: Arc<Mutex<Store>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make applying `version` in `direction` fail
    pub fn fail_on(&self, version: i64, direction: Direction) {
        self.store.lock().unwrap().fail_on = Some((version, direction));
    }

    /// Make every `open` fail with `message`
    pub fn fail_open(&self, message: &str) {
        self.store.lock().unwrap().fail_open = Some(message.to_string());
    }

    /// Sleep this long inside every `apply`
    pub fn delay_apply(&self, delay: Duration) {
        self.store.lock().unwrap().apply_delay = Some(delay);
    }

    /// Pretend `versions` were applied out of band
    pub fn set_applied(&self, table: &str, versions: &[i64]) {
        self.store
            .lock()
            .unwrap()
            .applied
            .insert(table.to_string(), versions.to_vec());
    }

    /// Highest applied version in `table`
    pub fn applied_version(&self, table: &str) -> i64 {
        let store = self.store.lock().unwrap();
        store
            .applied
            .get(table)
            .and_then(|v| v.iter().max().copied())
            .unwrap_or(0)
    }

    /// Every call recorded so far
    pub fn calls(&self) -> Vec<Call> {
        self.store.lock().unwrap().calls.clone()
    }

    /// Only the `Apply` calls, as `(version, direction)`
    pub fn applied_calls(&self) -> Vec<(i64, Direction)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Apply {
                    version, direction, ..
                } => Some((version, direction)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&self) {
        self.store.lock().unwrap().calls.clear();
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(&self, descriptor: &ConnectionDescriptor) -> DbResult<Box<dyn MigrationBackend>> {
        let mut store = self.store.lock().unwrap();
        store.calls.push(Call::Open {
            address: descriptor.address(),
        });
        if let Some(message) = &store.fail_open {
            return Err(DbError::ConnectionFailure(message.clone()));
        }
        Ok(Box::new(MemoryBackend {
            store: Arc::clone(&self.store),
            closed: Mutex::new(false),
        }))
    }
}

/// Backend handed out by [`MemoryConnector`]
#[derive(Debug)]
pub struct MemoryBackend {
    store: Arc<Mutex<Store>>,
    closed: Mutex<bool>,
}

impl MemoryBackend {
    fn check_open(&self) -> DbResult<()> {
        if *self.closed.lock().unwrap() {
            return Err(DbError::ConnectionClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl MigrationBackend for MemoryBackend {
    async fn ensure_version_table(&self, table: &MigrationTable) -> DbResult<()> {
        self.check_open()?;
        let mut store = self.store.lock().unwrap();
        store.calls.push(Call::EnsureTable {
            table: table.to_string(),
        });
        store.applied.entry(table.to_string()).or_default();
        Ok(())
    }

    async fn current_version(&self, table: &MigrationTable) -> DbResult<i64> {
        self.check_open()?;
        let mut store = self.store.lock().unwrap();
        store.calls.push(Call::CurrentVersion {
            table: table.to_string(),
        });
        Ok(store
            .applied
            .get(table.as_str())
            .and_then(|v| v.iter().max().copied())
            .unwrap_or(0))
    }

    async fn apply(
        &self,
        table: &MigrationTable,
        script: &MigrationScript,
        direction: Direction,
    ) -> DbResult<()> {
        self.check_open()?;
        let delay = {
            let mut store = self.store.lock().unwrap();
            store.calls.push(Call::Apply {
                table: table.to_string(),
                version: script.version,
                direction,
            });
            if store.fail_on == Some((script.version, direction)) {
                return Err(DbError::ExecutionError(format!(
                    "injected failure in {}",
                    script.identifier
                )));
            }
            store.apply_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut store = self.store.lock().unwrap();
        let applied = store.applied.entry(table.to_string()).or_default();
        match direction {
            Direction::Up => applied.push(script.version),
            Direction::Down => applied.retain(|v| *v != script.version),
        }
        Ok(())
    }

    async fn close(&self) -> DbResult<()> {
        *self.closed.lock().unwrap() = true;
        self.store.lock().unwrap().calls.push(Call::Close);
        Ok(())
    }

    fn db_type(&self) -> &'static str {
        "memory"
    }
}

/// Build a set of trivial scripts with the given versions
pub fn scripts(versions: &[i64]) -> tl_core::MigrationSet {
    let scripts = versions
        .iter()
        .map(|v| {
            MigrationScript::from_source(
                &format!("{v:05}_step_{v}.sql"),
                "-- +goose Up\nSELECT 1;\n-- +goose Down\nSELECT 1;\n",
            )
            .unwrap()
        })
        .collect();
    tl_core::MigrationSet::from_scripts(scripts).unwrap()
}
