//! Resource model: desired, resolved and reconciled state of a migration resource.

use crate::connection::ConnectionDescriptor;
use crate::names::{MigrationTable, ResourceName};
use crate::serde_helpers::opt_duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Timeout applied to a lifecycle operation when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Lifecycle operation kinds, used to pick a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Per-operation timeout overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceTimeouts {
    #[serde(default, with = "opt_duration", skip_serializing_if = "Option::is_none")]
    pub create: Option<Duration>,

    #[serde(default, with = "opt_duration", skip_serializing_if = "Option::is_none")]
    pub read: Option<Duration>,

    #[serde(default, with = "opt_duration", skip_serializing_if = "Option::is_none")]
    pub update: Option<Duration>,

    #[serde(default, with = "opt_duration", skip_serializing_if = "Option::is_none")]
    pub delete: Option<Duration>,
}

impl ResourceTimeouts {
    /// Configured timeout for `operation`, or [`DEFAULT_TIMEOUT`].
    pub fn for_operation(&self, operation: Operation) -> Duration {
        let configured = match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        };
        configured.unwrap_or(DEFAULT_TIMEOUT)
    }
}

/// What the operator asked for: a directory and an optional target.
///
/// Built once per plan/apply cycle and not changed during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    pub migrations_dir: PathBuf,
    pub target_version: Option<i64>,
}

/// Output of version resolution. Derived, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedState {
    /// `None` when the directory holds no migrations and no target was given
    pub resolved_version: Option<i64>,

    /// Identifiers of scripts with version <= `resolved_version`, ascending
    pub migrations: Vec<String>,
}

/// Persisted state of one reconciled migration resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledResource {
    /// Resource name within the project
    pub name: ResourceName,

    /// Database endpoint (`host:port`)
    pub endpoint: String,

    /// Database path, e.g. `/ru-central1/b1g.../etn...`
    pub database: String,

    /// TLS flag; `None` means enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_enabled: Option<bool>,

    /// Bookkeeping table; immutable once the resource exists
    #[serde(default)]
    pub migration_table: MigrationTable,

    /// Migrations directory (absolute)
    pub migrations_dir: PathBuf,

    /// Explicit target version, if configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version: Option<i64>,

    /// Version applied in the backend
    pub applied_version: i64,

    /// Migration identifiers covered by `applied_version`
    #[serde(default)]
    pub migrations: Vec<String>,

    /// Per-operation timeout overrides
    #[serde(default)]
    pub timeouts: ResourceTimeouts,
}

impl ReconciledResource {
    /// The desired-state inputs recorded in this resource.
    pub fn desired(&self) -> DesiredState {
        DesiredState {
            migrations_dir: self.migrations_dir.clone(),
            target_version: self.target_version,
        }
    }

    /// Connection descriptor for this resource's database, authenticated with `token`.
    pub fn descriptor(&self, token: &str) -> ConnectionDescriptor {
        ConnectionDescriptor::build(&self.endpoint, &self.database, token, self.tls_enabled)
    }

    /// Timeout for a lifecycle operation on this resource.
    pub fn timeout(&self, operation: Operation) -> Duration {
        self.timeouts.for_operation(operation)
    }
}
