//! tl-core - Core library for Tideline
//!
//! This crate provides migration script discovery, target version resolution,
//! connection descriptors, configuration parsing and the persisted resource
//! state used across all Tideline components.

pub mod config;
pub mod connection;
pub mod deadline;
pub mod error;
pub mod migration;
pub mod names;
mod newtype_string;
pub mod resource;
pub mod serde_helpers;
pub mod state;
pub mod validator;
pub mod version;

pub use config::{Config, ProviderConfig, ResourceConfig};
pub use connection::{build_connection_string, ConnectionDescriptor, Scheme};
pub use deadline::{Deadline, DeadlineExceeded};
pub use error::{CoreError, CoreResult};
pub use migration::{Direction, MigrationScript, MigrationSet};
pub use names::{MigrationTable, ResourceName};
pub use resource::{
    DesiredState, Operation, ReconciledResource, ResolvedState, ResourceTimeouts, DEFAULT_TIMEOUT,
};
pub use state::StateStore;
pub use version::{resolve, resolve_dir, resolve_migration_list, resolve_set, resolve_target};
