//! tl-db - Migration execution layer for Tideline
//!
//! This crate provides the `MigrationBackend` and `Connector` traits, a DuckDB
//! implementation of both, and the `MigrationDriver` that turns a version
//! delta into ordered up/down script executions.

pub mod driver;
pub mod duckdb;
pub mod error;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use driver::MigrationDriver;
pub use duckdb::{DuckDbBackend, DuckDbConnector};
pub use error::{DbError, DbResult};
pub use traits::{Connector, MigrationBackend};
