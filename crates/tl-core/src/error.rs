//! Error types for tl-core

use thiserror::Error;

/// Core error type for Tideline
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Requested target version is negative
    #[error("[C003] Invalid target version {target}: must not be negative")]
    InvalidTarget { target: i64 },

    /// C004: Requested target version is above every known migration
    #[error("[C004] Target version {target} exceeds the highest available migration version {max}")]
    TargetExceedsAvailable { target: i64, max: i64 },

    /// C005: Migration file could not be interpreted
    #[error("[C005] Malformed migration '{path}': {reason}")]
    MalformedMigration { path: String, reason: String },

    /// C006: Two migration files share a version
    #[error("[C006] Duplicate migration version {version}: '{first}' and '{second}'")]
    DuplicateMigrationVersion {
        version: i64,
        first: String,
        second: String,
    },

    /// C007: Migrations directory missing or not a directory
    #[error("[C007] Migrations directory '{path}' {reason}")]
    InvalidMigrationsDir { path: String, reason: String },

    /// C008: Duration string could not be parsed
    #[error("[C008] Invalid duration '{value}': expected forms like '30s', '20m' or '1h30m'")]
    InvalidDuration { value: String },

    /// C009: Connection descriptor could not be parsed
    #[error("[C009] Invalid connection descriptor: {reason}")]
    InvalidDescriptor { reason: String },

    /// C010: IO error
    #[error("[C010] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// C011: IO error with file path context
    #[error("[C011] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C012: YAML parse error
    #[error("[C012] Config parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
