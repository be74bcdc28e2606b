//! Simple value validators applied while loading configuration.

use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Expand a leading `~` to the home directory. Other values, and `~` when
/// the home directory is unknown, are returned as given.
pub fn expand_home(value: &str) -> PathBuf {
    let rest = match value.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(value),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(value),
    }
}

/// Check that `path` exists and is a directory.
pub fn validate_dir(attribute: &str, path: &Path) -> CoreResult<()> {
    let meta = std::fs::metadata(path).map_err(|e| CoreError::ConfigInvalid {
        message: format!("{attribute}: path {:?} does not exist: {e}", path.display().to_string()),
    })?;
    if !meta.is_dir() {
        return Err(CoreError::ConfigInvalid {
            message: format!("{attribute}: path {:?} is not a directory", path.display().to_string()),
        });
    }
    Ok(())
}

/// Accept either an existing file path or inline JSON content.
///
/// Empty values are accepted; absence is checked elsewhere.
pub fn validate_path_or_json(attribute: &str, value: &str) -> CoreResult<()> {
    if value.is_empty() || expand_home(value).exists() {
        return Ok(());
    }
    serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(value)
        .map(|_| ())
        .map_err(|e| CoreError::ConfigInvalid {
            message: format!("{attribute}: value is neither an existing file nor valid JSON: {e}"),
        })
}
