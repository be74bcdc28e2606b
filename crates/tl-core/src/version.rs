//! Target version resolution.
//!
//! Pure functions over a [`MigrationSet`]: they decide which version a
//! resource should converge to and which scripts that version covers. No
//! network or database access happens here.

use crate::error::{CoreError, CoreResult};
use crate::migration::MigrationSet;
use crate::resource::{DesiredState, ResolvedState};
use std::path::Path;

/// Resolve the version a resource should converge to.
///
/// Without a target this is the highest version in the set, or `None` for an
/// empty set. An explicit target must be non-negative and must not exceed the
/// highest known version; it may be lower, which plans a rollback.
pub fn resolve_target(set: &MigrationSet, target: Option<i64>) -> CoreResult<Option<i64>> {
    let Some(target) = target else {
        return Ok(set.max_version());
    };

    if target < 0 {
        return Err(CoreError::InvalidTarget { target });
    }

    let max = set.max_version().unwrap_or(0);
    if target > max {
        return Err(CoreError::TargetExceedsAvailable { target, max });
    }

    Ok(Some(target))
}

/// Identifiers of every script covered by the resolved target, ascending.
///
/// Purely descriptive; used to preview what a plan will apply.
pub fn resolve_migration_list(set: &MigrationSet, target: Option<i64>) -> CoreResult<Vec<String>> {
    let resolved = resolve_target(set, target)?;
    Ok(match resolved {
        Some(version) => set
            .iter()
            .take_while(|s| s.version <= version)
            .map(|s| s.identifier.clone())
            .collect(),
        None => Vec::new(),
    })
}

/// Resolve against an already-loaded set.
pub fn resolve_set(set: &MigrationSet, target: Option<i64>) -> CoreResult<ResolvedState> {
    Ok(ResolvedState {
        resolved_version: resolve_target(set, target)?,
        migrations: resolve_migration_list(set, target)?,
    })
}

/// Load `dir` and resolve it against `target`.
pub fn resolve_dir(dir: &Path, target: Option<i64>) -> CoreResult<ResolvedState> {
    let set = MigrationSet::load(dir)?;
    resolve_set(&set, target)
}

/// Load the desired directory fresh and resolve it.
pub fn resolve(desired: &DesiredState) -> CoreResult<(MigrationSet, ResolvedState)> {
    let set = MigrationSet::load(&desired.migrations_dir)?;
    let resolved = resolve_set(&set, desired.target_version)?;
    log::debug!(
        "Resolved {} to version {:?} ({} migrations)",
        desired.migrations_dir.display(),
        resolved.resolved_version,
        resolved.migrations.len()
    );
    Ok((set, resolved))
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
