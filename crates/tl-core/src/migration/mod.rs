//! Migration script discovery.
//!
//! A migrations directory holds files named `<version>_<description>.sql`.
//! The directory is the sole source of truth for which versions exist; it is
//! re-read on every call and never cached.

mod parser;

pub use parser::{parse_script, ParsedScript};

use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

const MIGRATION_EXTENSION: &str = "sql";

/// Direction in which a migration script is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Forward ("up") migration
    Up,
    /// Reverse ("down") migration
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// A single versioned migration script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    /// Version parsed from the file name prefix (always > 0)
    pub version: i64,

    /// File name, e.g. `00003_add_index.sql`
    pub identifier: String,

    /// Location of the script on disk
    pub path: PathBuf,

    /// Statements of the forward migration
    pub up: Vec<String>,

    /// Statements of the reverse migration
    pub down: Vec<String>,

    /// Whether the script runs inside a transaction
    pub use_transaction: bool,
}

impl MigrationScript {
    /// Build a script from a file name and its contents.
    pub fn from_source(file_name: &str, content: &str) -> CoreResult<Self> {
        let version = parse_version(file_name)?;
        let parsed = parse_script(file_name, content)?;
        Ok(Self {
            version,
            identifier: file_name.to_string(),
            path: PathBuf::from(file_name),
            up: parsed.up,
            down: parsed.down,
            use_transaction: parsed.use_transaction,
        })
    }

    /// Load and parse a script file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CoreError::MalformedMigration {
                path: path.display().to_string(),
                reason: "file name is not valid UTF-8".to_string(),
            })?;
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut script = Self::from_source(file_name, &content)?;
        script.path = path.to_path_buf();
        Ok(script)
    }

    /// Statements to execute for the given direction.
    pub fn statements(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }
}

/// Extract the numeric version prefix from a migration file name.
///
/// `00012_add_users.sql` yields `12`. A missing `_` separator, a non-numeric
/// prefix or a zero version are rejected.
pub fn parse_version(file_name: &str) -> CoreResult<i64> {
    let malformed = |reason: &str| CoreError::MalformedMigration {
        path: file_name.to_string(),
        reason: reason.to_string(),
    };

    let (prefix, _) = file_name
        .split_once('_')
        .ok_or_else(|| malformed("no '_' separator after the version number"))?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("version prefix is not a number"));
    }
    let version: i64 = prefix
        .parse()
        .map_err(|_| malformed("version prefix does not fit in 64 bits"))?;
    if version == 0 {
        return Err(malformed("migration versions must be greater than zero"));
    }
    Ok(version)
}

/// Ordered set of migration scripts, ascending by version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSet {
    scripts: Vec<MigrationScript>,
}

impl MigrationSet {
    /// Build a set from scripts in any order.
    ///
    /// Sorts ascending by version and rejects duplicate versions.
    pub fn from_scripts(mut scripts: Vec<MigrationScript>) -> CoreResult<Self> {
        scripts.sort_by(|a, b| {
            a.version
                .cmp(&b.version)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });
        for pair in scripts.windows(2) {
            if pair[0].version == pair[1].version {
                return Err(CoreError::DuplicateMigrationVersion {
                    version: pair[0].version,
                    first: pair[0].identifier.clone(),
                    second: pair[1].identifier.clone(),
                });
            }
        }
        Ok(Self { scripts })
    }

    /// Collect every `.sql` migration directly inside `dir`.
    ///
    /// Sub-directories and files with other extensions are ignored.
    pub fn load(dir: &Path) -> CoreResult<Self> {
        if !dir.is_dir() {
            return Err(CoreError::InvalidMigrationsDir {
                path: dir.display().to_string(),
                reason: if dir.exists() {
                    "is not a directory".to_string()
                } else {
                    "does not exist".to_string()
                },
            });
        }

        let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;

        let mut scripts = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(MIGRATION_EXTENSION) {
                log::debug!("Skipping non-migration file {}", path.display());
                continue;
            }
            scripts.push(MigrationScript::load(&path)?);
        }

        let set = Self::from_scripts(scripts)?;
        log::debug!(
            "Collected {} migrations from {}",
            set.len(),
            dir.display()
        );
        Ok(set)
    }

    /// Scripts in ascending version order.
    pub fn scripts(&self) -> &[MigrationScript] {
        &self.scripts
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MigrationScript> {
        self.scripts.iter()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Highest version in the set, `None` when empty.
    pub fn max_version(&self) -> Option<i64> {
        self.scripts.last().map(|s| s.version)
    }

    /// Look up the script with exactly this version.
    pub fn get(&self, version: i64) -> Option<&MigrationScript> {
        self.scripts
            .binary_search_by_key(&version, |s| s.version)
            .ok()
            .map(|idx| &self.scripts[idx])
    }

    /// Scripts with `after < version <= up_to`, ascending.
    pub fn pending(&self, after: i64, up_to: i64) -> impl Iterator<Item = &MigrationScript> {
        self.scripts
            .iter()
            .filter(move |s| s.version > after && s.version <= up_to)
    }
}

impl<'a> IntoIterator for &'a MigrationSet {
    type Item = &'a MigrationScript;
    type IntoIter = std::slice::Iter<'a, MigrationScript>;

    fn into_iter(self) -> Self::IntoIter {
        self.scripts.iter()
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
