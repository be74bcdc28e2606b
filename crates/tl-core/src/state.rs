//! Persisted resource state
//!
//! The state file records every reconciled resource between lifecycle calls.
//! It is rewritten after every transition using write-to-temp-then-rename so
//! an interrupted write never leaves a truncated file behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::resource::ReconciledResource;

/// Current on-disk format version
pub const STATE_FORMAT_VERSION: u32 = 1;

/// Directory (relative to the project root) holding the state file
pub const STATE_DIR: &str = ".tideline";

/// Contents of the state file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// Format version of this file
    pub format_version: u32,

    /// Incremented on every save
    pub serial: u64,

    /// When the state was last written
    pub updated_at: DateTime<Utc>,

    /// Reconciled resources keyed by name
    #[serde(default)]
    pub resources: BTreeMap<String, ReconciledResource>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            format_version: STATE_FORMAT_VERSION,
            serial: 0,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

/// Loads, mutates and saves the state file.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: StateFile,
}

impl StateStore {
    /// Default state file location for a project root.
    pub fn default_path(root: &Path) -> PathBuf {
        root.join(STATE_DIR).join("state.json")
    }

    /// Open the state file at `path`, starting empty if it does not exist.
    pub fn open(path: &Path) -> CoreResult<Self> {
        let state = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            })?;
            let state: StateFile = serde_json::from_str(&content)?;
            if state.format_version > STATE_FORMAT_VERSION {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "state file {} has format version {}, this build understands up to {}",
                        path.display(),
                        state.format_version,
                        STATE_FORMAT_VERSION
                    ),
                });
            }
            state
        } else {
            StateFile::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn serial(&self) -> u64 {
        self.state.serial
    }

    /// Look up a resource by name.
    pub fn get(&self, name: &str) -> Option<&ReconciledResource> {
        self.state.resources.get(name)
    }

    /// All resources, ordered by name.
    pub fn resources(&self) -> impl Iterator<Item = &ReconciledResource> {
        self.state.resources.values()
    }

    /// Insert or replace a resource and save.
    pub fn put(&mut self, resource: ReconciledResource) -> CoreResult<()> {
        self.state
            .resources
            .insert(resource.name.to_string(), resource);
        self.save()
    }

    /// Remove a resource and save. Returns the removed entry.
    pub fn remove(&mut self, name: &str) -> CoreResult<Option<ReconciledResource>> {
        let removed = self.state.resources.remove(name);
        self.save()?;
        Ok(removed)
    }

    /// Save state atomically
    pub fn save(&mut self) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        self.state.serial += 1;
        self.state.updated_at = Utc::now();

        let temp_path = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&self.state)?;
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;

        log::debug!(
            "Saved state serial {} to {}",
            self.state.serial,
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
