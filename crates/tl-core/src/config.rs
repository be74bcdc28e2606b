//! Configuration types and parsing for tideline.yml

use crate::error::{CoreError, CoreResult};
use crate::names::{MigrationTable, ResourceName};
use crate::resource::ResourceTimeouts;
use crate::validator::{validate_dir, validate_path_or_json};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Credential service endpoint used when none is configured
pub const DEFAULT_ENDPOINT: &str = "api.cloud.yandex.net:443";

/// Maximum number of credential service attempts when none is configured
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Environment variable consulted for `provider.endpoint`
pub const ENDPOINT_ENV: &str = "TL_ENDPOINT";

/// Environment variable consulted for `provider.token`
pub const TOKEN_ENV: &str = "TL_TOKEN";

/// Environment variable consulted for `provider.service_account_key_file`
pub const SERVICE_ACCOUNT_KEY_ENV: &str = "TL_SERVICE_ACCOUNT_KEY_FILE";

const CONFIG_FILE_NAMES: [&str; 2] = ["tideline.yml", "tideline.yaml"];

/// Main project configuration from tideline.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Credential service settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Migration resources managed by this project
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

/// Credential service settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Credential service endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// IAM or OAuth token
    #[serde(default)]
    pub token: Option<String>,

    /// Path to, or inline JSON contents of, a service account key
    #[serde(default)]
    pub service_account_key_file: Option<String>,

    /// Maximum number of times a credential request is executed
    #[serde(default)]
    pub max_retries: Option<u32>,
}

impl ProviderConfig {
    /// Fill unset fields from the environment, then from built-in defaults.
    ///
    /// Priority: config value > environment variable > default.
    pub fn with_defaults(mut self) -> Self {
        self.endpoint = non_empty(self.endpoint)
            .or_else(|| env_non_empty(ENDPOINT_ENV))
            .or_else(|| Some(DEFAULT_ENDPOINT.to_string()));
        self.token = non_empty(self.token).or_else(|| env_non_empty(TOKEN_ENV));
        self.service_account_key_file = non_empty(self.service_account_key_file)
            .or_else(|| env_non_empty(SERVICE_ACCOUNT_KEY_ENV));
        self.max_retries = self.max_retries.or(Some(DEFAULT_MAX_RETRIES));
        self
    }

    /// Effective endpoint (after [`with_defaults`](Self::with_defaults)).
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// Effective attempt budget.
    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    fn validate(&self) -> CoreResult<()> {
        let has_token = self.token.as_deref().is_some_and(|t| !t.is_empty());
        let has_key = self
            .service_account_key_file
            .as_deref()
            .is_some_and(|k| !k.is_empty());
        if has_token && has_key {
            return Err(CoreError::ConfigInvalid {
                message: "provider: 'token' and 'service_account_key_file' are mutually exclusive"
                    .to_string(),
            });
        }
        if let Some(key) = &self.service_account_key_file {
            validate_path_or_json("provider.service_account_key_file", key)?;
        }
        if self.max_retries == Some(0) {
            return Err(CoreError::ConfigInvalid {
                message: "provider: 'max_retries' must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Declarative attributes of one migration resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    /// Resource name, unique within the project
    pub name: ResourceName,

    /// Database endpoint (`host:port`)
    pub endpoint: String,

    /// Database path
    pub database: String,

    /// TLS flag; absent means enabled
    #[serde(default)]
    pub tls_enabled: Option<bool>,

    /// Bookkeeping table name
    #[serde(default)]
    pub migration_table: Option<MigrationTable>,

    /// Migrations directory, relative to the project root
    pub migrations_dir: String,

    /// Version to converge to; defaults to the newest migration
    #[serde(default)]
    pub target_version: Option<i64>,

    /// Per-operation timeout overrides
    #[serde(default)]
    pub timeouts: ResourceTimeouts,
}

impl ResourceConfig {
    /// Effective bookkeeping table.
    pub fn migration_table(&self) -> MigrationTable {
        self.migration_table.clone().unwrap_or_default()
    }

    /// Migrations directory resolved against the project root.
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        let dir = Path::new(&self.migrations_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            root.join(dir)
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// Relative paths inside the file resolve against the file's directory.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.provider = config.provider.with_defaults();

        let root = path.parent().unwrap_or_else(|| Path::new("."));
        config.validate(root)?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for tideline.yml or tideline.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Err(CoreError::ConfigNotFound {
            path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
        })
    }

    /// Validate the configuration against the project root
    pub fn validate(&self, root: &Path) -> CoreResult<()> {
        self.provider.validate()?;

        let mut seen = HashSet::new();
        for resource in &self.resources {
            if !seen.insert(resource.name.as_str()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("duplicate resource name '{}'", resource.name),
                });
            }
            if resource.endpoint.is_empty() || resource.database.is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "resource '{}': 'endpoint' and 'database' must not be empty",
                        resource.name
                    ),
                });
            }
            validate_dir(
                &format!("resource '{}': migrations_dir", resource.name),
                &resource.migrations_dir_absolute(root),
            )?;
        }
        Ok(())
    }

    /// Look up a resource by name.
    pub fn resource(&self, name: &str) -> Option<&ResourceConfig> {
        self.resources.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
