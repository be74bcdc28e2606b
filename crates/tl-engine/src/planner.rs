//! Change planning
//!
//! Compares configured resources against persisted state and decides what
//! each resource needs. Planning reads migration directories but never
//! touches a database.

use crate::error::{EngineError, EngineResult};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tl_core::{resolve, Config, ReconciledResource, ResourceConfig, ResourceName, StateStore};

/// What a resource needs to converge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Not in state yet
    Create,
    /// In state; attributes or version differ
    Update { from: i64, to: i64 },
    /// Already converged
    NoOp,
    /// In state but no longer configured
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Update { from, to } if from == to => write!(f, "update in place"),
            Action::Update { from, to } if to < from => write!(f, "migrate down {from} -> {to}"),
            Action::Update { from, to } => write!(f, "migrate up {from} -> {to}"),
            Action::NoOp => write!(f, "no changes"),
            Action::Delete => write!(f, "destroy"),
        }
    }
}

/// One planned resource change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChange {
    pub name: ResourceName,
    pub action: Action,
    /// Desired state, `None` for deletes
    pub planned: Option<ReconciledResource>,
    /// Persisted state, `None` for creates
    pub prior: Option<ReconciledResource>,
}

impl PlannedChange {
    pub fn is_noop(&self) -> bool {
        self.action == Action::NoOp
    }

    /// A change that tears `prior` down.
    pub fn delete(prior: ReconciledResource) -> Self {
        Self {
            name: prior.name.clone(),
            action: Action::Delete,
            planned: None,
            prior: Some(prior),
        }
    }
}

impl fmt::Display for PlannedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.action)?;
        if let (Action::Create, Some(planned)) = (self.action, &self.planned) {
            match planned.migrations.len() {
                0 => write!(f, " (no migrations)")?,
                n => write!(f, " ({} migrations, version {})", n, planned.applied_version)?,
            }
        }
        Ok(())
    }
}

/// Desired state of one configured resource, version resolved from its
/// directory.
///
/// When the directory holds no migrations the version stays at `fallback`;
/// the create path replaces it with the version the database reports.
pub fn planned_resource(
    config: &ResourceConfig,
    root: &Path,
    fallback: i64,
) -> EngineResult<ReconciledResource> {
    let mut resource = ReconciledResource {
        name: config.name.clone(),
        endpoint: config.endpoint.clone(),
        database: config.database.clone(),
        tls_enabled: config.tls_enabled,
        migration_table: config.migration_table(),
        migrations_dir: config.migrations_dir_absolute(root),
        target_version: config.target_version,
        applied_version: fallback,
        migrations: Vec::new(),
        timeouts: config.timeouts,
    };
    let (_, resolved) = resolve(&resource.desired())?;
    resource.applied_version = resolved.resolved_version.unwrap_or(fallback);
    resource.migrations = resolved.migrations;
    Ok(resource)
}

fn plan_one(
    config: &ResourceConfig,
    root: &Path,
    prior: Option<&ReconciledResource>,
) -> EngineResult<PlannedChange> {
    let Some(prior) = prior else {
        return Ok(PlannedChange {
            name: config.name.clone(),
            action: Action::Create,
            planned: Some(planned_resource(config, root, 0)?),
            prior: None,
        });
    };

    let planned = planned_resource(config, root, prior.applied_version)?;
    if planned.migration_table != prior.migration_table {
        return Err(EngineError::ImmutableAttributeChanged {
            resource: prior.name.to_string(),
            attribute: "migration_table",
            prior: prior.migration_table.to_string(),
            planned: planned.migration_table.to_string(),
        });
    }

    let action = if &planned == prior {
        Action::NoOp
    } else {
        Action::Update {
            from: prior.applied_version,
            to: planned.applied_version,
        }
    };
    Ok(PlannedChange {
        name: config.name.clone(),
        action,
        planned: Some(planned),
        prior: Some(prior.clone()),
    })
}

/// Plan every resource: configured ones in config order, then deletes for
/// resources only found in state, by name.
pub fn plan(config: &Config, root: &Path, state: &StateStore) -> EngineResult<Vec<PlannedChange>> {
    let mut changes = Vec::with_capacity(config.resources.len());
    let mut configured = HashSet::new();

    for resource in &config.resources {
        configured.insert(resource.name.as_str());
        let change = plan_one(resource, root, state.get(&resource.name))?;
        log::debug!("Planned {}", change);
        changes.push(change);
    }

    for prior in state.resources() {
        if !configured.contains(prior.name.as_str()) {
            changes.push(PlannedChange::delete(prior.clone()));
        }
    }
    Ok(changes)
}

#[cfg(test)]
#[path = "planner_test.rs"]
mod tests;
