//! Migration resource state machine
//!
//! A migration resource is either absent or present at an applied version.
//! Every lifecycle call acquires a token, opens one connection, runs the
//! version delta through the [`MigrationDriver`] and closes the connection
//! before reporting, all under the deadline of that operation.

use crate::error::{EngineError, EngineResult};
use crate::lifecycle::{
    Attribute, Lifecycle, MetadataProvider, Persist, ResourceKind, SchemaProvider, Transition,
};
use async_trait::async_trait;
use std::sync::Arc;
use tl_auth::TokenSource;
use tl_core::{resolve, Deadline, MigrationSet, Operation, ReconciledResource};
use tl_db::{Connector, MigrationDriver};

/// Lifecycle of the `tideline_migration` resource kind
pub struct MigrationResource {
    connector: Arc<dyn Connector>,
    tokens: Arc<dyn TokenSource>,
}

impl MigrationResource {
    pub fn new(connector: Arc<dyn Connector>, tokens: Arc<dyn TokenSource>) -> Self {
        Self { connector, tokens }
    }

    /// Open a driver against the database `resource` points at.
    async fn connect(
        &self,
        resource: &ReconciledResource,
        deadline: &Deadline,
    ) -> EngineResult<MigrationDriver> {
        let token = self.tokens.token(deadline).await?;
        let descriptor = resource.descriptor(token.expose());
        Ok(MigrationDriver::open(self.connector.as_ref(), &descriptor, deadline).await?)
    }

    async fn run_create(
        &self,
        plan: &ReconciledResource,
        deadline: &Deadline,
    ) -> EngineResult<ReconciledResource> {
        let (set, resolved) = resolve(&plan.desired())?;
        let table = &plan.migration_table;

        let driver = self.connect(plan, deadline).await?;
        let result = match (plan.target_version, resolved.resolved_version) {
            (Some(_), Some(version)) => driver.up_to(table, &set, version, deadline).await,
            _ => driver.up(table, &set, deadline).await,
        };
        let observed = driver.finish(result).await?;

        let mut state = plan.clone();
        state.applied_version = resolved.resolved_version.unwrap_or(observed);
        state.migrations = resolved.migrations;
        log::info!("Created {} at version {}", state.name, state.applied_version);
        Ok(state)
    }

    async fn run_read(
        &self,
        state: &ReconciledResource,
        deadline: &Deadline,
    ) -> EngineResult<ReconciledResource> {
        let driver = self.connect(state, deadline).await?;
        let result = driver.current_version(&state.migration_table, deadline).await;
        let observed = driver.finish(result).await?;

        if observed != state.applied_version {
            log::warn!(
                "{} drifted: state records version {}, database reports {}",
                state.name,
                state.applied_version,
                observed
            );
        }
        let mut next = state.clone();
        next.applied_version = observed;
        Ok(next)
    }

    async fn run_update(
        &self,
        plan: &ReconciledResource,
        state: &ReconciledResource,
        deadline: &Deadline,
    ) -> Transition {
        if plan.migration_table != state.migration_table {
            return Transition::keep(EngineError::ImmutableAttributeChanged {
                resource: state.name.to_string(),
                attribute: "migration_table",
                prior: state.migration_table.to_string(),
                planned: plan.migration_table.to_string(),
            });
        }

        let (set, resolved) = match resolve(&plan.desired()) {
            Ok(resolved) => resolved,
            Err(e) => return Transition::keep(e.into()),
        };
        let mut next = plan.clone();
        next.applied_version = resolved.resolved_version.unwrap_or(state.applied_version);
        next.migrations = resolved.migrations;

        let from = state.applied_version;
        let to = next.applied_version;
        if from == to {
            log::debug!("{} already at version {}", state.name, to);
            return Transition::put(next);
        }

        // Migrations run where the existing state says they were applied.
        let driver = match self.connect(state, deadline).await {
            Ok(driver) => driver,
            Err(e) => return Transition::keep(e),
        };
        let table = &state.migration_table;
        let result = if to > from {
            log::info!("Migrating {} up from {} to {}", state.name, from, to);
            driver.up_to(table, &set, to, deadline).await
        } else {
            log::info!("Migrating {} down from {} to {}", state.name, from, to);
            driver.down_to(table, &set, to, deadline).await
        };

        Transition {
            persist: Persist::Put(next),
            error: driver.finish(result).await.err().map(EngineError::from),
        }
    }

    async fn run_delete(&self, state: &ReconciledResource, deadline: &Deadline) -> EngineResult<()> {
        let set = MigrationSet::load(&state.migrations_dir)?;
        let driver = self.connect(state, deadline).await?;
        let result = driver.down_to(&state.migration_table, &set, 0, deadline).await;
        driver.finish(result).await?;
        Ok(())
    }
}

impl MetadataProvider for MigrationResource {
    fn type_name(&self) -> &'static str {
        ResourceKind::MigrationResource.type_name()
    }
}

impl SchemaProvider for MigrationResource {
    fn schema(&self) -> Vec<Attribute> {
        ResourceKind::MigrationResource.schema()
    }
}

#[async_trait]
impl Lifecycle for MigrationResource {
    async fn create(&self, plan: &ReconciledResource) -> Transition {
        let deadline = Deadline::after(plan.timeout(Operation::Create));
        match self.run_create(plan, &deadline).await {
            Ok(state) => Transition::put(state),
            // Scripts applied before a failure stay applied, but nothing is
            // recorded: the resource does not exist until create succeeds.
            Err(e) => Transition::keep(e),
        }
    }

    async fn read(&self, state: &ReconciledResource) -> Transition {
        let deadline = Deadline::after(state.timeout(Operation::Read));
        match self.run_read(state, &deadline).await {
            Ok(next) => Transition::put(next),
            Err(e) => Transition::keep(e),
        }
    }

    async fn update(&self, plan: &ReconciledResource, state: &ReconciledResource) -> Transition {
        let deadline = Deadline::after(plan.timeout(Operation::Update));
        self.run_update(plan, state, &deadline).await
    }

    async fn delete(&self, state: &ReconciledResource) -> Transition {
        let deadline = Deadline::after(state.timeout(Operation::Delete));
        let error = self.run_delete(state, &deadline).await.err();
        if let Some(e) = &error {
            log::warn!("Teardown of {} failed, removing it from state anyway: {}", state.name, e);
        }
        Transition {
            persist: Persist::Remove,
            error,
        }
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
