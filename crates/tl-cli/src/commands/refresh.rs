//! Refresh command implementation

use anyhow::{Context, Result};
use tl_engine::Reconciler;

use crate::cli::{GlobalArgs, RefreshArgs};
use crate::commands::common::{finish, print_outcomes};
use crate::context::RuntimeContext;

/// Execute the refresh command
pub async fn execute(_args: &RefreshArgs, global: &GlobalArgs) -> Result<()> {
    let mut ctx = RuntimeContext::new(global)?;
    if ctx.state.resources().next().is_none() {
        println!("No resources in state.");
        return Ok(());
    }

    let resource = ctx.migration_resource()?;
    let outcomes = Reconciler::new(&resource, &mut ctx.state)
        .refresh()
        .await
        .context("Failed to record state")?;

    finish(print_outcomes(&outcomes))
}
