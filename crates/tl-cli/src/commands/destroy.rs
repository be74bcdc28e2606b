//! Destroy command implementation

use anyhow::{Context, Result};
use tl_engine::Reconciler;

use crate::cli::{DestroyArgs, GlobalArgs};
use crate::commands::common::{finish, parse_names, print_outcomes};
use crate::context::RuntimeContext;

/// Execute the destroy command
pub async fn execute(args: &DestroyArgs, global: &GlobalArgs) -> Result<()> {
    let mut ctx = RuntimeContext::new(global)?;
    let names = parse_names(&args.resources);
    if ctx.state.resources().next().is_none() {
        println!("No resources in state.");
        return Ok(());
    }

    let resource = ctx.migration_resource()?;
    let outcomes = Reconciler::new(&resource, &mut ctx.state)
        .destroy(names.as_deref())
        .await
        .context("Failed to destroy resources")?;

    finish(print_outcomes(&outcomes))
}
