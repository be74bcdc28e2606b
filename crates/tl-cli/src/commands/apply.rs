//! Apply command implementation

use anyhow::{Context, Result};
use tl_engine::Reconciler;

use crate::cli::{ApplyArgs, GlobalArgs};
use crate::commands::common::{finish, parse_names, print_outcomes, select_changes, PlanSummary};
use crate::context::RuntimeContext;

/// Execute the apply command
pub async fn execute(args: &ApplyArgs, global: &GlobalArgs) -> Result<()> {
    let mut ctx = RuntimeContext::new(global)?;
    let names = parse_names(&args.resources);

    let changes = tl_engine::plan(&ctx.config, &ctx.root, &ctx.state).context("Planning failed")?;
    let changes = select_changes(changes, names.as_deref())?;
    let summary = PlanSummary::of(&changes);
    if summary.is_empty() {
        println!("No changes. {} resource(s) up to date.", changes.len());
        return Ok(());
    }
    println!("Applying: {}", summary);

    let resource = ctx.migration_resource()?;
    let outcomes = Reconciler::new(&resource, &mut ctx.state)
        .apply(&changes)
        .await
        .context("Failed to record state")?;

    let failures = print_outcomes(&outcomes);
    finish(failures)
}
