//! Plan command implementation

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, PlanArgs};
use crate::commands::common::{parse_names, select_changes, PlanSummary};
use crate::context::RuntimeContext;

/// Execute the plan command
pub async fn execute(args: &PlanArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let names = parse_names(&args.resources);

    let changes = tl_engine::plan(&ctx.config, &ctx.root, &ctx.state).context("Planning failed")?;
    let changes = select_changes(changes, names.as_deref())?;

    for change in &changes {
        if global.verbose || !change.is_noop() {
            println!("  {}", change);
        }
    }

    let summary = PlanSummary::of(&changes);
    if summary.is_empty() {
        println!("No changes. {} resource(s) up to date.", changes.len());
    } else {
        println!();
        println!("Plan: {}", summary);
    }
    Ok(())
}
