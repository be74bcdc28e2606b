//! Status command implementation

use anyhow::Result;
use serde::Serialize;
use tl_core::ReconciledResource;
use tl_engine::{MetadataProvider, ResourceKind};

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::context::RuntimeContext;

#[derive(Debug, Serialize)]
struct StatusRow<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    version: i64,
    target_version: Option<i64>,
    endpoint: &'a str,
    database: &'a str,
    migration_table: &'a str,
    migrations: usize,
}

impl<'a> StatusRow<'a> {
    fn new(resource: &'a ReconciledResource) -> Self {
        Self {
            kind: ResourceKind::MigrationResource.type_name(),
            name: resource.name.as_str(),
            version: resource.applied_version,
            target_version: resource.target_version,
            endpoint: &resource.endpoint,
            database: &resource.database,
            migration_table: resource.migration_table.as_str(),
            migrations: resource.migrations.len(),
        }
    }
}

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let rows: Vec<StatusRow> = ctx.state.resources().map(StatusRow::new).collect();

    match args.output {
        StatusOutput::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        StatusOutput::Table => {
            if rows.is_empty() {
                println!("No resources in state ({}).", ctx.state.path().display());
                return Ok(());
            }
            println!(
                "{:<20} {:>8} {:>8}  {:<20} {}",
                "NAME", "VERSION", "TARGET", "TABLE", "DATABASE"
            );
            for row in &rows {
                let target = row
                    .target_version
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "latest".to_string());
                println!(
                    "{:<20} {:>8} {:>8}  {:<20} {}{}",
                    row.name, row.version, target, row.migration_table, row.endpoint, row.database
                );
            }
            if global.verbose {
                println!();
                println!("State serial {} at {}", ctx.state.serial(), ctx.state.path().display());
            }
        }
    }
    Ok(())
}
