//! Shared utilities for CLI commands

use anyhow::{bail, Result};
use std::fmt;
use tl_engine::{Action, Outcome, PlannedChange};

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors run before the process exits.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Split a comma-separated `--resources` value. `None` means all.
pub(crate) fn parse_names(arg: &Option<String>) -> Option<Vec<String>> {
    arg.as_ref().map(|names| {
        names
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

/// Keep only changes for `names`; every name must match a change.
pub(crate) fn select_changes(
    changes: Vec<PlannedChange>,
    names: Option<&[String]>,
) -> Result<Vec<PlannedChange>> {
    let Some(names) = names else {
        return Ok(changes);
    };
    for name in names {
        if !changes.iter().any(|c| c.name == *name) {
            bail!("Unknown resource '{}'", name);
        }
    }
    Ok(changes
        .into_iter()
        .filter(|c| names.iter().any(|n| c.name == *n))
        .collect())
}

/// Counts of planned actions
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub destroy: usize,
}

impl PlanSummary {
    pub fn of(changes: &[PlannedChange]) -> Self {
        let mut summary = Self::default();
        for change in changes {
            match change.action {
                Action::Create => summary.create += 1,
                Action::Update { .. } => summary.update += 1,
                Action::Delete => summary.destroy += 1,
                Action::NoOp => {}
            }
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.create + self.update + self.destroy == 0
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to destroy",
            self.create, self.update, self.destroy
        )
    }
}

/// Print one line per outcome. Returns the number of failures.
pub(crate) fn print_outcomes(outcomes: &[Outcome]) -> usize {
    let mut failures = 0;
    for outcome in outcomes {
        let version = match outcome.version {
            Some(v) => format!("version {v}"),
            None => "removed".to_string(),
        };
        match &outcome.error {
            None => println!("  ok    {} ({})", outcome.name, version),
            Some(e) => {
                failures += 1;
                println!("  error {} ({}): {}", outcome.name, version, e);
            }
        }
    }
    failures
}

/// Turn a failure count into the command result.
pub(crate) fn finish(failures: usize) -> Result<()> {
    if failures > 0 {
        println!();
        println!("{} resource(s) failed", failures);
        return Err(ExitCode(1).into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
