//! The `--list` run.

use super::{backend_for, effective_config, project_dir, RunOptions};
use crate::formatters::{self, Formatter};
use crate::OutputFormat;
use anyhow::{Context, Result};
use dtsweave_core::ListOptions;

/// Lists the project without writing anything.
///
/// A missing entry file is not fatal here: the listing is produced without
/// the unused-export section.
pub fn run_list(options: &RunOptions) -> Result<()> {
    let project = project_dir(&options.project)?;
    let config = effective_config(&project, options.config.as_deref(), options.overrides.clone())?;

    let entry = project.join(&config.entry);
    let entry = if entry.is_file() {
        Some(config.entry.clone())
    } else {
        tracing::warn!(entry = %entry.display(), "entry file not found, skipping unused export analysis");
        None
    };
    let list_options = ListOptions {
        base_path: project.clone(),
        entry,
        export: config.export.clone().filter(|e| e != "*"),
    };

    let report = backend_for(&config)
        .list(&project, &list_options)
        .context("Listing failed")?;

    match options.format {
        OutputFormat::Json => formatters::JsonFormatter.format_list(&report, &project),
        OutputFormat::Human => formatters::HumanFormatter.format_list(&report, &project),
    }
    Ok(())
}
