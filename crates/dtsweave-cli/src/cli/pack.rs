//! The bundling run.

use super::{backend_for, effective_config, project_dir, RunOptions};
use crate::formatters::{self, Formatter};
use crate::OutputFormat;
use anyhow::{Context, Result};
use dtsweave_backend_ts::TsBackend;
use dtsweave_core::{BundleStatistics, Diagnostic};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// What a bundling run produced.
#[derive(Debug, Serialize)]
pub struct PackSummary {
    pub module_name: String,
    /// Output files, relative to the project directory.
    pub files: Vec<PathBuf>,
    /// False on a dry run.
    pub written: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub statistics: BundleStatistics,
    pub duration_ms: u64,
}

/// Bundles the project and writes the output files.
pub fn run_pack(options: &RunOptions) -> Result<()> {
    let start = Instant::now();
    let project = project_dir(&options.project)?;
    let config = effective_config(&project, options.config.as_deref(), options.overrides.clone())?;
    let bundle_options = config
        .to_bundle_options(&project)
        .context("Invalid configuration")?;

    let output = backend_for(&config)
        .bundle(&project, &bundle_options)
        .context("Bundling failed")?;

    if !options.dry_run {
        TsBackend::write_output(&output, &project).context("Failed to write output")?;
    }

    let summary = PackSummary {
        module_name: bundle_options.module_name,
        files: output.files.keys().cloned().collect(),
        written: !options.dry_run,
        diagnostics: output.diagnostics,
        statistics: output.statistics,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    match options.format {
        OutputFormat::Json => formatters::JsonFormatter.format_pack(&summary),
        OutputFormat::Human => formatters::HumanFormatter.format_pack(&summary),
    }
    Ok(())
}
