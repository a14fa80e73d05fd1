//! Human-readable formatter.

mod cycles;
mod modules;
mod unused;

#[cfg(test)]
mod tests;

use crate::cli::pack::PackSummary;
use colored::*;
use dtsweave_core::{Diagnostic, ListReport};
use std::fmt::Write;
use std::path::Path;

pub struct HumanFormatter;

pub fn print_list(report: &ListReport, root: &Path) {
    print!("{}", render_list(report, root));
}

pub fn print_pack(summary: &PackSummary) {
    print!("{}", render_pack(summary));
}

pub(crate) fn render_list(report: &ListReport, root: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", "dtsweave listing".bold());
    let _ = writeln!(out, "================\n");

    modules::render_modules(&mut out, &report.modules, root);
    unused::render_unused(&mut out, report, root);
    cycles::render_cycles(&mut out, &report.cycles, root);
    render_diagnostics(&mut out, &report.diagnostics, root);
    out
}

pub(crate) fn render_pack(summary: &PackSummary) -> String {
    let mut out = String::new();
    let verb = if summary.written { "Wrote" } else { "Would write" };
    let _ = writeln!(
        out,
        "{} {} ({} modules, {}ms)",
        "✓".green(),
        summary.module_name.bold(),
        summary.statistics.modules,
        summary.duration_ms
    );
    for file in &summary.files {
        let _ = writeln!(out, "  {} {}", verb, file.display());
    }

    let stats = &summary.statistics;
    if stats.rounds > 0 {
        let _ = writeln!(
            out,
            "  Stripped {} unused exports and {} dead declarations in {} rounds",
            stats.stripped_exports, stats.dead_symbols, stats.rounds
        );
    }
    if stats.external_modules > 0 {
        let _ = writeln!(out, "  External modules: {}", stats.external_modules);
    }
    render_diagnostics(&mut out, &summary.diagnostics, Path::new(""));
    out
}

fn render_diagnostics(out: &mut String, diagnostics: &[Diagnostic], root: &Path) {
    if diagnostics.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{} ({}):", "Warnings".yellow().bold(), diagnostics.len());
    for diagnostic in diagnostics {
        let _ = writeln!(
            out,
            "  {} {} [{}]: {}",
            "⚠".yellow(),
            relative(&diagnostic.file, root),
            diagnostic.kind.as_str(),
            diagnostic.message
        );
    }
}

/// `path` relative to `root` when it lies below it.
pub(crate) fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
        .replace('\\', "/")
}
