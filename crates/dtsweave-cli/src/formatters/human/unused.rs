//! Unused exports found by the strip rounds.

use super::relative;
use colored::*;
use dtsweave_core::ListReport;
use std::fmt::Write;
use std::path::Path;

pub fn render_unused(out: &mut String, report: &ListReport, root: &Path) {
    if report.unused.is_empty() {
        return;
    }
    let _ = writeln!(
        out,
        "\n📤 Unused exports ({}):",
        report.unused_export_count()
    );
    for listing in report.unused.iter().take(50) {
        let path = relative(&listing.path, root);
        if listing.whole_file {
            let _ = writeln!(out, "  {} {}", path.yellow(), "(whole file)".bright_black());
        } else {
            let _ = writeln!(out, "  {}", path.yellow());
        }
        if !listing.exports.is_empty() {
            let _ = writeln!(out, "    exports: {}", listing.exports.join(", "));
        }
        if !listing.star_reexports.is_empty() {
            let _ = writeln!(out, "    export * from: {}", listing.star_reexports.join(", "));
        }
        if !listing.symbols.is_empty() {
            let _ = writeln!(out, "    dead declarations: {}", listing.symbols.join(", "));
        }
    }
    if report.unused.len() > 50 {
        let _ = writeln!(out, "  ... and {} more files", report.unused.len() - 50);
    }
}
