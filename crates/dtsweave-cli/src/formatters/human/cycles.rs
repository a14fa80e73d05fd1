//! Import cycle formatter.

use super::relative;
use colored::*;
use dtsweave_core::circular_deps::ImportCycle;
use std::fmt::Write;
use std::path::Path;

pub fn render_cycles(out: &mut String, cycles: &[ImportCycle], root: &Path) {
    if cycles.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n🔄 Import cycles ({}):", cycles.len());
    for (idx, cycle) in cycles.iter().enumerate() {
        let members = cycle
            .modules
            .iter()
            .map(|p| relative(p, root))
            .collect::<Vec<_>>()
            .join(" ↔ ");
        let _ = writeln!(out, "  {} Cycle {}: {}", "⚠".yellow(), idx + 1, members);
    }
}
