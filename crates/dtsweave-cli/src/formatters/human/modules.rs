//! Per-file import and export listing.

use super::relative;
use colored::*;
use dtsweave_core::report::{ExportKind, ExportListing, ImportListing, ModuleListing, Resolution};
use std::fmt::Write;
use std::path::Path;

pub fn render_modules(out: &mut String, modules: &[ModuleListing], root: &Path) {
    let _ = writeln!(out, "📄 Files ({}):", modules.len());
    for module in modules {
        let scope = if module.is_module { "" } else { " (global script)" };
        let _ = writeln!(out, "  {}{}", relative(&module.path, root).cyan(), scope.bright_black());
        for import in &module.imports {
            let _ = writeln!(out, "    ← {}", render_import(import, root));
        }
        for export in &module.exports {
            let _ = writeln!(out, "    → {}", render_export(export));
        }
    }
}

fn render_import(import: &ImportListing, root: &Path) -> String {
    let binding = import
        .binding
        .as_deref()
        .map(|b| format!("{b} from "))
        .unwrap_or_default();
    let target = match &import.resolution {
        Resolution::Internal { path } => relative(path, root),
        Resolution::External { .. } => "external".bright_black().to_string(),
        Resolution::Unresolved => "unresolved".red().to_string(),
        Resolution::EntityAlias => "alias".bright_black().to_string(),
    };
    format!("{binding}'{}' ({target})", import.specifier)
}

fn render_export(export: &ExportListing) -> String {
    let names = if export.names.is_empty() {
        "*".to_string()
    } else {
        export.names.join(", ")
    };
    match (&export.kind, &export.specifier) {
        (ExportKind::ReExport, Some(specifier)) => format!("{names} from '{specifier}'"),
        (ExportKind::Assignment, _) => format!("{names} (assignment)"),
        _ => names,
    }
}
