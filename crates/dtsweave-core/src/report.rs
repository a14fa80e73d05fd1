//! Listing of a project's declaration files, their edges and what a strip
//! run would remove.

use crate::backend::{CachingResolver, ModuleResolver};
use crate::bundle::{normalize_modules, StripOutcome};
use crate::circular_deps::{ImportCycle, ImportCycleDetector};
use crate::error::Result;
use crate::graph::{normalize_path, EdgeTarget, ModuleGraph};
use crate::types::{BundleOptions, Diagnostic, ExportEdge, ImportEdge, ImportedName};
use crate::SourceModule;
use serde::Serialize;
use std::path::PathBuf;

/// What to list.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub base_path: PathBuf,
    /// Without an entry only files, edges and cycles are listed.
    pub entry: Option<PathBuf>,
    pub export: Option<String>,
}

impl From<&BundleOptions> for ListOptions {
    fn from(options: &BundleOptions) -> Self {
        Self {
            base_path: options.base_path.clone(),
            entry: Some(options.entry.clone()),
            export: options.entry_export().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    Internal { path: PathBuf },
    External { path: PathBuf },
    Unresolved,
    /// `import X = A.B`, not a module reference.
    EntityAlias,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportListing {
    pub specifier: String,
    /// `x`, `y as z`, `default as D`, `* as ns`; absent for side-effect imports.
    pub binding: Option<String>,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    Local,
    ReExport,
    Assignment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportListing {
    pub kind: ExportKind,
    /// Exported names; empty for `export *`.
    pub names: Vec<String>,
    pub specifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleListing {
    pub path: PathBuf,
    /// False for global scripts.
    pub is_module: bool,
    pub imports: Vec<ImportListing>,
    pub exports: Vec<ExportListing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedListing {
    pub path: PathBuf,
    pub exports: Vec<String>,
    pub symbols: Vec<String>,
    pub star_reexports: Vec<String>,
    /// Nothing of the file survives stripping.
    pub whole_file: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListReport {
    pub modules: Vec<ModuleListing>,
    pub unused: Vec<UnusedListing>,
    pub cycles: Vec<ImportCycle>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ListReport {
    pub fn unused_export_count(&self) -> usize {
        self.unused.iter().map(|u| u.exports.len()).sum()
    }
}

/// Builds the listing of `modules`.
///
/// # Errors
///
/// With an entry, fails like [`crate::bundle`] does for a missing entry
/// module or export. Cycle detection fails on oversized graphs.
pub fn list_report(
    modules: &[SourceModule],
    options: &ListOptions,
    resolver: &dyn ModuleResolver,
) -> Result<ListReport> {
    let resolver = CachingResolver::new(resolver);
    let modules = normalize_modules(modules, &options.base_path);
    let (graph, diagnostics) = ModuleGraph::build(&modules, &resolver);

    let listings = graph
        .iter()
        .map(|(id, node)| ModuleListing {
            path: node.path.clone(),
            is_module: modules[id.0].is_module(),
            imports: node
                .edges
                .imports
                .iter()
                .zip(&node.import_targets)
                .map(|(edge, target)| import_listing(&graph, edge, target.as_ref()))
                .collect(),
            exports: node.edges.exports.iter().map(export_listing).collect(),
        })
        .collect();

    let cycles = ImportCycleDetector::new(graph.dependency_map()).find_cycles()?;

    let mut unused = Vec::new();
    if let Some(entry) = &options.entry {
        let entry = normalize_path(&options.base_path.join(entry));
        let outcome = StripOutcome::stripped(
            modules.clone(),
            &entry,
            options.export.as_deref(),
            &resolver,
        )?;
        for (module, stripped) in modules.iter().zip(&outcome.modules) {
            let Some(removed) = outcome.removed.get(&module.path) else {
                continue;
            };
            unused.push(UnusedListing {
                path: module.path.clone(),
                exports: removed.exports.clone(),
                symbols: removed.symbols.clone(),
                star_reexports: removed.star_reexports.clone(),
                whole_file: stripped.statements.is_empty(),
            });
        }
    }

    Ok(ListReport {
        modules: listings,
        unused,
        cycles,
        diagnostics,
    })
}

fn import_listing(graph: &ModuleGraph, edge: &ImportEdge, target: Option<&EdgeTarget>) -> ImportListing {
    let binding = edge.local_name.as_ref().map(|local| match &edge.source_name {
        Some(ImportedName::Namespace) => format!("* as {local}"),
        Some(ImportedName::Default) => format!("default as {local}"),
        Some(ImportedName::Named(name)) if name != local => format!("{name} as {local}"),
        Some(ImportedName::Named(_)) | None => local.clone(),
    });
    let resolution = match target {
        Some(EdgeTarget::Internal(id)) => Resolution::Internal {
            path: graph.module(*id).path.clone(),
        },
        Some(EdgeTarget::External(path)) => Resolution::External { path: path.clone() },
        Some(EdgeTarget::Unresolved) => Resolution::Unresolved,
        None => Resolution::EntityAlias,
    };
    ImportListing {
        specifier: edge.module_specifier.clone(),
        binding,
        resolution,
    }
}

fn export_listing(edge: &ExportEdge) -> ExportListing {
    let names = edge
        .named_exports()
        .iter()
        .map(|item| item.exported_name.clone())
        .collect();
    match edge {
        ExportEdge::Local { .. } => ExportListing {
            kind: ExportKind::Local,
            names,
            specifier: None,
        },
        ExportEdge::ReExport {
            module_specifier, ..
        } => ExportListing {
            kind: ExportKind::ReExport,
            names,
            specifier: Some(module_specifier.clone()),
        },
        ExportEdge::Assignment { base_name, .. } => ExportListing {
            kind: ExportKind::Assignment,
            names: vec![base_name.clone()],
            specifier: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FileSetResolver;
    use crate::syntax::{Declaration, DeclarationKind, ImportDeclaration, Statement};

    fn iface(name: &str, refs: &[&str]) -> Statement {
        Statement::Declaration(
            Declaration::new(
                DeclarationKind::Interface,
                Some(name),
                format!("interface {name} {{}}"),
            )
            .with_references(refs)
            .exported(),
        )
    }

    fn project() -> Vec<SourceModule> {
        vec![
            SourceModule::new(
                "index.d.ts",
                vec![
                    Statement::Import(ImportDeclaration::named("./b", &[("B", "B")])),
                    iface("Api", &["B"]),
                    iface("Extra", &[]),
                ],
            ),
            SourceModule::new(
                "b.d.ts",
                vec![
                    Statement::Import(ImportDeclaration::named("./index", &[("Api", "Root")])),
                    iface("B", &[]),
                ],
            ),
        ]
    }

    #[test]
    fn test_listing_without_entry() {
        let modules = project();
        let options = ListOptions {
            base_path: PathBuf::from("/p"),
            ..ListOptions::default()
        };
        let resolver = FileSetResolver::new(vec![
            PathBuf::from("/p/index.d.ts"),
            PathBuf::from("/p/b.d.ts"),
        ]);
        let report = list_report(&modules, &options, &resolver).expect("report");

        assert_eq!(report.modules.len(), 2);
        assert_eq!(report.modules[1].imports[0].binding.as_deref(), Some("Api as Root"));
        assert_eq!(
            report.modules[0].imports[0].resolution,
            Resolution::Internal {
                path: PathBuf::from("/p/b.d.ts")
            }
        );
        assert_eq!(report.cycles.len(), 1);
        assert!(report.unused.is_empty());
    }

    #[test]
    fn test_listing_with_entry_reports_unused() {
        let modules = project();
        let options = ListOptions {
            base_path: PathBuf::from("/p"),
            entry: Some(PathBuf::from("index.d.ts")),
            export: Some("Api".into()),
        };
        let resolver = FileSetResolver::new(vec![
            PathBuf::from("/p/index.d.ts"),
            PathBuf::from("/p/b.d.ts"),
        ]);
        let report = list_report(&modules, &options, &resolver).expect("report");

        // b exports nothing unused, so its idle back-import is left alone
        assert_eq!(report.unused.len(), 1);
        assert_eq!(report.unused[0].path, PathBuf::from("/p/index.d.ts"));
        assert_eq!(report.unused[0].exports, vec!["Extra".to_string()]);
        assert!(!report.unused[0].whole_file);
        assert_eq!(report.unused_export_count(), 1);
    }
}
