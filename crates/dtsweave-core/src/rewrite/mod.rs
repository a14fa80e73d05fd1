//! Emission of the bundled declaration files.
//!
//! Both styles read the final (stripped) modules and their graph and never
//! modify either.

pub mod module;
pub mod namespace;
pub mod registry;

use crate::graph::{EdgeTarget, ModuleGraph, ModuleId};
use crate::naming::module_relative_name;
use crate::printer::OutputNode;
use crate::syntax::{SourceModule, Statement};
use crate::types::{BundleOptions, DeclarationStyle, Diagnostic, ExportEdge};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

pub use registry::{ExternalAliasRegistry, ExternalModule};

/// Files produced by one emission.
#[derive(Debug, Clone, Default)]
pub struct Emission {
    pub files: BTreeMap<PathBuf, String>,
    pub diagnostics: Vec<Diagnostic>,
    pub external_modules: usize,
}

/// Emits `modules` in the configured style.
pub fn emit(
    graph: &ModuleGraph,
    modules: &[SourceModule],
    entry: ModuleId,
    options: &BundleOptions,
) -> Emission {
    match options.style {
        DeclarationStyle::Namespace => namespace::emit_namespace(graph, modules, entry, options),
        DeclarationStyle::Module => module::emit_modules(graph, modules, entry, options),
    }
}

/// Every name `id` exports after stripping, following internal `export *`.
pub fn surviving_export_names(graph: &ModuleGraph, id: ModuleId) -> Vec<String> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();
    let mut visited = HashSet::new();
    collect_export_names(graph, id, &mut names, &mut seen, &mut visited);
    names
}

fn collect_export_names(
    graph: &ModuleGraph,
    id: ModuleId,
    names: &mut Vec<String>,
    seen: &mut HashSet<String>,
    visited: &mut HashSet<ModuleId>,
) {
    if !visited.insert(id) {
        return;
    }
    let module = graph.module(id);
    for (edge, target) in module.edges.exports.iter().zip(&module.export_targets) {
        match edge {
            ExportEdge::Local { named_exports, .. } | ExportEdge::ReExport { named_exports, .. }
                if !named_exports.is_empty() =>
            {
                for item in named_exports {
                    if seen.insert(item.exported_name.clone()) {
                        names.push(item.exported_name.clone());
                    }
                }
            }
            ExportEdge::ReExport { .. } => {
                if let Some(EdgeTarget::Internal(next)) = target {
                    collect_export_names(graph, *next, names, seen, visited);
                }
            }
            _ => {}
        }
    }
}

/// Statement of a global script, emitted unscoped as written.
pub fn script_statement(stmt: &Statement) -> Option<OutputNode> {
    let text = match stmt {
        Statement::Declaration(decl) => decl.to_source(decl.modifiers),
        Statement::GlobalAugmentation { text, .. } | Statement::AmbientModule { text, .. } => {
            text.clone()
        }
        Statement::ImportEquals(import) => {
            format!("import {} = {};", import.name, import.reference.text())
        }
        _ => return None,
    };
    Some(OutputNode::text(text))
}

/// `<moduleName>/<relative path>` of a bundled file.
pub fn child_module_name(options: &BundleOptions, graph: &ModuleGraph, id: ModuleId) -> String {
    format!(
        "{}/{}",
        options.module_name,
        module_relative_name(&options.base_path, &graph.module(id).path)
    )
}

/// Publishes `exported` under `options.root_name`.
///
/// `A.B.C` becomes a global namespace alias; a plain `C` becomes a UMD
/// global declaration.
pub fn root_name_section(options: &BundleOptions, exported: &str) -> Vec<OutputNode> {
    let Some(root) = options.root_name.as_deref().filter(|r| !r.is_empty()) else {
        return Vec::new();
    };
    match root.rsplit_once('.') {
        Some((outer, name)) => vec![
            OutputNode::Blank,
            OutputNode::block(
                "declare global",
                vec![OutputNode::block(
                    format!("namespace {outer}"),
                    vec![OutputNode::line(format!("export import {name} = {exported};"))],
                )],
            ),
        ],
        None => vec![
            OutputNode::Blank,
            OutputNode::line(format!("export as namespace {root};")),
        ],
    }
}

/// Header or footer text with `{moduleName}` and `{entry}` substituted.
pub fn render_template(template: &str, options: &BundleOptions) -> String {
    template
        .replace("{moduleName}", &options.module_name)
        .replace("{entry}", &options.entry.to_string_lossy())
}

/// Wraps `body` with the configured header and footer.
pub fn with_banner(body: Vec<OutputNode>, options: &BundleOptions) -> Vec<OutputNode> {
    let mut nodes = Vec::new();
    if let Some(header) = &options.header {
        nodes.push(OutputNode::text(render_template(header, options)));
    }
    nodes.extend(body);
    if let Some(footer) = &options.footer {
        nodes.push(OutputNode::text(render_template(footer, options)));
    }
    nodes
}
