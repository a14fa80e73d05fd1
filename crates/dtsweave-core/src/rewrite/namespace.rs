//! Namespace-style emission: every file becomes a `declare namespace`
//! whose declarations live in an inner `module` namespace and whose exports
//! are re-exposed as `export import` aliases.

use super::registry::ExternalAliasRegistry;
use super::{
    root_name_section, script_statement, surviving_export_names, with_banner, Emission,
};
use crate::graph::{EdgeTarget, ModuleGraph, ModuleId};
use crate::naming::{identifier_name, namespace_name};
use crate::printer::{OutputNode, Printer, TextPrinter};
use crate::syntax::{
    root_identifier, ImportEquals, Modifiers, ModuleReference, SourceModule, Statement,
};
use crate::types::{
    BundleOptions, Diagnostic, DiagnosticKind, ExportEdge, ImportEdge, ImportedName,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

struct NamespaceEmitter<'a> {
    graph: &'a ModuleGraph,
    options: &'a BundleOptions,
    namespaces: Vec<String>,
    registry: ExternalAliasRegistry,
    globals: Vec<OutputNode>,
    diagnostics: Vec<Diagnostic>,
}

pub fn emit_namespace(
    graph: &ModuleGraph,
    modules: &[SourceModule],
    entry: ModuleId,
    options: &BundleOptions,
) -> Emission {
    let namespaces = graph
        .iter()
        .map(|(_, m)| namespace_name(&options.module_name, &options.base_path, &m.path))
        .collect();
    let mut emitter = NamespaceEmitter {
        graph,
        options,
        namespaces,
        registry: ExternalAliasRegistry::new(options.import_binding_name.clone()),
        globals: Vec::new(),
        diagnostics: Vec::new(),
    };

    let mut blocks = Vec::new();
    for (id, _) in graph.iter() {
        if let Some(block) = emitter.emit_file(id, &modules[id.0]) {
            blocks.push(block);
            blocks.push(OutputNode::Blank);
        }
    }

    let mut exported = emitter.namespaces[entry.0].clone();
    if let Some(export) = options.entry_export() {
        exported = format!("{exported}.{}", identifier_name(export, &options.default_name));
    }

    let mut body = Vec::new();
    for external in emitter.registry.entries() {
        body.push(OutputNode::line(match &external.alias {
            Some(alias) => format!("import * as {alias} from '{}';", external.specifier),
            None => format!("import '{}';", external.specifier),
        }));
    }
    if !emitter.registry.is_empty() {
        body.push(OutputNode::Blank);
    }
    if !emitter.globals.is_empty() {
        body.append(&mut emitter.globals);
        body.push(OutputNode::Blank);
    }
    body.extend(blocks);
    body.push(OutputNode::line(format!("export = {exported};")));
    body.extend(root_name_section(options, &exported));

    let text = TextPrinter::new(options.newline).print(&with_banner(body, options));
    let path = options
        .out_dir
        .join(format!("{}.d.ts", options.module_name));
    tracing::debug!(
        file = %path.display(),
        externals = emitter.registry.len(),
        "namespace bundle emitted"
    );

    Emission {
        files: [(path, text)].into_iter().collect(),
        external_modules: emitter.registry.len(),
        diagnostics: emitter.diagnostics,
    }
}

impl NamespaceEmitter<'_> {
    fn emit_file(&mut self, id: ModuleId, source: &SourceModule) -> Option<OutputNode> {
        if !source.is_module() {
            self.globals.extend(source.statements.iter().filter_map(script_statement));
            return None;
        }
        let graph = self.graph;
        let node = graph.module(id);
        let mut inner = Vec::new();
        let mut local_refs: HashMap<String, String> = HashMap::new();

        for (index, stmt) in source.statements.iter().enumerate() {
            match stmt {
                Statement::Import(_)
                | Statement::ImportEquals(ImportEquals {
                    reference: ModuleReference::External(_),
                    ..
                }) => {
                    let edges = node
                        .edges
                        .imports
                        .iter()
                        .zip(&node.import_targets)
                        .filter(|(edge, _)| edge.statement == index);
                    for (edge, target) in edges {
                        let Some(local) = &edge.local_name else {
                            self.touch(edge, target.as_ref());
                            continue;
                        };
                        let reference = self.import_reference(edge, target.as_ref());
                        inner.push(OutputNode::line(format!("import {local} = {reference};")));
                        local_refs.insert(local.clone(), reference);
                    }
                }
                Statement::ImportEquals(import) => {
                    inner.push(OutputNode::line(format!(
                        "import {} = {};",
                        import.name,
                        import.reference.text()
                    )));
                }
                Statement::Declaration(decl) => {
                    let decl = if decl.name.is_none() && !decl.is_variable() {
                        decl.with_name(&self.options.default_name)
                    } else {
                        decl.clone()
                    };
                    inner.push(OutputNode::text(decl.to_source(Modifiers::NONE)));
                }
                Statement::ExportAssignment(assignment) if assignment.is_equals => {
                    self.warn(
                        DiagnosticKind::UnrepresentableExport,
                        &node.path,
                        format!(
                            "'export = {}' cannot be expressed in namespace style and was dropped",
                            assignment.expression
                        ),
                    );
                }
                Statement::GlobalAugmentation { text, .. } | Statement::AmbientModule { text, .. } => {
                    self.globals.push(OutputNode::text(text.clone()));
                }
                Statement::ExportAssignment(_)
                | Statement::ExportList(_)
                | Statement::ExportAll(_)
                | Statement::NamespaceExport { .. }
                | Statement::Unrecognized { .. } => {}
            }
        }

        let outer = self.export_aliases(id, &local_refs);
        if inner.is_empty() && outer.is_empty() {
            return None;
        }

        let mut children = Vec::new();
        if !inner.is_empty() {
            children.push(OutputNode::block("namespace module", inner));
        }
        children.extend(outer);
        Some(OutputNode::block(
            format!("declare namespace {}", self.namespaces[id.0]),
            children,
        ))
    }

    /// `export import` aliases for every surviving export of `id`.
    fn export_aliases(&mut self, id: ModuleId, local_refs: &HashMap<String, String>) -> Vec<OutputNode> {
        let graph = self.graph;
        let node = graph.module(id);
        let default_name = self.options.default_name.clone();
        let ident = |name: &str| identifier_name(name, &default_name).to_string();
        let mut seen = HashSet::new();
        let mut aliases = Vec::new();
        let mut push = |name: String, target: String| {
            if seen.insert(name.clone()) {
                aliases.push(OutputNode::line(format!("export import {name} = {target};")));
            }
        };

        for (edge, target) in node.edges.exports.iter().zip(&node.export_targets) {
            match (edge, target) {
                (ExportEdge::Local { named_exports, .. }, _) => {
                    for item in named_exports {
                        let target = local_target(item.local_name(), local_refs, &ident);
                        push(ident(&item.exported_name), target);
                    }
                }
                (ExportEdge::ReExport { named_exports, .. }, Some(EdgeTarget::Internal(next)))
                    if named_exports.is_empty() =>
                {
                    let ns = &self.namespaces[next.0];
                    for name in surviving_export_names(graph, *next) {
                        let name = ident(&name);
                        push(name.clone(), format!("{ns}.{name}"));
                    }
                }
                (
                    ExportEdge::ReExport {
                        module_specifier,
                        named_exports,
                        ..
                    },
                    Some(_),
                ) if named_exports.is_empty() => {
                    self.warn(
                        DiagnosticKind::UnenumerableReExport,
                        &node.path,
                        format!(
                            "export * from '{module_specifier}' points outside the bundle and its names cannot be listed"
                        ),
                    );
                }
                (
                    ExportEdge::ReExport {
                        module_specifier,
                        named_exports,
                        ..
                    },
                    Some(target),
                ) => {
                    for item in named_exports {
                        let base = match target {
                            EdgeTarget::Internal(next) => self.namespaces[next.0].clone(),
                            EdgeTarget::External(path) => {
                                self.registry.alias(path, module_specifier)
                            }
                            EdgeTarget::Unresolved => self
                                .registry
                                .alias(Path::new(module_specifier), module_specifier),
                        };
                        let member = match (item.is_namespace_reexport(), target) {
                            (true, _) => String::new(),
                            (false, EdgeTarget::Internal(_)) => format!(".{}", ident(item.local_name())),
                            (false, _) => format!(".{}", item.local_name()),
                        };
                        push(ident(&item.exported_name), format!("{base}{member}"));
                    }
                }
                (ExportEdge::ReExport { .. }, None) | (ExportEdge::Assignment { .. }, _) => {}
            }
        }
        aliases
    }

    fn import_reference(&mut self, edge: &ImportEdge, target: Option<&EdgeTarget>) -> String {
        match target {
            Some(EdgeTarget::Internal(next)) => {
                let member = match &edge.source_name {
                    Some(ImportedName::Default) => format!(".{}", self.options.default_name),
                    Some(ImportedName::Named(name)) => {
                        format!(".{}", identifier_name(name, &self.options.default_name))
                    }
                    Some(ImportedName::Namespace) | None => String::new(),
                };
                format!("{}{member}", self.namespaces[next.0])
            }
            Some(EdgeTarget::External(path)) => self.external_reference(edge, path),
            Some(EdgeTarget::Unresolved) | None => {
                let path = PathBuf::from(&edge.module_specifier);
                self.external_reference(edge, &path)
            }
        }
    }

    fn external_reference(&mut self, edge: &ImportEdge, path: &Path) -> String {
        let alias = self.registry.alias(path, &edge.module_specifier);
        match &edge.source_name {
            Some(ImportedName::Default) => format!("{alias}.default"),
            Some(ImportedName::Named(name)) => format!("{alias}.{name}"),
            Some(ImportedName::Namespace) | None => alias,
        }
    }

    fn touch(&mut self, edge: &ImportEdge, target: Option<&EdgeTarget>) {
        match target {
            Some(EdgeTarget::External(path)) => self.registry.touch(path, &edge.module_specifier),
            Some(EdgeTarget::Unresolved) | None => self
                .registry
                .touch(Path::new(&edge.module_specifier), &edge.module_specifier),
            Some(EdgeTarget::Internal(_)) => {}
        }
    }

    fn warn(&mut self, kind: DiagnosticKind, file: &Path, message: String) {
        tracing::warn!(file = %file.display(), "{message}");
        self.diagnostics.push(Diagnostic::new(kind, file, message));
    }
}

/// Where a local export points: an import binding's rewritten reference, or
/// the declaration inside `module`.
fn local_target(
    local: &str,
    local_refs: &HashMap<String, String>,
    ident: &impl Fn(&str) -> String,
) -> String {
    if let Some(root) = root_identifier(local) {
        if let Some(reference) = local_refs.get(root) {
            return format!("{reference}{}", &local[root.len()..]);
        }
    }
    format!("module.{}", ident(local))
}
