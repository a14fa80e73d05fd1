//! Module-style emission: one `declare module '<name>/<path>'` block per
//! file, plus an index file re-exporting the entry.

use super::{child_module_name, root_name_section, script_statement, with_banner, Emission};
use crate::graph::{EdgeTarget, ModuleGraph, ModuleId};
use crate::naming::identifier_name;
use crate::printer::{OutputNode, Printer, TextPrinter};
use crate::syntax::{
    ExportAll, ExportList, ImportDeclaration, ImportEquals, Modifiers, ModuleReference,
    SourceModule, Statement,
};
use crate::types::BundleOptions;
use std::collections::BTreeSet;
use std::path::PathBuf;

pub fn emit_modules(
    graph: &ModuleGraph,
    modules: &[SourceModule],
    entry: ModuleId,
    options: &BundleOptions,
) -> Emission {
    let printer = TextPrinter::new(options.newline);
    let mut hoisted = Vec::new();
    let mut blocks = Vec::new();

    for (id, node) in graph.iter() {
        let source = &modules[id.0];
        if !source.is_module() {
            hoisted.extend(source.statements.iter().filter_map(script_statement));
            continue;
        }
        let specifier_for = |index: usize, written: &str| -> String {
            let target = node
                .edges
                .imports
                .iter()
                .zip(&node.import_targets)
                .find(|(edge, _)| edge.statement == index)
                .map(|(_, target)| target)
                .or_else(|| {
                    node.edges
                        .exports
                        .iter()
                        .zip(&node.export_targets)
                        .find(|(edge, _)| edge.statement() == index)
                        .map(|(_, target)| target)
                });
            match target {
                Some(Some(EdgeTarget::Internal(next))) => child_module_name(options, graph, *next),
                _ => written.to_string(),
            }
        };

        let mut body = Vec::new();
        for (index, stmt) in source.statements.iter().enumerate() {
            match stmt {
                Statement::AmbientModule { text, .. } => {
                    hoisted.push(OutputNode::text(text.clone()));
                }
                Statement::NamespaceExport { .. } | Statement::Unrecognized { .. } => {}
                _ => {
                    if let Some(text) = render_statement(stmt, |s| specifier_for(index, s)) {
                        body.push(OutputNode::text(text));
                    }
                }
            }
        }
        if body.is_empty() {
            continue;
        }
        blocks.push(OutputNode::block(
            format!("declare module '{}'", child_module_name(options, graph, id)),
            body,
        ));
    }

    let mut declarations = Vec::new();
    if !hoisted.is_empty() {
        declarations.append(&mut hoisted);
        declarations.push(OutputNode::Blank);
    }
    for block in blocks {
        declarations.push(block);
        declarations.push(OutputNode::Blank);
    }
    declarations.pop();

    let binding = &options.import_binding_name;
    let mut exported = binding.clone();
    if let Some(export) = options.entry_export() {
        exported = format!("{exported}.{}", identifier_name(export, &options.default_name));
    }
    let mut index = vec![
        OutputNode::line(format!(
            "/// <reference path='./{}.d.ts' />",
            options.module_name
        )),
        OutputNode::Blank,
        OutputNode::line(format!(
            "import {binding} = require('{}');",
            child_module_name(options, graph, entry)
        )),
        OutputNode::line(format!("export = {exported};")),
    ];
    index.extend(root_name_section(options, &exported));

    let externals: BTreeSet<&PathBuf> = graph
        .iter()
        .flat_map(|(_, node)| node.import_targets.iter().chain(&node.export_targets))
        .filter_map(|target| match target {
            Some(EdgeTarget::External(path)) => Some(path),
            _ => None,
        })
        .collect();

    let dir = options.out_dir.join(&options.module_name);
    let main_path = dir.join(format!("{}.d.ts", options.module_name));
    let index_path = dir.join("index.d.ts");
    tracing::debug!(
        file = %main_path.display(),
        modules = graph.len(),
        "module bundle emitted"
    );

    Emission {
        files: [
            (main_path, printer.print(&with_banner(declarations, options))),
            (index_path, printer.print(&with_banner(index, options))),
        ]
        .into_iter()
        .collect(),
        diagnostics: Vec::new(),
        external_modules: externals.len(),
    }
}

/// Source text of a statement inside a `declare module` block, with module
/// specifiers passed through `rewrite`.
fn render_statement(stmt: &Statement, rewrite: impl Fn(&str) -> String) -> Option<String> {
    let text = match stmt {
        Statement::Import(import) => render_import(import, &rewrite(&import.source)),
        Statement::ImportEquals(ImportEquals {
            exported,
            name,
            reference,
        }) => {
            let export = if *exported { "export " } else { "" };
            match reference {
                ModuleReference::External(spec) => {
                    format!("{export}import {name} = require('{}');", rewrite(spec))
                }
                ModuleReference::Entity(entity) => format!("{export}import {name} = {entity};"),
            }
        }
        Statement::ExportList(list) => render_export_list(list, rewrite),
        Statement::ExportAll(ExportAll { alias, source }) => match alias {
            Some(alias) => format!("export * as {alias} from '{}';", rewrite(source)),
            None => format!("export * from '{}';", rewrite(source)),
        },
        Statement::ExportAssignment(assignment) => {
            let keyword = if assignment.is_equals { "=" } else { "default" };
            format!("export {keyword} {};", assignment.expression)
        }
        Statement::Declaration(decl) => decl.to_source(Modifiers {
            declare: false,
            ..decl.modifiers
        }),
        Statement::GlobalAugmentation { text, .. } => text.clone(),
        Statement::NamespaceExport { .. }
        | Statement::AmbientModule { .. }
        | Statement::Unrecognized { .. } => return None,
    };
    Some(text)
}

fn render_import(import: &ImportDeclaration, source: &str) -> String {
    if !import.has_bindings() {
        return format!("import '{source}';");
    }
    let mut clauses = Vec::new();
    if let Some(default) = &import.default_binding {
        clauses.push(default.clone());
    }
    if let Some(namespace) = &import.namespace_binding {
        clauses.push(format!("* as {namespace}"));
    }
    if !import.named.is_empty() {
        let named: Vec<String> = import
            .named
            .iter()
            .map(|s| {
                if s.imported == s.local {
                    s.local.clone()
                } else {
                    format!("{} as {}", s.imported, s.local)
                }
            })
            .collect();
        clauses.push(format!("{{ {} }}", named.join(", ")));
    }
    let type_only = if import.type_only { "type " } else { "" };
    format!("import {type_only}{} from '{source}';", clauses.join(", "))
}

fn render_export_list(list: &ExportList, rewrite: impl Fn(&str) -> String) -> String {
    let specifiers: Vec<String> = list
        .specifiers
        .iter()
        .map(|s| {
            if s.local == s.exported {
                s.local.clone()
            } else {
                format!("{} as {}", s.local, s.exported)
            }
        })
        .collect();
    let type_only = if list.type_only { "type " } else { "" };
    let from = list
        .source
        .as_deref()
        .map(|source| format!(" from '{}'", rewrite(source)))
        .unwrap_or_default();
    format!("export {type_only}{{ {} }}{from};", specifiers.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ImportSpecifier;

    fn same(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn test_render_import_clauses() {
        let import = ImportDeclaration {
            source: "./b".into(),
            default_binding: Some("B".into()),
            namespace_binding: None,
            named: vec![ImportSpecifier::new("x", "x"), ImportSpecifier::new("y", "z")],
            type_only: true,
        };
        assert_eq!(
            render_import(&import, "lib/b"),
            "import type B, { x, y as z } from 'lib/b';"
        );
        assert_eq!(
            render_import(&ImportDeclaration::side_effect("./p"), "./p"),
            "import './p';"
        );
    }

    #[test]
    fn test_render_export_list() {
        let list = ExportList::from_source("./b", &[("A", "A"), ("C", "D")]);
        assert_eq!(
            render_export_list(&list, |_| "lib/b".to_string()),
            "export { A, C as D } from 'lib/b';"
        );
        assert_eq!(
            render_export_list(&ExportList::local(&[("a", "a")]), same),
            "export { a };"
        );
    }

    #[test]
    fn test_declarations_lose_declare_only() {
        let decl = crate::syntax::Declaration::new(
            crate::syntax::DeclarationKind::Function,
            Some("f"),
            "function f(): void;",
        )
        .exported();
        assert_eq!(
            render_statement(&Statement::Declaration(decl), same).as_deref(),
            Some("export function f(): void;")
        );
    }
}
