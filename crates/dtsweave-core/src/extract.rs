//! Import/export edge extraction for a single module.

use crate::naming::{alias_entity_name, entity_names};
use crate::syntax::{ModuleReference, SourceModule, Statement};
use crate::types::{
    Diagnostic, DiagnosticKind, ExportEdge, ImportEdge, ImportedName, ModuleEdges,
    NamedExportItem,
};

/// Extracts the import and export edges of `module` in file order.
///
/// Statements that could not be lowered contribute no edges and are
/// reported as [`DiagnosticKind::MalformedDeclaration`].
pub fn extract_edges(module: &SourceModule) -> (ModuleEdges, Vec<Diagnostic>) {
    let mut edges = ModuleEdges::default();
    let mut diagnostics = Vec::new();

    for (statement, stmt) in module.statements.iter().enumerate() {
        match stmt {
            Statement::Import(import) => {
                let edge = |local: &str, source_name: ImportedName| ImportEdge {
                    local_name: Some(local.to_string()),
                    source_name: Some(source_name),
                    module_specifier: import.source.clone(),
                    entity_alias: false,
                    statement,
                };
                if !import.has_bindings() {
                    edges.imports.push(ImportEdge {
                        local_name: None,
                        source_name: None,
                        module_specifier: import.source.clone(),
                        entity_alias: false,
                        statement,
                    });
                }
                if let Some(local) = &import.default_binding {
                    edges.imports.push(edge(local, ImportedName::Default));
                }
                if let Some(local) = &import.namespace_binding {
                    edges.imports.push(edge(local, ImportedName::Namespace));
                }
                for specifier in &import.named {
                    edges.imports.push(edge(
                        &specifier.local,
                        ImportedName::from_export_name(&specifier.imported),
                    ));
                }
            }
            Statement::ImportEquals(import) => {
                edges.imports.push(ImportEdge {
                    local_name: Some(import.name.clone()),
                    source_name: None,
                    module_specifier: import.reference.text().to_string(),
                    entity_alias: matches!(import.reference, ModuleReference::Entity(_)),
                    statement,
                });
                if import.exported {
                    edges.exports.push(ExportEdge::Local {
                        named_exports: vec![alias_entity_name(import)],
                        statement,
                    });
                }
            }
            Statement::ExportList(list) => {
                let named_exports = list
                    .specifiers
                    .iter()
                    .map(|s| NamedExportItem::new(s.exported.clone(), Some(&s.local)))
                    .collect();
                edges.exports.push(match &list.source {
                    Some(source) => ExportEdge::ReExport {
                        module_specifier: source.clone(),
                        named_exports,
                        statement,
                    },
                    None => ExportEdge::Local {
                        named_exports,
                        statement,
                    },
                });
            }
            Statement::ExportAll(all) => {
                let named_exports = all
                    .alias
                    .iter()
                    .map(|alias| NamedExportItem::new(alias.clone(), Some("*")))
                    .collect();
                edges.exports.push(ExportEdge::ReExport {
                    module_specifier: all.source.clone(),
                    named_exports,
                    statement,
                });
            }
            Statement::ExportAssignment(assignment) => {
                edges.exports.push(if assignment.is_equals {
                    ExportEdge::Assignment {
                        base_name: assignment.expression.clone(),
                        statement,
                    }
                } else {
                    ExportEdge::Local {
                        named_exports: vec![NamedExportItem::new(
                            "default",
                            Some(&assignment.expression),
                        )],
                        statement,
                    }
                });
            }
            Statement::Declaration(decl) if decl.modifiers.export => {
                edges.exports.push(ExportEdge::Local {
                    named_exports: entity_names(decl),
                    statement,
                });
            }
            Statement::Unrecognized { text } => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MalformedDeclaration,
                    &module.path,
                    format!("skipping unrecognized statement: {}", excerpt(text)),
                ));
            }
            Statement::Declaration(_)
            | Statement::NamespaceExport { .. }
            | Statement::GlobalAugmentation { .. }
            | Statement::AmbientModule { .. } => {}
        }
    }

    (edges, diagnostics)
}

fn excerpt(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    if line.chars().count() > 60 {
        let cut: String = line.chars().take(57).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{
        Declaration, DeclarationKind, ExportAll, ExportAssignment, ExportList,
        ImportDeclaration, ImportEquals, ImportSpecifier,
    };

    fn module(statements: Vec<Statement>) -> SourceModule {
        SourceModule::new("/p/a.d.ts", statements)
    }

    #[test]
    fn test_import_bindings_yield_one_edge_each() {
        let import = ImportDeclaration {
            source: "./b".into(),
            default_binding: Some("B".into()),
            namespace_binding: None,
            named: vec![
                ImportSpecifier::new("x", "x"),
                ImportSpecifier::new("y", "z"),
                ImportSpecifier::new("default", "D"),
            ],
            type_only: false,
        };
        let (edges, diagnostics) = extract_edges(&module(vec![Statement::Import(import)]));
        assert!(diagnostics.is_empty());
        let pairs: Vec<(Option<&str>, Option<ImportedName>)> = edges
            .imports
            .iter()
            .map(|e| (e.local_name.as_deref(), e.source_name.clone()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (Some("B"), Some(ImportedName::Default)),
                (Some("x"), Some(ImportedName::Named("x".into()))),
                (Some("z"), Some(ImportedName::Named("y".into()))),
                (Some("D"), Some(ImportedName::Default)),
            ]
        );
    }

    #[test]
    fn test_namespace_and_side_effect_imports() {
        let (edges, _) = extract_edges(&module(vec![
            Statement::Import(ImportDeclaration::namespace("./b", "ns")),
            Statement::Import(ImportDeclaration::side_effect("./polyfill")),
        ]));
        assert_eq!(edges.imports[0].source_name, Some(ImportedName::Namespace));
        assert_eq!(edges.imports[0].used_export(), None);
        assert_eq!(edges.imports[1].local_name, None);
        assert_eq!(edges.imports[1].statement, 1);
    }

    #[test]
    fn test_exported_import_equals_is_import_and_export() {
        let (edges, _) = extract_edges(&module(vec![Statement::ImportEquals(ImportEquals {
            exported: true,
            name: "Ext".into(),
            reference: ModuleReference::External("ext".into()),
        })]));
        assert_eq!(edges.imports.len(), 1);
        assert_eq!(edges.imports[0].source_name, None);
        assert!(!edges.imports[0].entity_alias);
        assert_eq!(
            edges.exports,
            vec![ExportEdge::Local {
                named_exports: vec![NamedExportItem::new("Ext", None)],
                statement: 0
            }]
        );
    }

    #[test]
    fn test_entity_alias_is_flagged() {
        let (edges, _) = extract_edges(&module(vec![Statement::ImportEquals(ImportEquals {
            exported: false,
            name: "C".into(),
            reference: ModuleReference::Entity("A.B.C".into()),
        })]));
        assert!(edges.imports[0].entity_alias);
        assert!(edges.exports.is_empty());
    }

    #[test]
    fn test_export_lists_and_star() {
        let (edges, _) = extract_edges(&module(vec![
            Statement::ExportList(ExportList::from_source("./b", &[("A", "B"), ("c", "c")])),
            Statement::ExportAll(ExportAll::new("./c")),
            Statement::ExportList(ExportList::local(&[("x", "y")])),
        ]));
        assert_eq!(
            edges.exports[0].named_exports(),
            &[
                NamedExportItem::new("B", Some("A")),
                NamedExportItem::new("c", None)
            ]
        );
        assert!(edges.exports[1].is_star());
        assert!(matches!(edges.exports[2], ExportEdge::Local { .. }));
    }

    #[test]
    fn test_namespace_reexport_item() {
        let (edges, _) = extract_edges(&module(vec![Statement::ExportAll(ExportAll {
            alias: Some("ns".into()),
            source: "./b".into(),
        })]));
        let items = edges.exports[0].named_exports();
        assert_eq!(items.len(), 1);
        assert!(items[0].is_namespace_reexport());
        assert!(!edges.exports[0].is_star());
    }

    #[test]
    fn test_assignment_and_default_exports() {
        let (edges, _) = extract_edges(&module(vec![
            Statement::ExportAssignment(ExportAssignment::equals("Foo")),
            Statement::ExportAssignment(ExportAssignment::default_value("bar")),
        ]));
        assert_eq!(
            edges.exports[0],
            ExportEdge::Assignment {
                base_name: "Foo".into(),
                statement: 0
            }
        );
        assert_eq!(
            edges.exports[1].named_exports(),
            &[NamedExportItem::new("default", Some("bar"))]
        );
    }

    #[test]
    fn test_exported_declarations_only() {
        let (edges, _) = extract_edges(&module(vec![
            Statement::Declaration(Declaration::new(
                DeclarationKind::Interface,
                Some("Hidden"),
                "interface Hidden {}",
            )),
            Statement::Declaration(
                Declaration::new(DeclarationKind::Interface, Some("Shown"), "interface Shown {}")
                    .exported(),
            ),
        ]));
        assert_eq!(edges.exports.len(), 1);
        assert_eq!(edges.exports[0].statement(), 1);
    }

    #[test]
    fn test_unrecognized_statement_warns() {
        let (edges, diagnostics) =
            extract_edges(&module(vec![Statement::unrecognized("export ??? nonsense")]));
        assert!(edges.imports.is_empty() && edges.exports.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::MalformedDeclaration);
    }
}
