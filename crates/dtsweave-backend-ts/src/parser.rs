//! Lowers oxc's TypeScript AST into the dtsweave declaration model.

use crate::references::collect_references;
use dtsweave_core::{
    Declaration, DeclarationKind, DeclarationParser, Error, ExportAll, ExportAssignment,
    ExportList, ExportSpecifier, ImportDeclaration, ImportEquals, ImportSpecifier, Modifiers,
    ModuleReference, Result, SourceModule, Statement, VariableDeclarator, VariableKind,
};
use oxc_allocator::Allocator;
use oxc_ast::ast;
use oxc_ast_visit::Visit;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use std::collections::BTreeSet;
use std::path::Path;

/// [`DeclarationParser`] backed by `oxc_parser`.
///
/// Declaration bodies are kept as source text; only top-level structure and
/// referenced identifiers are lowered.
#[derive(Debug, Default, Clone, Copy)]
pub struct OxcDeclarationParser;

impl OxcDeclarationParser {
    pub fn new() -> Self {
        Self
    }
}

impl DeclarationParser for OxcDeclarationParser {
    fn parse(&self, path: &Path, text: &str) -> Result<SourceModule> {
        let allocator = Allocator::default();
        let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::d_ts());
        let ret = Parser::new(&allocator, text, source_type).parse();

        if ret.panicked {
            let message = ret
                .errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unrecoverable syntax error".to_string());
            return Err(Error::Parse {
                file: path.to_path_buf(),
                message,
            });
        }
        for error in &ret.errors {
            tracing::warn!(file = %path.display(), "{error}");
        }

        let lowering = Lowering { text };
        let statements = ret
            .program
            .body
            .iter()
            .map(|stmt| lowering.statement(stmt))
            .collect::<Vec<_>>();
        tracing::trace!(file = %path.display(), statements = statements.len(), "parsed");
        Ok(SourceModule::new(path, statements))
    }
}

struct Lowering<'s> {
    text: &'s str,
}

impl<'s> Lowering<'s> {
    fn slice(&self, span: Span) -> &'s str {
        self.text
            .get(span.start as usize..span.end as usize)
            .unwrap_or_default()
    }

    fn statement(&self, stmt: &ast::Statement<'_>) -> Statement {
        match stmt {
            ast::Statement::ImportDeclaration(import) => Statement::Import(self.import(import)),
            ast::Statement::ExportAllDeclaration(all) => Statement::ExportAll(ExportAll {
                alias: all.exported.as_ref().map(|e| e.name().to_string()),
                source: all.source.value.to_string(),
            }),
            ast::Statement::ExportNamedDeclaration(named) => self.export_named(named),
            ast::Statement::ExportDefaultDeclaration(default) => self.export_default(default),
            ast::Statement::TSExportAssignment(assignment) => {
                let expression = self.slice(assignment.expression.span()).trim();
                let mut lowered = ExportAssignment::equals(expression);
                lowered.references =
                    collect_references(|v| v.visit_expression(&assignment.expression));
                Statement::ExportAssignment(lowered)
            }
            ast::Statement::TSNamespaceExportDeclaration(export) => Statement::NamespaceExport {
                name: export.id.name.to_string(),
            },
            other => match other.as_declaration() {
                Some(decl) => self.declaration(decl, false),
                None => Statement::unrecognized(self.slice(other.span())),
            },
        }
    }

    fn import(&self, import: &ast::ImportDeclaration<'_>) -> ImportDeclaration {
        let mut lowered = ImportDeclaration {
            source: import.source.value.to_string(),
            type_only: import.import_kind.is_type(),
            ..ImportDeclaration::default()
        };
        for specifier in import.specifiers.iter().flatten() {
            match specifier {
                ast::ImportDeclarationSpecifier::ImportSpecifier(s) => lowered
                    .named
                    .push(ImportSpecifier::new(s.imported.name().to_string(), s.local.name.to_string())),
                ast::ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    lowered.default_binding = Some(s.local.name.to_string());
                }
                ast::ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                    lowered.namespace_binding = Some(s.local.name.to_string());
                }
            }
        }
        lowered
    }

    fn export_named(&self, named: &ast::ExportNamedDeclaration<'_>) -> Statement {
        if let Some(decl) = &named.declaration {
            return self.declaration(decl, true);
        }
        Statement::ExportList(ExportList {
            specifiers: named
                .specifiers
                .iter()
                .map(|s| ExportSpecifier::new(s.local.name().to_string(), s.exported.name().to_string()))
                .collect(),
            source: named.source.as_ref().map(|s| s.value.to_string()),
            type_only: named.export_kind.is_type(),
        })
    }

    fn export_default(&self, default: &ast::ExportDefaultDeclaration<'_>) -> Statement {
        use ast::ExportDefaultDeclarationKind as Kind;

        let raw = self.slice(default.declaration.span());
        let references = collect_references(|v| v.visit_export_default_declaration(default));
        let (kind, name) = match &default.declaration {
            Kind::FunctionDeclaration(function) => (DeclarationKind::Function, binding_name(&function.id)),
            Kind::ClassDeclaration(class) => (DeclarationKind::Class, binding_name(&class.id)),
            Kind::TSInterfaceDeclaration(interface) => {
                (DeclarationKind::Interface, Some(interface.id.name.as_str()))
            }
            _ => {
                let expression = raw.trim().trim_end_matches(';').trim_end();
                let mut lowered = ExportAssignment::default_value(expression);
                lowered.references = references;
                return Statement::ExportAssignment(lowered);
            }
        };
        let (_, body) = strip_modifiers(raw);
        let mut decl = Declaration::new(kind, name, body).as_default();
        decl.references = references;
        Statement::Declaration(decl)
    }

    fn declaration(&self, decl: &ast::Declaration<'_>, export: bool) -> Statement {
        let raw = self.slice(decl.span());
        let (stripped, body) = strip_modifiers(raw);
        let references = collect_references(|v| v.visit_declaration(decl));
        let modifiers = |declare: bool| Modifiers {
            export,
            default: false,
            declare: declare || stripped.declare,
        };

        let (kind, name, declare) = match decl {
            ast::Declaration::VariableDeclaration(var) => {
                return self.variable(var, modifiers(var.declare));
            }
            ast::Declaration::TSImportEqualsDeclaration(import) => {
                return Statement::ImportEquals(self.import_equals(import, export));
            }
            ast::Declaration::FunctionDeclaration(function) => {
                (DeclarationKind::Function, binding_name(&function.id), function.declare)
            }
            ast::Declaration::ClassDeclaration(class) => {
                (DeclarationKind::Class, binding_name(&class.id), class.declare)
            }
            ast::Declaration::TSTypeAliasDeclaration(alias) => {
                (DeclarationKind::TypeAlias, Some(alias.id.name.as_str()), alias.declare)
            }
            ast::Declaration::TSInterfaceDeclaration(interface) => (
                DeclarationKind::Interface,
                Some(interface.id.name.as_str()),
                interface.declare,
            ),
            ast::Declaration::TSEnumDeclaration(e) => {
                (DeclarationKind::Enum, Some(e.id.name.as_str()), e.declare)
            }
            ast::Declaration::TSModuleDeclaration(module) => match &module.id {
                ast::TSModuleDeclarationName::StringLiteral(name) => {
                    return Statement::AmbientModule {
                        name: name.value.to_string(),
                        text: format!("declare {body}"),
                        references,
                    };
                }
                ast::TSModuleDeclarationName::Identifier(id) => {
                    (DeclarationKind::Namespace, Some(id.name.as_str()), module.declare)
                }
            },
            ast::Declaration::TSGlobalDeclaration(_) => {
                return global_augmentation(body, references);
            }
        };

        let mut lowered = Declaration::new(kind, name, body);
        lowered.modifiers = modifiers(declare);
        lowered.references = references;
        Statement::Declaration(lowered)
    }

    fn variable(&self, var: &ast::VariableDeclaration<'_>, modifiers: Modifiers) -> Statement {
        let kind = match var.kind {
            ast::VariableDeclarationKind::Var => VariableKind::Var,
            ast::VariableDeclarationKind::Let => VariableKind::Let,
            ast::VariableDeclarationKind::Const => VariableKind::Const,
            _ => return Statement::unrecognized(self.slice(var.span)),
        };
        let declarators: Vec<VariableDeclarator> = var
            .declarations
            .iter()
            .filter_map(|declarator| {
                let text = self.slice(declarator.span).trim();
                let name = leading_identifier(text)?;
                Some(VariableDeclarator {
                    name: name.to_string(),
                    text: text.to_string(),
                    references: collect_references(|v| v.visit_variable_declarator(declarator)),
                })
            })
            .collect();
        if declarators.is_empty() {
            return Statement::unrecognized(self.slice(var.span));
        }
        let mut decl = Declaration::variable(kind, declarators);
        decl.modifiers = modifiers;
        Statement::Declaration(decl)
    }

    fn import_equals(&self, import: &ast::TSImportEqualsDeclaration<'_>, exported: bool) -> ImportEquals {
        let reference = match &import.module_reference {
            ast::TSModuleReference::ExternalModuleReference(external) => {
                ModuleReference::External(external.expression.value.to_string())
            }
            other => ModuleReference::Entity(self.slice(other.span()).trim().to_string()),
        };
        ImportEquals {
            exported,
            name: import.id.name.to_string(),
            reference,
        }
    }
}

fn binding_name<'a>(id: &'a Option<ast::BindingIdentifier<'_>>) -> Option<&'a str> {
    id.as_ref().map(|id| id.name.as_str())
}

fn global_augmentation(body: &str, references: BTreeSet<String>) -> Statement {
    Statement::GlobalAugmentation {
        text: format!("declare {body}"),
        references,
    }
}

/// Leading qualifiers removed by [`strip_modifiers`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Stripped {
    export: bool,
    default: bool,
    declare: bool,
}

/// Splits leading `export`, `default` and `declare` keywords off `text`.
fn strip_modifiers(text: &str) -> (Stripped, &str) {
    let mut stripped = Stripped::default();
    let mut rest = text.trim_start();
    loop {
        let Some(word) = leading_identifier(rest) else {
            break;
        };
        let flag = match word {
            "export" => &mut stripped.export,
            "default" => &mut stripped.default,
            "declare" => &mut stripped.declare,
            _ => break,
        };
        let after = &rest[word.len()..];
        if !after.starts_with(char::is_whitespace) {
            break;
        }
        *flag = true;
        rest = after.trim_start();
    }
    (stripped, rest.trim_end())
}

/// The identifier `text` starts with.
fn leading_identifier(text: &str) -> Option<&str> {
    let end = text
        .char_indices()
        .find(|(i, c)| {
            let valid = c.is_alphanumeric() || *c == '_' || *c == '$';
            !valid || (*i == 0 && c.is_ascii_digit())
        })
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    (end > 0).then(|| &text[..end])
}
