//! Declaration model consumed by every analysis pass.
//!
//! A [`SourceModule`] is the lowered form of one declaration file. The parser
//! collaborator keeps declaration bodies as source text and records which
//! identifiers each statement references; the passes in this crate never need
//! more structure than that.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// One parsed declaration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceModule {
    pub path: PathBuf,
    pub statements: Vec<Statement>,
}

impl SourceModule {
    pub fn new(path: impl Into<PathBuf>, statements: Vec<Statement>) -> Self {
        Self {
            path: path.into(),
            statements,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A file without any import or export statement is a global script.
    pub fn is_module(&self) -> bool {
        self.statements.iter().any(Statement::is_module_syntax)
    }
}

/// Top-level statement of a declaration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Statement {
    Import(ImportDeclaration),
    ImportEquals(ImportEquals),
    ExportList(ExportList),
    ExportAll(ExportAll),
    ExportAssignment(ExportAssignment),
    /// `export as namespace X;`
    NamespaceExport { name: String },
    Declaration(Declaration),
    /// `declare global { ... }`, kept verbatim.
    GlobalAugmentation {
        text: String,
        references: BTreeSet<String>,
    },
    /// `declare module 'name' { ... }`, kept verbatim.
    AmbientModule {
        name: String,
        text: String,
        references: BTreeSet<String>,
    },
    /// A statement the parser could not lower.
    Unrecognized { text: String },
}

impl Statement {
    pub fn is_module_syntax(&self) -> bool {
        match self {
            Statement::Import(_)
            | Statement::ExportList(_)
            | Statement::ExportAll(_)
            | Statement::ExportAssignment(_) => true,
            Statement::ImportEquals(import) => {
                import.exported || matches!(import.reference, ModuleReference::External(_))
            }
            Statement::Declaration(decl) => decl.modifiers.export,
            _ => false,
        }
    }

    pub fn global(text: impl Into<String>, references: &[&str]) -> Self {
        Statement::GlobalAugmentation {
            text: text.into(),
            references: references.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn unrecognized(text: impl Into<String>) -> Self {
        Statement::Unrecognized { text: text.into() }
    }
}

/// `import d, * as ns from 'x'`, `import { a as b } from 'x'`, `import 'x'`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportDeclaration {
    pub source: String,
    pub default_binding: Option<String>,
    pub namespace_binding: Option<String>,
    pub named: Vec<ImportSpecifier>,
    pub type_only: bool,
}

impl ImportDeclaration {
    pub fn side_effect(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn named(source: impl Into<String>, names: &[(&str, &str)]) -> Self {
        Self {
            source: source.into(),
            named: names
                .iter()
                .map(|(imported, local)| ImportSpecifier::new(*imported, *local))
                .collect(),
            ..Default::default()
        }
    }

    pub fn namespace(source: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            namespace_binding: Some(local.into()),
            ..Default::default()
        }
    }

    pub fn default_import(source: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            default_binding: Some(local.into()),
            ..Default::default()
        }
    }

    /// Local names bound by this import, in source order.
    pub fn bindings(&self) -> impl Iterator<Item = &str> {
        self.default_binding
            .iter()
            .chain(self.namespace_binding.iter())
            .map(String::as_str)
            .chain(self.named.iter().map(|s| s.local.as_str()))
    }

    pub fn has_bindings(&self) -> bool {
        self.bindings().next().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpecifier {
    pub imported: String,
    pub local: String,
}

impl ImportSpecifier {
    pub fn new(imported: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            imported: imported.into(),
            local: local.into(),
        }
    }
}

/// `[export] import X = require('x')` or `[export] import X = A.B`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEquals {
    pub exported: bool,
    pub name: String,
    pub reference: ModuleReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ModuleReference {
    External(String),
    Entity(String),
}

impl ModuleReference {
    pub fn text(&self) -> &str {
        match self {
            ModuleReference::External(s) | ModuleReference::Entity(s) => s,
        }
    }
}

/// `export { a, b as c } [from 'x']`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportList {
    pub specifiers: Vec<ExportSpecifier>,
    pub source: Option<String>,
    pub type_only: bool,
}

impl ExportList {
    pub fn local(names: &[(&str, &str)]) -> Self {
        Self {
            specifiers: names
                .iter()
                .map(|(local, exported)| ExportSpecifier::new(*local, *exported))
                .collect(),
            ..Default::default()
        }
    }

    pub fn from_source(source: impl Into<String>, names: &[(&str, &str)]) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::local(names)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
}

impl ExportSpecifier {
    pub fn new(local: impl Into<String>, exported: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            exported: exported.into(),
        }
    }
}

/// `export * [as alias] from 'x'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportAll {
    pub alias: Option<String>,
    pub source: String,
}

impl ExportAll {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            alias: None,
            source: source.into(),
        }
    }
}

/// `export = expr` (`is_equals`) or `export default expr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportAssignment {
    pub is_equals: bool,
    pub expression: String,
    pub references: BTreeSet<String>,
}

impl ExportAssignment {
    pub fn equals(expression: impl Into<String>) -> Self {
        Self::build(true, expression.into())
    }

    pub fn default_value(expression: impl Into<String>) -> Self {
        Self::build(false, expression.into())
    }

    fn build(is_equals: bool, expression: String) -> Self {
        let references = root_identifier(&expression)
            .map(|root| BTreeSet::from([root.to_string()]))
            .unwrap_or_default();
        Self {
            is_equals,
            expression,
            references,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Function,
    Class,
    Interface,
    TypeAlias,
    Enum,
    Namespace,
    Variable(VariableKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

impl VariableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
        }
    }
}

/// Leading qualifiers of a top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub export: bool,
    pub default: bool,
    pub declare: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        export: false,
        default: false,
        declare: false,
    };

    pub fn exported() -> Self {
        Self {
            export: true,
            declare: true,
            ..Self::NONE
        }
    }
}

/// A top-level declaration. `text` never contains the leading qualifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub modifiers: Modifiers,
    pub name: Option<String>,
    pub text: String,
    pub declarators: Vec<VariableDeclarator>,
    pub references: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDeclarator {
    pub name: String,
    pub text: String,
    pub references: BTreeSet<String>,
}

impl Declaration {
    pub fn new(kind: DeclarationKind, name: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            kind,
            modifiers: Modifiers {
                declare: true,
                ..Modifiers::NONE
            },
            name: name.map(str::to_string),
            text: text.into(),
            declarators: Vec::new(),
            references: BTreeSet::new(),
        }
    }

    pub fn variable(kind: VariableKind, declarators: Vec<VariableDeclarator>) -> Self {
        let references = declarators
            .iter()
            .flat_map(|d| d.references.iter().cloned())
            .collect();
        let mut decl = Self::new(DeclarationKind::Variable(kind), None, String::new());
        decl.declarators = declarators;
        decl.references = references;
        decl.text = decl.variable_text();
        decl
    }

    pub fn exported(mut self) -> Self {
        self.modifiers.export = true;
        self
    }

    pub fn as_default(mut self) -> Self {
        self.modifiers.export = true;
        self.modifiers.default = true;
        self.modifiers.declare = false;
        self
    }

    pub fn with_references(mut self, references: &[&str]) -> Self {
        self.references = references.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, DeclarationKind::Variable(_))
    }

    /// Local names introduced by the declaration. An anonymous declaration
    /// binds nothing.
    pub fn local_names(&self) -> Vec<&str> {
        if self.is_variable() {
            self.declarators.iter().map(|d| d.name.as_str()).collect()
        } else {
            self.name.as_deref().into_iter().collect()
        }
    }

    /// Keep only the variable declarators accepted by `keep`.
    pub fn retain_declarators(&self, mut keep: impl FnMut(&VariableDeclarator) -> bool) -> Self {
        let mut decl = self.clone();
        decl.declarators.retain(|d| keep(d));
        decl.references = decl
            .declarators
            .iter()
            .flat_map(|d| d.references.iter().cloned())
            .collect();
        decl.text = decl.variable_text();
        decl
    }

    /// Gives an anonymous `function`/`class` declaration a name.
    pub fn with_name(&self, name: &str) -> Self {
        let mut decl = self.clone();
        if self.name.is_some() {
            return decl;
        }
        let keyword = match self.kind {
            DeclarationKind::Function => "function",
            DeclarationKind::Class => "class",
            _ => return decl,
        };
        if let Some(pos) = self.text.find(keyword) {
            let (head, rest) = self.text.split_at(pos + keyword.len());
            decl.text = format!("{head} {name}{rest}");
            decl.name = Some(name.to_string());
        }
        decl
    }

    /// Source text with the given qualifiers in front.
    pub fn to_source(&self, modifiers: Modifiers) -> String {
        let mut out = String::new();
        if modifiers.export {
            out.push_str("export ");
        }
        if modifiers.default {
            out.push_str("default ");
        }
        if modifiers.declare && !modifiers.default {
            out.push_str("declare ");
        }
        out.push_str(&self.text);
        out
    }

    fn variable_text(&self) -> String {
        match self.kind {
            DeclarationKind::Variable(kind) => {
                let parts: Vec<&str> = self.declarators.iter().map(|d| d.text.as_str()).collect();
                format!("{} {};", kind.as_str(), parts.join(", "))
            }
            _ => self.text.clone(),
        }
    }
}

impl VariableDeclarator {
    pub fn new(name: impl Into<String>, text: impl Into<String>, references: &[&str]) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            references: references.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// First identifier of a dotted entity name, `A` for `A.B.C`.
pub fn root_identifier(entity: &str) -> Option<&str> {
    let root = entity.split('.').next()?.trim();
    let valid = root
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && root
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    valid.then_some(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_script_detection() {
        let script = SourceModule::new(
            "globals.d.ts",
            vec![Statement::Declaration(Declaration::new(
                DeclarationKind::Interface,
                Some("Window"),
                "interface Window {}",
            ))],
        );
        assert!(!script.is_module());

        let module = SourceModule::new(
            "a.d.ts",
            vec![Statement::Declaration(
                Declaration::new(DeclarationKind::Interface, Some("A"), "interface A {}")
                    .exported(),
            )],
        );
        assert!(module.is_module());
    }

    #[test]
    fn test_entity_import_is_not_module_syntax() {
        let alias = Statement::ImportEquals(ImportEquals {
            exported: false,
            name: "X".into(),
            reference: ModuleReference::Entity("A.B".into()),
        });
        assert!(!alias.is_module_syntax());
    }

    #[test]
    fn test_to_source_modifiers() {
        let decl = Declaration::new(
            DeclarationKind::Function,
            Some("f"),
            "function f(): void;",
        )
        .exported();
        assert_eq!(
            decl.to_source(decl.modifiers),
            "export declare function f(): void;"
        );
        assert_eq!(decl.to_source(Modifiers::NONE), "function f(): void;");
    }

    #[test]
    fn test_with_name_patches_anonymous_default() {
        let decl = Declaration::new(
            DeclarationKind::Function,
            None,
            "function(a: string): void;",
        )
        .as_default();
        let named = decl.with_name("_default");
        assert_eq!(named.text, "function _default(a: string): void;");
        assert_eq!(named.name.as_deref(), Some("_default"));

        let class = Declaration::new(DeclarationKind::Class, None, "class {}").with_name("X");
        assert_eq!(class.text, "class X {}");
    }

    #[test]
    fn test_retain_declarators_rebuilds_text() {
        let decl = Declaration::variable(
            VariableKind::Const,
            vec![
                VariableDeclarator::new("a", "a: number", &[]),
                VariableDeclarator::new("b", "b: Foo", &["Foo"]),
            ],
        );
        assert_eq!(decl.text, "const a: number, b: Foo;");

        let kept = decl.retain_declarators(|d| d.name == "a");
        assert_eq!(kept.text, "const a: number;");
        assert!(kept.references.is_empty());
    }

    #[test]
    fn test_root_identifier() {
        assert_eq!(root_identifier("A.B.C"), Some("A"));
        assert_eq!(root_identifier("foo"), Some("foo"));
        assert_eq!(root_identifier("{ a: 1 }"), None);
        assert_eq!(root_identifier("1"), None);
    }
}
