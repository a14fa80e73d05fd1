//! Edge, diagnostic and option types shared by the passes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name an import pulls from its target module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportedName {
    Default,
    /// `* as ns`
    Namespace,
    Named(String),
}

impl ImportedName {
    pub fn from_export_name(name: &str) -> Self {
        match name {
            "default" => ImportedName::Default,
            "*" => ImportedName::Namespace,
            other => ImportedName::Named(other.to_string()),
        }
    }

    /// The export this import consumes, `None` when it consumes the whole module.
    pub fn export_name(&self) -> Option<&str> {
        match self {
            ImportedName::Default => Some("default"),
            ImportedName::Namespace => None,
            ImportedName::Named(name) => Some(name),
        }
    }
}

/// What a module consumes from another module specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    /// Absent for side-effect imports.
    pub local_name: Option<String>,
    /// Absent for `import X = require('x')`, which imports the module itself.
    pub source_name: Option<ImportedName>,
    pub module_specifier: String,
    /// `import X = A.B`: the specifier is an entity name, not a module.
    pub entity_alias: bool,
    /// Index of the statement this edge was extracted from.
    pub statement: usize,
}

impl ImportEdge {
    /// Export of the target this edge keeps alive; `None` means the whole module.
    pub fn used_export(&self) -> Option<&str> {
        self.source_name.as_ref().and_then(ImportedName::export_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedExportItem {
    pub exported_name: String,
    /// Absent when the exported name equals the declaration name.
    pub declared_name: Option<String>,
}

impl NamedExportItem {
    pub fn new(exported_name: impl Into<String>, declared_name: Option<&str>) -> Self {
        let exported_name = exported_name.into();
        let declared_name = declared_name
            .filter(|declared| *declared != exported_name)
            .map(str::to_string);
        Self {
            exported_name,
            declared_name,
        }
    }

    /// Name of the backing declaration or import binding.
    pub fn local_name(&self) -> &str {
        self.declared_name.as_deref().unwrap_or(&self.exported_name)
    }

    /// `export * as ns from 'x'`
    pub fn is_namespace_reexport(&self) -> bool {
        self.declared_name.as_deref() == Some("*")
    }
}

/// What a module exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportEdge {
    /// `export { .. } from 'x'`; no items means `export * from 'x'`.
    ReExport {
        module_specifier: String,
        named_exports: Vec<NamedExportItem>,
        statement: usize,
    },
    /// `export = X`
    Assignment { base_name: String, statement: usize },
    /// Declarations exported directly from this module.
    Local {
        named_exports: Vec<NamedExportItem>,
        statement: usize,
    },
}

impl ExportEdge {
    pub fn statement(&self) -> usize {
        match self {
            ExportEdge::ReExport { statement, .. }
            | ExportEdge::Assignment { statement, .. }
            | ExportEdge::Local { statement, .. } => *statement,
        }
    }

    pub fn named_exports(&self) -> &[NamedExportItem] {
        match self {
            ExportEdge::ReExport { named_exports, .. } | ExportEdge::Local { named_exports, .. } => {
                named_exports
            }
            ExportEdge::Assignment { .. } => &[],
        }
    }

    pub fn is_star(&self) -> bool {
        matches!(self, ExportEdge::ReExport { named_exports, .. } if named_exports.is_empty())
    }

    pub fn module_specifier(&self) -> Option<&str> {
        match self {
            ExportEdge::ReExport {
                module_specifier, ..
            } => Some(module_specifier),
            _ => None,
        }
    }
}

/// Edges of one module, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEdges {
    pub imports: Vec<ImportEdge>,
    pub exports: Vec<ExportEdge>,
}

impl ModuleEdges {
    pub fn has_assignment(&self) -> bool {
        self.exports
            .iter()
            .any(|e| matches!(e, ExportEdge::Assignment { .. }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnresolvableReference,
    MalformedDeclaration,
    UnrepresentableExport,
    UnenumerableReExport,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::UnresolvableReference => "unresolvable-reference",
            DiagnosticKind::MalformedDeclaration => "malformed-declaration",
            DiagnosticKind::UnrepresentableExport => "unrepresentable-export",
            DiagnosticKind::UnenumerableReExport => "unenumerable-re-export",
        }
    }
}

/// Non-fatal problem reported alongside the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: PathBuf,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, file: &Path, message: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.to_path_buf(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: {}",
            self.file.display(),
            self.kind.as_str(),
            self.message
        )
    }
}

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationStyle {
    /// One `declare module '<name>/<path>'` block per file plus an index file.
    #[default]
    Module,
    /// A single file of merged `declare namespace` blocks.
    Namespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// Options for one bundling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleOptions {
    /// Entry file, relative to `base_path` or absolute.
    pub entry: PathBuf,
    /// Export of the entry module to publish; `None` or `*` publishes all.
    pub export: Option<String>,
    pub module_name: String,
    pub style: DeclarationStyle,
    /// Identifier used wherever the export name `default` must be spelled.
    pub default_name: String,
    /// Binding name of the index file's `import .. = require(..)`.
    pub import_binding_name: String,
    pub strip_unused_exports: bool,
    /// Global name to publish the bundle under, `A.B.C` or `C`.
    pub root_name: Option<String>,
    pub out_dir: PathBuf,
    /// Directory module names are computed relative to.
    pub base_path: PathBuf,
    pub newline: LineEnding,
    pub header: Option<String>,
    pub footer: Option<String>,
}

impl BundleOptions {
    pub fn new(entry: impl Into<PathBuf>, module_name: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            export: None,
            module_name: module_name.into(),
            style: DeclarationStyle::default(),
            default_name: "_default".to_string(),
            import_binding_name: "__module".to_string(),
            strip_unused_exports: false,
            root_name: None,
            out_dir: PathBuf::from("dist"),
            base_path: PathBuf::from("/"),
            newline: LineEnding::default(),
            header: None,
            footer: None,
        }
    }

    /// Entry export name, with `*` treated as "everything".
    pub fn entry_export(&self) -> Option<&str> {
        self.export.as_deref().filter(|e| *e != "*")
    }

    pub fn entry_path(&self) -> PathBuf {
        crate::graph::normalize_path(&self.base_path.join(&self.entry))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleStatistics {
    pub modules: usize,
    pub rounds: usize,
    pub stripped_exports: usize,
    pub dead_symbols: usize,
    pub external_modules: usize,
}

/// Result of a successful run: output files and the warnings collected on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleOutput {
    pub files: BTreeMap<PathBuf, String>,
    pub diagnostics: Vec<Diagnostic>,
    pub statistics: BundleStatistics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_export_item_drops_identity_rename() {
        let item = NamedExportItem::new("foo", Some("foo"));
        assert_eq!(item.declared_name, None);
        assert_eq!(item.local_name(), "foo");

        let renamed = NamedExportItem::new("B", Some("A"));
        assert_eq!(renamed.local_name(), "A");
    }

    #[test]
    fn test_imported_name_export_name() {
        assert_eq!(ImportedName::Default.export_name(), Some("default"));
        assert_eq!(ImportedName::Namespace.export_name(), None);
        assert_eq!(ImportedName::from_export_name("*"), ImportedName::Namespace);
    }

    #[test]
    fn test_star_reexport_detection() {
        let star = ExportEdge::ReExport {
            module_specifier: "./b".into(),
            named_exports: vec![],
            statement: 0,
        };
        assert!(star.is_star());
        let local = ExportEdge::Local {
            named_exports: vec![],
            statement: 1,
        };
        assert!(!local.is_star());
    }

    #[test]
    fn test_entry_export_wildcard() {
        let mut options = BundleOptions::new("index.d.ts", "lib");
        options.export = Some("*".into());
        assert_eq!(options.entry_export(), None);
        options.export = Some("Api".into());
        assert_eq!(options.entry_export(), Some("Api"));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new(
            DiagnosticKind::UnresolvableReference,
            Path::new("/p/a.d.ts"),
            "cannot resolve './missing'",
        );
        assert_eq!(
            diag.to_string(),
            "/p/a.d.ts [unresolvable-reference]: cannot resolve './missing'"
        );
    }
}
