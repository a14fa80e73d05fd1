//! Collaborator traits: declaration parsing and module resolution.

use crate::error::Result;
use crate::graph::normalize_path;
use crate::syntax::SourceModule;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Outcome of resolving a module specifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedModule {
    pub resolved_path: PathBuf,
    /// The module lives outside the bundle (a package dependency).
    pub is_external: bool,
}

impl ResolvedModule {
    pub fn internal(path: impl Into<PathBuf>) -> Self {
        Self {
            resolved_path: path.into(),
            is_external: false,
        }
    }

    pub fn external(path: impl Into<PathBuf>) -> Self {
        Self {
            resolved_path: path.into(),
            is_external: true,
        }
    }
}

/// Lowers declaration source text into a [`SourceModule`].
///
/// # Examples
///
/// ```no_run
/// use dtsweave_core::DeclarationParser;
/// use std::path::Path;
///
/// fn parse_one(parser: &dyn DeclarationParser) {
///     match parser.parse(Path::new("index.d.ts"), "export declare const x: number;") {
///         Ok(module) => println!("{} statements", module.statements.len()),
///         Err(e) => eprintln!("parse failed: {}", e),
///     }
/// }
/// ```
pub trait DeclarationParser: fmt::Debug {
    /// Parses one file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Parse`] only when nothing useful can be
    /// recovered. Statements the parser cannot lower should be returned as
    /// [`crate::Statement::Unrecognized`] instead of failing the file.
    fn parse(&self, path: &Path, text: &str) -> Result<SourceModule>;
}

/// Resolves a module specifier relative to the file containing it.
///
/// Implementations must be pure for a fixed configuration; the pipeline
/// wraps them in a [`CachingResolver`] and may ask the same question many
/// times across strip rounds.
pub trait ModuleResolver {
    /// Returns `None` when the specifier cannot be resolved.
    fn resolve(&self, specifier: &str, containing_file: &Path) -> Option<ResolvedModule>;
}

impl<R: ModuleResolver + ?Sized> ModuleResolver for &R {
    fn resolve(&self, specifier: &str, containing_file: &Path) -> Option<ResolvedModule> {
        (**self).resolve(specifier, containing_file)
    }
}

impl<R: ModuleResolver + ?Sized> ModuleResolver for Box<R> {
    fn resolve(&self, specifier: &str, containing_file: &Path) -> Option<ResolvedModule> {
        (**self).resolve(specifier, containing_file)
    }
}

/// Memoizes another resolver per `(specifier, containing file)` pair.
///
/// Lives for a single bundling run.
pub struct CachingResolver<R> {
    inner: R,
    cache: RefCell<HashMap<(String, PathBuf), Option<ResolvedModule>>>,
}

impl<R: ModuleResolver> CachingResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl<R: ModuleResolver> ModuleResolver for CachingResolver<R> {
    fn resolve(&self, specifier: &str, containing_file: &Path) -> Option<ResolvedModule> {
        let key = (specifier.to_string(), containing_file.to_path_buf());
        if let Some(hit) = self.cache.borrow().get(&key) {
            tracing::trace!(specifier, file = %containing_file.display(), "resolution cache hit");
            return hit.clone();
        }
        let resolved = self.inner.resolve(specifier, containing_file);
        self.cache.borrow_mut().insert(key, resolved.clone());
        resolved
    }
}

/// Declaration extensions probed for extensionless relative specifiers.
pub const DECLARATION_EXTENSIONS: &[&str] = &[".d.ts", ".ts", ".tsx", ".d.mts", ".d.cts"];

/// Resolves relative specifiers against a fixed set of files.
///
/// Bare specifiers (`lodash`, `@scope/pkg`) are reported as external without
/// probing anything. Useful when the caller already knows every file of the
/// bundle and has no package layout to consult.
#[derive(Debug, Clone, Default)]
pub struct FileSetResolver {
    files: HashSet<PathBuf>,
}

impl FileSetResolver {
    pub fn new(files: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            files: files.into_iter().map(|f| normalize_path(&f)).collect(),
        }
    }

    pub fn from_modules(modules: &[SourceModule]) -> Self {
        Self::new(modules.iter().map(|m| m.path.clone()))
    }

    fn probe(&self, base: &Path) -> Option<PathBuf> {
        let text = base.to_string_lossy();
        if self.files.contains(base) && DECLARATION_EXTENSIONS.iter().any(|e| text.ends_with(e)) {
            return Some(base.to_path_buf());
        }
        let stem = text
            .strip_suffix(".js")
            .or_else(|| text.strip_suffix(".mjs"))
            .or_else(|| text.strip_suffix(".cjs"))
            .unwrap_or(&text);
        DECLARATION_EXTENSIONS
            .iter()
            .map(|ext| PathBuf::from(format!("{stem}{ext}")))
            .chain(
                DECLARATION_EXTENSIONS
                    .iter()
                    .map(|ext| Path::new(stem).join(format!("index{ext}"))),
            )
            .find(|candidate| self.files.contains(candidate))
    }
}

impl ModuleResolver for FileSetResolver {
    fn resolve(&self, specifier: &str, containing_file: &Path) -> Option<ResolvedModule> {
        if !is_relative_specifier(specifier) {
            return Some(ResolvedModule::external(specifier));
        }
        let dir = containing_file.parent().unwrap_or_else(|| Path::new("/"));
        let base = normalize_path(&dir.join(specifier));
        self.probe(&base).map(ResolvedModule::internal)
    }
}

pub fn is_relative_specifier(specifier: &str) -> bool {
    matches!(specifier, "." | "..")
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
}
