//! Aliases for modules outside the bundle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// An out-of-bundle module referenced by the surviving output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalModule {
    pub path: PathBuf,
    /// Specifier as written in the first referencing file.
    pub specifier: String,
    /// `None` while the module is only imported for side effects.
    pub alias: Option<String>,
}

/// Run-scoped naming table for external modules.
///
/// Aliases are `<prefix><n>` with `n` counting from 1 in order of first use.
#[derive(Debug, Clone)]
pub struct ExternalAliasRegistry {
    prefix: String,
    next: usize,
    entries: Vec<ExternalModule>,
    index: HashMap<PathBuf, usize>,
}

impl ExternalAliasRegistry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Alias of `path`, assigned on first call.
    pub fn alias(&mut self, path: &Path, specifier: &str) -> String {
        let slot = self.slot(path, specifier);
        if let Some(alias) = &self.entries[slot].alias {
            return alias.clone();
        }
        let alias = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        self.entries[slot].alias = Some(alias.clone());
        alias
    }

    /// Records a side-effect-only reference to `path`.
    pub fn touch(&mut self, path: &Path, specifier: &str) {
        self.slot(path, specifier);
    }

    fn slot(&mut self, path: &Path, specifier: &str) -> usize {
        if let Some(slot) = self.index.get(path) {
            return *slot;
        }
        self.entries.push(ExternalModule {
            path: path.to_path_buf(),
            specifier: specifier.to_string(),
            alias: None,
        });
        let slot = self.entries.len() - 1;
        self.index.insert(path.to_path_buf(), slot);
        slot
    }

    pub fn entries(&self) -> &[ExternalModule] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
