//! The bundling pipeline.

use crate::backend::{CachingResolver, ModuleResolver};
use crate::error::{ConfigurationError, Result};
use crate::graph::{normalize_path, ModuleGraph, ModuleId};
use crate::reachability::analyze_reachability;
use crate::rewrite;
use crate::strip::{strip_module, StripPlan};
use crate::syntax::{SourceModule, Statement};
use crate::types::{BundleOptions, BundleOutput, BundleStatistics, Diagnostic};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// What the strip rounds removed from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Removed {
    pub exports: Vec<String>,
    pub symbols: Vec<String>,
    /// Specifiers of removed `export * from` statements.
    pub star_reexports: Vec<String>,
}

impl Removed {
    fn record(&mut self, module: &SourceModule, plan: &StripPlan) {
        extend_unique(&mut self.exports, plan.exports.iter());
        extend_unique(&mut self.symbols, plan.symbols.iter());
        let stars = plan
            .star_statements
            .iter()
            .filter_map(|index| match module.statements.get(*index) {
                Some(Statement::ExportAll(all)) => Some(&all.source),
                _ => None,
            });
        extend_unique(&mut self.star_reexports, stars);
    }
}

fn extend_unique<'a>(target: &mut Vec<String>, items: impl Iterator<Item = &'a String>) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

/// Modules left after stripping, and the graph over them.
#[derive(Debug, Clone)]
pub struct StripOutcome {
    pub modules: Vec<SourceModule>,
    pub graph: ModuleGraph,
    pub entry: ModuleId,
    pub removed: BTreeMap<PathBuf, Removed>,
    pub rounds: usize,
    /// Extraction and resolution warnings of the input modules.
    pub diagnostics: Vec<Diagnostic>,
}

impl StripOutcome {
    /// Builds the graph and locates the entry without stripping anything.
    ///
    /// # Errors
    ///
    /// Fails when the entry module is not among `modules` or does not export
    /// `export`.
    pub fn unstripped(
        modules: Vec<SourceModule>,
        entry: &Path,
        export: Option<&str>,
        resolver: &dyn ModuleResolver,
    ) -> Result<Self> {
        let (graph, diagnostics) = ModuleGraph::build(&modules, resolver);
        let entry_id = graph
            .find_entry(entry)
            .ok_or_else(|| ConfigurationError::EntryModuleNotFound {
                entry: entry.to_path_buf(),
            })?;
        if let Some(name) = export.filter(|e| *e != "*") {
            if !graph.exports_name(entry_id, name) {
                return Err(ConfigurationError::EntryExportNotFound {
                    entry: graph.module(entry_id).path.clone(),
                    export: name.to_string(),
                }
                .into());
            }
        }
        Ok(Self {
            modules,
            graph,
            entry: entry_id,
            removed: BTreeMap::new(),
            rounds: 0,
            diagnostics,
        })
    }

    /// Repeats reachability, dead-symbol analysis and stripping until a
    /// round removes nothing.
    ///
    /// Every round rebuilds the graph from the stripped modules, so a binding
    /// removed in one file can free exports of another in the next round.
    ///
    /// # Errors
    ///
    /// Same as [`StripOutcome::unstripped`].
    pub fn stripped(
        modules: Vec<SourceModule>,
        entry: &Path,
        export: Option<&str>,
        resolver: &dyn ModuleResolver,
    ) -> Result<Self> {
        let mut outcome = Self::unstripped(modules, entry, export, resolver)?;
        loop {
            outcome.rounds += 1;
            let reach = analyze_reachability(&outcome.graph, outcome.entry, export)?;
            let mut changed = false;
            let mut next = Vec::with_capacity(outcome.modules.len());
            for (index, module) in outcome.modules.iter().enumerate() {
                let plan = StripPlan::for_module(module, ModuleId(index), &reach);
                let stripped = strip_module(module, &plan);
                if stripped != *module {
                    changed = true;
                    outcome
                        .removed
                        .entry(module.path.clone())
                        .or_default()
                        .record(module, &plan);
                }
                next.push(stripped);
            }
            tracing::debug!(round = outcome.rounds, changed, "strip round finished");
            if !changed {
                break;
            }
            outcome.modules = next;
            outcome.graph = ModuleGraph::build(&outcome.modules, resolver).0;
        }
        Ok(outcome)
    }

    pub fn stripped_exports(&self) -> usize {
        self.removed.values().map(|r| r.exports.len()).sum()
    }

    pub fn dead_symbols(&self) -> usize {
        self.removed.values().map(|r| r.symbols.len()).sum()
    }
}

/// Copies `modules` with their paths made absolute against `base`.
pub fn normalize_modules(modules: &[SourceModule], base: &Path) -> Vec<SourceModule> {
    modules
        .iter()
        .map(|m| SourceModule::new(normalize_path(&base.join(&m.path)), m.statements.clone()))
        .collect()
}

/// Rejects option values that would produce invalid output.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidOption`] naming the first bad option.
pub fn validate_options(options: &BundleOptions) -> Result<()> {
    let invalid = |option: &str, reason: &str| -> Result<()> {
        Err(ConfigurationError::InvalidOption {
            option: option.to_string(),
            reason: reason.to_string(),
        }
        .into())
    };
    if options.module_name.trim().is_empty() {
        return invalid("moduleName", "must not be empty");
    }
    if options.default_name == "default" {
        return invalid("defaultName", "'default' is a reserved word");
    }
    if !is_identifier(&options.default_name) {
        return invalid("defaultName", "must be an identifier");
    }
    if !is_identifier(&options.import_binding_name) {
        return invalid("importBindingName", "must be an identifier");
    }
    Ok(())
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Bundles `modules` into the output files described by `options`.
///
/// # Errors
///
/// Fails with a [`ConfigurationError`] before producing any output when the
/// options are invalid, the entry module is missing, or the entry export does
/// not exist. Everything else is reported through
/// [`BundleOutput::diagnostics`].
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(entry = %options.entry.display(), style = ?options.style)
)]
pub fn bundle(
    modules: &[SourceModule],
    options: &BundleOptions,
    resolver: &dyn ModuleResolver,
) -> Result<BundleOutput> {
    validate_options(options)?;
    let resolver = CachingResolver::new(resolver);
    let modules = normalize_modules(modules, &options.base_path);
    let entry = options.entry_path();

    let outcome = if options.strip_unused_exports {
        StripOutcome::stripped(modules, &entry, options.entry_export(), &resolver)?
    } else {
        StripOutcome::unstripped(modules, &entry, options.entry_export(), &resolver)?
    };

    let emission = rewrite::emit(&outcome.graph, &outcome.modules, outcome.entry, options);

    let mut diagnostics = outcome.diagnostics.clone();
    diagnostics.extend(emission.diagnostics);
    for diagnostic in &diagnostics {
        tracing::warn!(
            file = %diagnostic.file.display(),
            kind = diagnostic.kind.as_str(),
            "{}",
            diagnostic.message
        );
    }

    let statistics = BundleStatistics {
        modules: outcome.modules.len(),
        rounds: outcome.rounds,
        stripped_exports: outcome.stripped_exports(),
        dead_symbols: outcome.dead_symbols(),
        external_modules: emission.external_modules,
    };
    tracing::info!(
        modules = statistics.modules,
        files = emission.files.len(),
        stripped = statistics.stripped_exports,
        "bundle complete"
    );

    Ok(BundleOutput {
        files: emission.files,
        diagnostics,
        statistics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FileSetResolver;
    use crate::Error;

    #[test]
    fn test_validate_options() {
        let mut options = BundleOptions::new("index.d.ts", "lib");
        assert!(validate_options(&options).is_ok());

        options.default_name = "default".into();
        assert!(matches!(
            validate_options(&options),
            Err(Error::Configuration(ConfigurationError::InvalidOption { .. }))
        ));

        options.default_name = "_default".into();
        options.import_binding_name = "1abc".into();
        assert!(validate_options(&options).is_err());
    }

    #[test]
    fn test_missing_entry_fails_before_output() {
        let modules = vec![SourceModule::new("a.d.ts", vec![])];
        let options = BundleOptions::new("missing.d.ts", "lib");
        let resolver = FileSetResolver::default();
        let err = bundle(&modules, &options, &resolver).expect_err("must fail");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_normalize_modules_joins_base() {
        let modules = vec![SourceModule::new("src/./a.d.ts", vec![])];
        let normalized = normalize_modules(&modules, Path::new("/p"));
        assert_eq!(normalized[0].path, PathBuf::from("/p/src/a.d.ts"));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("__module"));
        assert!(is_identifier("$x1"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }
}
