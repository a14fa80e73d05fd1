//! Node-style module resolution through `oxc_resolver`.

use dtsweave_core::backend::is_relative_specifier;
use dtsweave_core::graph::normalize_path;
use dtsweave_core::{ModuleResolver, ResolvedModule};
use oxc_resolver::{ResolveOptions, Resolver};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Resolver settings that can be configured per project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Extensions probed for extensionless specifiers, with the leading dot.
    pub extensions: Vec<String>,
    /// Conditions matched against `package.json` `exports`.
    pub condition_names: Vec<String>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            extensions: [".d.ts", ".ts", ".tsx", ".d.mts", ".d.cts"]
                .map(String::from)
                .to_vec(),
            condition_names: ["types", "import", "require", "default"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// [`ModuleResolver`] following Node and TypeScript resolution rules.
///
/// Anything resolved inside `node_modules` or outside the bundled file set
/// is external. Bare specifiers that cannot be resolved are external too;
/// unresolvable relative specifiers are reported as unresolved.
pub struct NodeModuleResolver {
    resolver: Resolver,
    files: HashSet<PathBuf>,
}

impl std::fmt::Debug for NodeModuleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeModuleResolver")
            .field("files", &self.files.len())
            .finish()
    }
}

impl NodeModuleResolver {
    pub fn new(settings: &ResolverSettings, files: impl IntoIterator<Item = PathBuf>) -> Self {
        let resolver = Resolver::new(ResolveOptions {
            extensions: settings.extensions.clone(),
            condition_names: settings.condition_names.clone(),
            main_fields: ["types", "typings", "main"].map(String::from).to_vec(),
            extension_alias: vec![
                (
                    ".js".to_string(),
                    [".d.ts", ".ts", ".tsx", ".js"].map(String::from).to_vec(),
                ),
                (
                    ".mjs".to_string(),
                    [".d.mts", ".mts", ".mjs"].map(String::from).to_vec(),
                ),
                (
                    ".cjs".to_string(),
                    [".d.cts", ".cts", ".cjs"].map(String::from).to_vec(),
                ),
            ],
            ..ResolveOptions::default()
        });
        Self {
            resolver,
            files: files.into_iter().map(|f| normalize_path(&f)).collect(),
        }
    }
}

fn in_node_modules(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == "node_modules"))
}

impl ModuleResolver for NodeModuleResolver {
    fn resolve(&self, specifier: &str, containing_file: &Path) -> Option<ResolvedModule> {
        let dir = containing_file.parent()?;
        match self.resolver.resolve(dir, specifier) {
            Ok(resolution) => {
                let path = normalize_path(resolution.path());
                if in_node_modules(&path) || !self.files.contains(&path) {
                    Some(ResolvedModule::external(path))
                } else {
                    Some(ResolvedModule::internal(path))
                }
            }
            Err(error) => {
                tracing::debug!(specifier, file = %containing_file.display(), %error, "resolution failed");
                if is_relative_specifier(specifier) {
                    None
                } else {
                    Some(ResolvedModule::external(specifier))
                }
            }
        }
    }
}
