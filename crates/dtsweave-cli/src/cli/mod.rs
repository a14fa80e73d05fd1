//! Run orchestration: config merging, then bundling or listing.

pub mod list;
pub mod pack;

use crate::OutputFormat;
use anyhow::{Context, Result};
use dtsweave_backend_ts::{DiscoveryConfig, ResolverSettings, TsBackend};
use dtsweave_config::{ConfigManager, PackConfig};
use dtsweave_core::DeclarationStyle;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for one run of the default command.
pub struct RunOptions {
    pub project: PathBuf,
    pub config: Option<PathBuf>,
    pub overrides: Overrides,
    pub dry_run: bool,
    pub format: OutputFormat,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub entry: Option<PathBuf>,
    pub module_name: Option<String>,
    pub export: Option<String>,
    pub root_name: Option<String>,
    pub out_dir: Option<PathBuf>,
    pub style: Option<DeclarationStyle>,
    pub default_name: Option<String>,
    pub import_binding_name: Option<String>,
    pub strip_unused_exports: bool,
}

impl Overrides {
    pub fn apply(self, config: &mut PackConfig) {
        if let Some(entry) = self.entry {
            config.entry = entry;
        }
        if let Some(name) = self.module_name {
            config.module_name = Some(name);
        }
        if let Some(export) = self.export {
            config.export = Some(export);
        }
        if let Some(root) = self.root_name {
            config.root_name = Some(root);
        }
        if let Some(out_dir) = self.out_dir {
            config.out_dir = out_dir;
        }
        if let Some(style) = self.style {
            config.style = style;
        }
        if let Some(name) = self.default_name {
            config.default_name = name;
        }
        if let Some(name) = self.import_binding_name {
            config.import_binding_name = name;
        }
        config.strip_unused_exports |= self.strip_unused_exports;
    }
}

/// Canonical project directory.
pub fn project_dir(project: &Path) -> Result<PathBuf> {
    project
        .canonicalize()
        .with_context(|| format!("Project directory not found: {}", project.display()))
}

/// Loads the config file (if any), applies `overrides` and validates the
/// result. A missing module name is taken from `package.json`.
pub fn effective_config(
    project: &Path,
    explicit: Option<&Path>,
    overrides: Overrides,
) -> Result<PackConfig> {
    let manager = ConfigManager::load_or_default(project, explicit)
        .context("Failed to load configuration")?;
    tracing::debug!(path = %manager.path().display(), "configuration source");

    let mut config = manager.into_config();
    overrides.apply(&mut config);
    if config.module_name.is_none() {
        config.module_name = package_name(project);
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// The `name` field of `<project>/package.json`.
pub fn package_name(project: &Path) -> Option<String> {
    let path = project.join("package.json");
    let contents = fs::read_to_string(&path).ok()?;
    let json: serde_json::Value = match serde_json::from_str(&contents) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring unparsable package.json: {e}");
            return None;
        }
    };
    json.get("name")?.as_str().map(str::to_string)
}

/// Backend configured with the config's discovery and resolver settings.
pub fn backend_for(config: &PackConfig) -> TsBackend {
    TsBackend::new()
        .with_discovery(DiscoveryConfig {
            include: config.include.clone(),
            exclude: config.exclude.clone(),
            ..DiscoveryConfig::default()
        })
        .with_resolver(ResolverSettings {
            extensions: config.resolver.extensions.clone(),
            condition_names: config.resolver.condition_names.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_file_values() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("dtsweave.toml"),
            "moduleName = \"from-file\"\nstyle = \"namespace\"\nstripUnusedExports = true\n",
        )
        .unwrap();

        let config = effective_config(
            temp.path(),
            None,
            Overrides {
                module_name: Some("from-flag".to_string()),
                out_dir: Some(PathBuf::from("types")),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(config.module_name.as_deref(), Some("from-flag"));
        assert_eq!(config.out_dir, PathBuf::from("types"));
        assert_eq!(config.style, DeclarationStyle::Namespace);
        assert!(config.strip_unused_exports);
    }

    #[test]
    fn test_module_name_falls_back_to_package_json() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("package.json"), r#"{ "name": "@acme/lib" }"#).unwrap();

        let config = effective_config(temp.path(), None, Overrides::default()).unwrap();
        assert_eq!(config.module_name.as_deref(), Some("@acme/lib"));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let temp = TempDir::new().unwrap();
        let result = effective_config(
            temp.path(),
            None,
            Overrides {
                module_name: Some("../escape".to_string()),
                ..Overrides::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_package_name_ignores_garbage() {
        let temp = TempDir::new().unwrap();
        assert_eq!(package_name(temp.path()), None);
        fs::write(temp.path().join("package.json"), "{ not json").unwrap();
        assert_eq!(package_name(temp.path()), None);
    }
}
