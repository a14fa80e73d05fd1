use crate::error::{ConfigError, Result};
use crate::security::{validate_module_name, validate_project_relative};
use dtsweave_core::bundle::is_identifier;
use dtsweave_core::{BundleOptions, DeclarationStyle, LineEnding};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration loaded from `dtsweave.toml`.
///
/// Keys are camelCase; every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PackConfig {
    /// Entry file, relative to the project directory.
    pub entry: PathBuf,

    /// Name of the published module. Required before bundling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,

    /// Export of the entry module to publish; unset or `*` publishes all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<String>,

    /// Global name to publish the bundle under, `A.B.C` or `C`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_name: Option<String>,

    pub out_dir: PathBuf,

    pub style: DeclarationStyle,

    pub default_name: String,

    pub import_binding_name: String,

    pub strip_unused_exports: bool,

    pub newline: LineEnding,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,

    /// Globs selecting the declaration files to bundle.
    pub include: Vec<String>,

    /// Globs removing files from `include`.
    pub exclude: Vec<String>,

    pub resolver: ResolverConfig,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            entry: PathBuf::from("index.d.ts"),
            module_name: None,
            export: None,
            root_name: None,
            out_dir: PathBuf::from("dist"),
            style: DeclarationStyle::Module,
            default_name: "_default".to_string(),
            import_binding_name: "__module".to_string(),
            strip_unused_exports: false,
            newline: LineEnding::Lf,
            header: None,
            footer: None,
            include: vec!["**/*.d.ts".to_string()],
            exclude: Vec::new(),
            resolver: ResolverConfig::default(),
        }
    }
}

/// Module resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverConfig {
    /// Extensions probed for extensionless specifiers, with the leading dot.
    pub extensions: Vec<String>,

    /// Conditions matched against `package.json` `exports`.
    pub condition_names: Vec<String>,
}

impl Default for ResolverConfig {
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

impl PackConfig {
    /// Checks every value that can be checked without touching the disk.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.entry.as_os_str().is_empty() {
            return Err(ConfigError::invalid("entry", "must not be empty"));
        }
        validate_project_relative("entry", &self.entry)?;

        if let Some(name) = &self.module_name {
            validate_module_name(name)?;
        }

        if self.default_name == "default" {
            return Err(ConfigError::invalid("defaultName", "'default' is a reserved word"));
        }
        if !is_identifier(&self.default_name) {
            return Err(ConfigError::invalid("defaultName", "must be an identifier"));
        }
        if !is_identifier(&self.import_binding_name) {
            return Err(ConfigError::invalid("importBindingName", "must be an identifier"));
        }

        if let Some(root) = &self.root_name {
            if !root.split('.').all(is_identifier) {
                return Err(ConfigError::invalid(
                    "rootName",
                    "must be an identifier or a dotted path of identifiers",
                ));
            }
        }

        if self.include.is_empty() {
            return Err(ConfigError::invalid("include", "needs at least one pattern"));
        }
        if self
            .resolver
            .extensions
            .iter()
            .any(|ext| !ext.starts_with('.'))
        {
            return Err(ConfigError::invalid(
                "resolver.extensions",
                "extensions start with a dot",
            ));
        }

        Ok(())
    }

    /// Converts the configuration into core options for a project rooted at
    /// `project_dir`.
    ///
    /// # Errors
    ///
    /// Fails when validation fails or `moduleName` is unset.
    pub fn to_bundle_options(&self, project_dir: &Path) -> Result<BundleOptions> {
        self.validate()?;
        let module_name = self
            .module_name
            .as_deref()
            .ok_or_else(|| ConfigError::invalid("moduleName", "must be set"))?;

        let mut options = BundleOptions::new(&self.entry, module_name);
        options.export = self.export.clone();
        options.root_name = self.root_name.clone();
        options.out_dir = self.out_dir.clone();
        options.style = self.style;
        options.default_name = self.default_name.clone();
        options.import_binding_name = self.import_binding_name.clone();
        options.strip_unused_exports = self.strip_unused_exports;
        options.newline = self.newline;
        options.header = self.header.clone();
        options.footer = self.footer.clone();
        options.base_path = project_dir.to_path_buf();
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: PackConfig = toml::from_str("").unwrap();
        assert_eq!(config, PackConfig::default());
    }

    #[test]
    fn test_camel_case_keys() {
        let config: PackConfig = toml::from_str(
            r#"
            moduleName = "my-lib"
            stripUnusedExports = true
            style = "namespace"
            newline = "crlf"
            rootName = "Acme.Lib"

            [resolver]
            conditionNames = ["types"]
            "#,
        )
        .unwrap();
        assert_eq!(config.module_name.as_deref(), Some("my-lib"));
        assert!(config.strip_unused_exports);
        assert_eq!(config.style, DeclarationStyle::Namespace);
        assert_eq!(config.newline, LineEnding::Crlf);
        assert_eq!(config.resolver.condition_names, vec!["types".to_string()]);
        assert_eq!(config.resolver.extensions, ResolverConfig::default().extensions);
    }

    #[test]
    fn test_unknown_style_is_rejected() {
        assert!(toml::from_str::<PackConfig>(r#"style = "umd""#).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let base = PackConfig {
            module_name: Some("lib".to_string()),
            ..PackConfig::default()
        };
        assert!(base.validate().is_ok());

        let cases = [
            PackConfig { default_name: "default".into(), ..base.clone() },
            PackConfig { default_name: "not-ident".into(), ..base.clone() },
            PackConfig { import_binding_name: "1x".into(), ..base.clone() },
            PackConfig { root_name: Some("A..B".into()), ..base.clone() },
            PackConfig { entry: PathBuf::new(), ..base.clone() },
            PackConfig { include: Vec::new(), ..base.clone() },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid { .. })),
                "{config:?}"
            );
        }

        let escaping = PackConfig {
            module_name: Some("../lib".into()),
            ..base.clone()
        };
        assert!(matches!(
            escaping.validate(),
            Err(ConfigError::PathTraversal { .. })
        ));
    }

    #[test]
    fn test_to_bundle_options() {
        let config = PackConfig {
            module_name: Some("lib".to_string()),
            export: Some("Api".to_string()),
            strip_unused_exports: true,
            ..PackConfig::default()
        };
        let options = config.to_bundle_options(Path::new("/project")).unwrap();
        assert_eq!(options.module_name, "lib");
        assert_eq!(options.entry, PathBuf::from("index.d.ts"));
        assert_eq!(options.entry_export(), Some("Api"));
        assert_eq!(options.base_path, PathBuf::from("/project"));
        assert!(options.strip_unused_exports);
        assert!(dtsweave_core::bundle::validate_options(&options).is_ok());
    }

    #[test]
    fn test_module_name_is_required_for_bundling() {
        let err = PackConfig::default()
            .to_bundle_options(Path::new("/project"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "moduleName"));
    }
}
