use crate::error::{ConfigError, Result};
use crate::types::PackConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = "dtsweave.toml";

/// Manager for a project's `dtsweave.toml`
pub struct ConfigManager {
    config_path: PathBuf,
    config: PackConfig,
}

impl ConfigManager {
    /// Path of the config file inside `project_dir`, whether or not it exists.
    pub fn config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_FILE_NAME)
    }

    /// The config file of `project_dir`, if there is one.
    pub fn discover(project_dir: &Path) -> Option<PathBuf> {
        let path = Self::config_path(project_dir);
        path.is_file().then_some(path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PackConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "config loaded");

        Ok(Self {
            config_path: path.to_path_buf(),
            config,
        })
    }

    /// Loads `explicit` when given, otherwise the project's config file when
    /// it exists, otherwise the defaults.
    ///
    /// An explicit path that does not exist is an error; a missing project
    /// file is not.
    pub fn load_or_default(project_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match Self::discover(project_dir) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self {
                config_path: Self::config_path(project_dir),
                config: PackConfig::default(),
            }),
        }
    }

    /// Initialize a new config file from the commented template
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub fn init_at(path: &Path, module_name: &str, force: bool) -> Result<Self> {
        if path.exists() && !force {
            return Err(ConfigError::invalid(
                "path",
                format!("{} already exists", path.display()),
            ));
        }
        crate::security::validate_module_name(module_name)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, default_template(module_name)).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::load_from(path)
    }

    /// Save config to disk atomically
    ///
    /// Uses a temporary file and atomic rename to prevent corruption
    pub fn save(&self) -> Result<()> {
        self.config.validate()?;
        let toml_str = toml::to_string_pretty(&self.config)?;

        let temp_path = self.config_path.with_extension("toml.tmp");
        fs::write(&temp_path, toml_str).map_err(|source| ConfigError::Io {
            path: temp_path.clone(),
            source,
        })?;

        fs::rename(&temp_path, &self.config_path).map_err(|source| ConfigError::Io {
            path: self.config_path.clone(),
            source,
        })?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get reference to config
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Get mutable reference to config (caller must call save())
    pub fn config_mut(&mut self) -> &mut PackConfig {
        &mut self.config
    }

    pub fn into_config(self) -> PackConfig {
        self.config
    }
}

/// The file written by `dtsweave config init`.
pub fn default_template(module_name: &str) -> String {
    format!(
        r#"# dtsweave configuration
# Keys may also be given on the command line; flags win.

# Entry declaration file, relative to this directory.
entry = "index.d.ts"

# Name the bundle is published under.
moduleName = "{module_name}"

# Export of the entry module to publish. Unset or "*" publishes everything.
# export = "*"

# "module": one `declare module` block per file plus an index file.
# "namespace": a single file of merged `declare namespace` blocks.
style = "module"

outDir = "dist"

# Remove exports nothing reachable from the entry uses.
stripUnusedExports = false

# Publish under a global name as well, "A.B.C" or "C".
# rootName = "MyLib"

# Identifier used where the export name `default` must be spelled out.
defaultName = "_default"

# Binding of the index file's `import .. = require(..)`.
importBindingName = "__module"

# "lf" or "crlf".
newline = "lf"

# Text placed at the start and end of every emitted file.
# {{moduleName}} and {{entry}} are substituted.
# header = "// Type definitions for {{moduleName}}"
# footer = ""

include = ["**/*.d.ts"]
exclude = []

[resolver]
extensions = [".d.ts", ".ts", ".tsx", ".d.mts", ".d.cts"]
conditionNames = ["types", "import", "require", "default"]
"#
    )
}
