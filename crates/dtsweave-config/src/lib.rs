//! `dtsweave.toml` configuration for dtsweave.

pub mod error;
pub mod manager;
pub mod security;
pub mod types;

pub use error::{ConfigError, Result};
pub use manager::{default_template, ConfigManager, CONFIG_FILE_NAME};
pub use security::{validate_module_name, validate_project_relative};
pub use types::{PackConfig, ResolverConfig};
