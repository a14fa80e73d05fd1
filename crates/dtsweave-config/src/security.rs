use crate::error::{ConfigError, Result};
use std::path::{Component, Path};

/// Validate an output module name
///
/// Module names must:
/// - Be 1-214 characters long (the npm package name limit)
/// - Not contain control characters, whitespace or backslashes
/// - Be relative, with no `.` or `..` segments
///
/// # Security
/// The module name becomes a directory below `outDir` in module style, so a
/// name escaping that directory would write files elsewhere.
pub fn validate_module_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::invalid("moduleName", "must not be empty"));
    }

    if name.len() > 214 {
        return Err(ConfigError::invalid(
            "moduleName",
            format!("too long: {} characters (max 214)", name.len()),
        ));
    }

    if name
        .chars()
        .any(|c| c.is_control() || c.is_whitespace() || c == '\\')
    {
        return Err(ConfigError::invalid(
            "moduleName",
            "contains whitespace, control characters or backslashes",
        ));
    }

    if name.starts_with('/') || name.split('/').any(|s| s.is_empty() || s == "." || s == "..") {
        return Err(ConfigError::PathTraversal {
            field: "moduleName".to_string(),
            value: name.to_string(),
        });
    }

    Ok(())
}

/// Validate a path option that must stay inside the project directory
///
/// The path must be relative and must not climb above its starting point.
pub fn validate_project_relative(field: &str, path: &Path) -> Result<()> {
    let mut depth: usize = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => depth -= 1,
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ConfigError::PathTraversal {
                    field: field.to_string(),
                    value: path.display().to_string(),
                });
            }
        }
    }
    Ok(())
}
