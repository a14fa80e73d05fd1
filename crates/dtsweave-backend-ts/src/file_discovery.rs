//! Declaration file discovery.
//!
//! Walks a project directory and collects the declaration files to bundle,
//! honoring `.gitignore` and the configured include/exclude globs.

use crate::error::{BackendError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Configuration for file discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Globs a file path (relative to the project root) must match.
    pub include: Vec<String>,

    /// Globs that remove otherwise included files.
    pub exclude: Vec<String>,

    /// Directories skipped entirely, such as the output directory.
    pub skip_dirs: Vec<PathBuf>,

    /// Maximum file size to consider (bytes). Prevents reading huge files.
    pub max_file_size: Option<u64>,

    /// Follow symlinks during traversal
    pub follow_symlinks: bool,

    pub include_hidden: bool,

    pub max_depth: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*.d.ts".to_string()],
            exclude: vec![],
            skip_dirs: vec![],
            max_file_size: Some(10 * 1024 * 1024), // 10MB default
            follow_symlinks: false,
            include_hidden: false,
            max_depth: 100,
        }
    }
}

fn glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| BackendError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| BackendError::Pattern {
        pattern: patterns.join(", "),
        source,
    })
}

/// Discovers the declaration files under `root`, sorted by path.
///
/// # Security
/// - Does not follow symlinks by default (prevents infinite loops)
/// - Refuses to scan the filesystem root or system directories
/// - Skips `node_modules`; packages are resolved, never bundled
/// - Only returns files whose canonical path stays inside `root`
pub fn discover_declaration_files(root: &Path, config: &DiscoveryConfig) -> Result<Vec<PathBuf>> {
    let root = root.canonicalize().map_err(|source| BackendError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    validate_project_root(&root)?;

    let include = glob_set(&config.include)?;
    let exclude = glob_set(&config.exclude)?;
    let skip_dirs: Vec<PathBuf> = config
        .skip_dirs
        .iter()
        .map(|dir| root.join(dir))
        .collect();

    let mut walker = WalkBuilder::new(&root);
    walker
        .follow_links(config.follow_symlinks)
        .hidden(!config.include_hidden)
        .git_ignore(true)
        .git_exclude(true)
        .require_git(false)
        .max_depth(Some(config.max_depth))
        .max_filesize(config.max_file_size)
        .filter_entry(move |entry| {
            entry.file_name() != "node_modules"
                && !skip_dirs.iter().any(|dir| entry.path().starts_with(dir))
        });

    let mut discovered = Vec::new();
    for result in walker.build() {
        let entry = result.map_err(|e| BackendError::Discovery {
            message: e.to_string(),
        })?;
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&root) else {
            continue;
        };
        if !include.is_match(relative) || exclude.is_match(relative) {
            continue;
        }
        // Ensure it's within project root (security)
        if let Ok(canonical) = entry.path().canonicalize() {
            if canonical.starts_with(&root) {
                discovered.push(canonical);
            }
        }
    }
    discovered.sort();
    discovered.dedup();
    tracing::debug!(root = %root.display(), files = discovered.len(), "declaration files discovered");
    Ok(discovered)
}

/// Validates that the project root is safe to scan.
///
/// # Security
/// - Prevents scanning system directories
/// - Prevents scanning root filesystem
fn validate_project_root(root: &Path) -> Result<()> {
    if root == Path::new("/") {
        return Err(BackendError::Discovery {
            message: "Refusing to scan filesystem root".to_string(),
        });
    }

    #[cfg(unix)]
    {
        let dangerous_paths = ["/bin", "/sbin", "/usr", "/etc", "/sys", "/proc"];
        for dangerous in &dangerous_paths {
            if root.starts_with(dangerous) {
                return Err(BackendError::Discovery {
                    message: format!("Refusing to scan system directory: {}", dangerous),
                });
            }
        }
    }

    #[cfg(windows)]
    {
        let root_str = root.to_string_lossy().to_lowercase();
        if root_str.starts_with("c:\\windows") || root_str.starts_with("c:\\program files") {
            return Err(BackendError::Discovery {
                message: "Refusing to scan Windows system directory".to_string(),
            });
        }
    }

    Ok(())
}
