//! TypeScript declaration backend: reads a project from disk and drives the
//! core pipeline.

use crate::error::{BackendError, Result};
use crate::file_discovery::{discover_declaration_files, DiscoveryConfig};
use crate::parser::OxcDeclarationParser;
use crate::resolver::{NodeModuleResolver, ResolverSettings};
use dtsweave_core::report::ListOptions;
use dtsweave_core::{
    bundle, list_report, BundleOptions, BundleOutput, DeclarationParser, ListReport, SourceModule,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// The parsed declaration files of one project.
#[derive(Debug, Clone)]
pub struct Project {
    /// Canonical project root.
    pub root: PathBuf,
    pub modules: Vec<SourceModule>,
}

impl Project {
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.modules.iter().map(|m| m.path())
    }
}

/// Bundles TypeScript declaration projects using oxc.
///
/// # Examples
///
/// ```no_run
/// use dtsweave_backend_ts::TsBackend;
/// use dtsweave_core::BundleOptions;
/// use std::path::Path;
///
/// let backend = TsBackend::new();
/// let options = BundleOptions::new("index.d.ts", "my-lib");
/// let output = backend.bundle(Path::new("."), &options)?;
/// let written = TsBackend::write_output(&output, Path::new("."))?;
/// println!("wrote {} files", written.len());
/// # Ok::<(), dtsweave_backend_ts::BackendError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TsBackend {
    parser: OxcDeclarationParser,
    discovery: DiscoveryConfig,
    resolver: ResolverSettings,
}

impl TsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_resolver(mut self, resolver: ResolverSettings) -> Self {
        self.resolver = resolver;
        self
    }

    /// Discovers, reads and parses every declaration file under `root`.
    ///
    /// `skip_dirs` (relative to `root`) are left out on top of the configured
    /// discovery rules.
    ///
    /// # Errors
    ///
    /// Fails when discovery fails, a file cannot be read, or a file cannot be
    /// parsed at all.
    #[tracing::instrument(level = "debug", skip(self, skip_dirs), fields(root = %root.display()))]
    pub fn load_project(&self, root: &Path, skip_dirs: &[PathBuf]) -> Result<Project> {
        let root = root.canonicalize().map_err(|source| BackendError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let mut discovery = self.discovery.clone();
        discovery.skip_dirs.extend(skip_dirs.iter().cloned());

        let files = discover_declaration_files(&root, &discovery)?;
        let mut modules = Vec::with_capacity(files.len());
        for file in files {
            let text = fs::read_to_string(&file).map_err(|source| BackendError::Io {
                path: file.clone(),
                source,
            })?;
            modules.push(self.parser.parse(&file, &text).map_err(|e| match e {
                dtsweave_core::Error::Parse { file, message } => {
                    BackendError::Parse { file, message }
                }
                other => BackendError::Core(other),
            })?);
        }
        Ok(Project { root, modules })
    }

    fn resolver_for(&self, project: &Project) -> NodeModuleResolver {
        NodeModuleResolver::new(
            &self.resolver,
            project.files().map(Path::to_path_buf),
        )
    }

    /// Bundles the project under `root`.
    ///
    /// `options.base_path` is replaced by the canonical project root, so
    /// module names are always relative to it. The output directory is
    /// excluded from discovery.
    ///
    /// # Errors
    ///
    /// Fails when the project cannot be loaded or the core rejects the
    /// configuration.
    pub fn bundle(&self, root: &Path, options: &BundleOptions) -> Result<BundleOutput> {
        let start = Instant::now();
        let project = self.load_project(root, std::slice::from_ref(&options.out_dir))?;
        let mut options = options.clone();
        options.entry = canonical_entry(&project.root, &options.entry);
        options.base_path = project.root.clone();

        let resolver = self.resolver_for(&project);
        let output = bundle(&project.modules, &options, &resolver)?;
        tracing::info!(
            files = project.modules.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "project bundled"
        );
        Ok(output)
    }

    /// Lists the project under `root` without emitting anything.
    ///
    /// # Errors
    ///
    /// Same as [`TsBackend::bundle`].
    pub fn list(&self, root: &Path, options: &ListOptions) -> Result<ListReport> {
        let project = self.load_project(root, &[])?;
        let options = ListOptions {
            base_path: project.root.clone(),
            entry: options
                .entry
                .as_ref()
                .map(|entry| canonical_entry(&project.root, entry)),
            export: options.export.clone(),
        };
        let resolver = self.resolver_for(&project);
        Ok(list_report(&project.modules, &options, &resolver)?)
    }

    /// Writes `output` below `root` (relative output paths are joined onto it)
    /// and returns the written paths.
    ///
    /// # Errors
    ///
    /// Fails on the first file or directory that cannot be written.
    pub fn write_output(output: &BundleOutput, root: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(output.files.len());
        for (path, text) in &output.files {
            let path = root.join(path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| BackendError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&path, text).map_err(|source| BackendError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(file = %path.display(), bytes = text.len(), "written");
            written.push(path);
        }
        Ok(written)
    }
}

/// `entry` made absolute against `root`, canonicalized when it exists so it
/// matches the canonical paths of discovered files.
fn canonical_entry(root: &Path, entry: &Path) -> PathBuf {
    let joined = root.join(entry);
    joined.canonicalize().unwrap_or(joined)
}
