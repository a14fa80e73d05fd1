//! Module graph of a bundling run.

use crate::backend::ModuleResolver;
use crate::extract::extract_edges;
use crate::syntax::SourceModule;
use crate::types::{Diagnostic, DiagnosticKind, ExportEdge, ModuleEdges};
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

/// Index of a module in its [`ModuleGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub usize);

/// Where an import or re-export edge points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeTarget {
    Internal(ModuleId),
    /// Outside the bundle; keyed by resolved path.
    External(PathBuf),
    Unresolved,
}

/// A module with its extracted edges and their resolved targets.
#[derive(Debug, Clone)]
pub struct ModuleNode {
    pub path: PathBuf,
    pub edges: ModuleEdges,
    /// Parallel to `edges.imports`; `None` for entity aliases.
    pub import_targets: Vec<Option<EdgeTarget>>,
    /// Parallel to `edges.exports`; `None` for edges without a specifier.
    pub export_targets: Vec<Option<EdgeTarget>>,
}

#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: Vec<ModuleNode>,
    index: HashMap<PathBuf, ModuleId>,
}

impl ModuleGraph {
    /// Extracts and resolves the edges of every module.
    ///
    /// Module paths are expected to be normalized already. Extraction and
    /// resolution warnings are returned next to the graph.
    pub fn build(
        modules: &[SourceModule],
        resolver: &dyn ModuleResolver,
    ) -> (Self, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let index: HashMap<PathBuf, ModuleId> = modules
            .iter()
            .enumerate()
            .map(|(i, m)| (m.path.clone(), ModuleId(i)))
            .collect();

        let mut nodes = Vec::with_capacity(modules.len());
        for module in modules {
            let (edges, extract_diagnostics) = extract_edges(module);
            diagnostics.extend(extract_diagnostics);

            let mut resolve = |specifier: &str| {
                let target = match resolver.resolve(specifier, &module.path) {
                    Some(resolved) if !resolved.is_external => {
                        let path = normalize_path(&resolved.resolved_path);
                        match index.get(&path) {
                            Some(id) => EdgeTarget::Internal(*id),
                            None => EdgeTarget::External(path),
                        }
                    }
                    Some(resolved) => EdgeTarget::External(resolved.resolved_path),
                    None => {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticKind::UnresolvableReference,
                            &module.path,
                            format!("cannot resolve module '{specifier}'"),
                        ));
                        EdgeTarget::Unresolved
                    }
                };
                Some(target)
            };

            let import_targets = edges
                .imports
                .iter()
                .map(|edge| {
                    if edge.entity_alias {
                        None
                    } else {
                        resolve(&edge.module_specifier)
                    }
                })
                .collect();
            let export_targets = edges
                .exports
                .iter()
                .map(|edge| edge.module_specifier().and_then(&mut resolve))
                .collect();

            nodes.push(ModuleNode {
                path: module.path.clone(),
                edges,
                import_targets,
                export_targets,
            });
        }

        tracing::debug!(
            modules = nodes.len(),
            warnings = diagnostics.len(),
            "module graph built"
        );
        (
            Self {
                modules: nodes,
                index,
            },
            diagnostics,
        )
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module(&self, id: ModuleId) -> &ModuleNode {
        &self.modules[id.0]
    }

    pub fn id_of(&self, path: &Path) -> Option<ModuleId> {
        self.index.get(path).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &ModuleNode)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId(i), m))
    }

    /// Finds the entry module: exact path, `.d.ts` written as `.ts`, or the
    /// path without its extension.
    pub fn find_entry(&self, entry: &Path) -> Option<ModuleId> {
        let entry = normalize_path(entry);
        if let Some(id) = self.id_of(&entry) {
            return Some(id);
        }
        let wanted = entry.to_string_lossy().into_owned();
        self.iter().find_map(|(id, module)| {
            let path = module.path.to_string_lossy();
            let as_ts = path.strip_suffix(".d.ts").map(|s| format!("{s}.ts"));
            let stem = crate::naming::strip_module_extension(&path);
            (as_ts.as_deref() == Some(wanted.as_str()) || stem == wanted).then_some(id)
        })
    }

    /// Whether `name` is exported by `id`, directly or through `export *`
    /// chains. A module with `export =`, or a star re-export of a module
    /// outside the bundle, is assumed to export anything.
    pub fn exports_name(&self, id: ModuleId, name: &str) -> bool {
        let mut visited = HashSet::new();
        self.exports_name_inner(id, name, &mut visited)
    }

    fn exports_name_inner(&self, id: ModuleId, name: &str, visited: &mut HashSet<ModuleId>) -> bool {
        if !visited.insert(id) {
            return false;
        }
        let module = self.module(id);
        if module.edges.has_assignment() {
            return true;
        }
        if module
            .edges
            .exports
            .iter()
            .flat_map(ExportEdge::named_exports)
            .any(|item| item.exported_name == name)
        {
            return true;
        }
        module
            .edges
            .exports
            .iter()
            .zip(&module.export_targets)
            .filter(|(edge, _)| edge.is_star())
            .any(|(_, target)| match target {
                Some(EdgeTarget::Internal(next)) => self.exports_name_inner(*next, name, visited),
                Some(_) => true,
                None => false,
            })
    }

    /// Internal import and re-export dependencies per module path.
    pub fn dependency_map(&self) -> HashMap<PathBuf, Vec<PathBuf>> {
        self.iter()
            .map(|(_, module)| {
                let mut deps: Vec<PathBuf> = Vec::new();
                for target in module
                    .import_targets
                    .iter()
                    .chain(&module.export_targets)
                    .flatten()
                {
                    if let EdgeTarget::Internal(dep) = target {
                        let path = self.module(*dep).path.clone();
                        if !deps.contains(&path) {
                            deps.push(path);
                        }
                    }
                }
                (module.path.clone(), deps)
            })
            .collect()
    }
}

/// Lexically removes `.` and `..` components. No file-system access.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
