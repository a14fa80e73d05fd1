//! Export reachability analysis.
//!
//! Starting from the entry export, exports are proven used by following
//! import and re-export edges through the [`ModuleGraph`] until a fixpoint.
//! Whatever is never proven used is a strip candidate.
//!
//! The analysis is coarse in three places: a namespace import
//! (`import * as ns`), any re-export edge, and any import of a module with an
//! `export =` assignment mark the whole target module used. That is never
//! narrowed afterwards. A module with an `export =` assignment is used even
//! when nothing imports it.

use crate::error::{ConfigurationError, Result};
use crate::graph::{EdgeTarget, ModuleGraph, ModuleId};
use crate::types::{ExportEdge, NamedExportItem};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::PathBuf;

/// An export that was never proven used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedExport {
    /// Index into the module's export edges.
    pub edge: usize,
    /// `None` for an `export * from` edge.
    pub item: Option<NamedExportItem>,
}

/// Result of [`analyze_reachability`].
#[derive(Debug, Clone, Default)]
pub struct Reachability {
    /// Not-yet-proven exports per module; modules with nothing unused are absent.
    pub unused: BTreeMap<ModuleId, Vec<UnusedExport>>,
    /// Modules with at least one proven-used export.
    pub used_modules: BTreeSet<ModuleId>,
    /// Out-of-bundle modules referenced from used modules.
    pub external_references: BTreeSet<PathBuf>,
}

impl Reachability {
    pub fn unused_exports(&self, id: ModuleId) -> &[UnusedExport] {
        self.unused.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Exported names of `id` that were never proven used.
    pub fn unused_names(&self, id: ModuleId) -> BTreeSet<String> {
        self.unused_exports(id)
            .iter()
            .filter_map(|u| u.item.as_ref().map(|i| i.exported_name.clone()))
            .collect()
    }

    pub fn is_used(&self, id: ModuleId) -> bool {
        self.used_modules.contains(&id)
    }
}

#[derive(Debug, Default)]
struct PendingEdge {
    edge: usize,
    star: bool,
    items: Vec<NamedExportItem>,
}

#[derive(Debug, Default)]
struct ModuleState {
    fully_used: bool,
    /// `export = X` makes every import of the module an import of all of it.
    assignment: bool,
    enqueued: bool,
    pending: Vec<PendingEdge>,
}

/// Worklist state of one analysis run.
struct Analyzer<'g> {
    graph: &'g ModuleGraph,
    states: Vec<ModuleState>,
    queue: VecDeque<ModuleId>,
    external_references: BTreeSet<PathBuf>,
}

impl<'g> Analyzer<'g> {
    fn new(graph: &'g ModuleGraph) -> Self {
        let states = graph
            .iter()
            .map(|(_, module)| ModuleState {
                assignment: module.edges.has_assignment(),
                pending: module
                    .edges
                    .exports
                    .iter()
                    .enumerate()
                    .filter(|(_, edge)| !matches!(edge, ExportEdge::Assignment { .. }))
                    .map(|(index, edge)| PendingEdge {
                        edge: index,
                        star: edge.is_star(),
                        items: edge.named_exports().to_vec(),
                    })
                    .collect(),
                ..ModuleState::default()
            })
            .collect();
        Self {
            graph,
            states,
            queue: VecDeque::new(),
            external_references: BTreeSet::new(),
        }
    }

    /// Marks `name` of `id` used, or the whole module when `name` is `None`
    /// or `id` has an `export =` assignment. Returns whether anything new was
    /// proven.
    fn mark(&mut self, id: ModuleId, name: Option<&str>) -> bool {
        let state = &mut self.states[id.0];
        if state.fully_used {
            return false;
        }
        let name = name.filter(|n| *n != "*" && !state.assignment);
        let changed = match name {
            None => {
                state.fully_used = true;
                state.pending.clear();
                true
            }
            Some(name) => {
                let mut hit = false;
                for pending in &mut state.pending {
                    let before = pending.items.len();
                    pending.items.retain(|item| item.exported_name != name);
                    hit |= pending.items.len() != before;
                }
                if !hit {
                    // Not a named export here; it can only come from `export *`.
                    let before = state.pending.len();
                    state.pending.retain(|p| !p.star);
                    hit = state.pending.len() != before;
                }
                state.pending.retain(|p| p.star || !p.items.is_empty());
                hit
            }
        };
        if changed && !state.enqueued {
            state.enqueued = true;
            self.queue.push_back(id);
        }
        changed
    }

    /// Queues `id` for edge-following without proving any export used.
    fn touch(&mut self, id: ModuleId) {
        let state = &mut self.states[id.0];
        if !state.enqueued {
            state.enqueued = true;
            self.queue.push_back(id);
        }
    }

    fn follow(&mut self, id: ModuleId) {
        let graph = self.graph;
        let module = graph.module(id);
        for (edge, target) in module.edges.imports.iter().zip(&module.import_targets) {
            if edge.local_name.is_none() {
                continue;
            }
            match target {
                Some(EdgeTarget::Internal(next)) => {
                    self.mark(*next, edge.used_export());
                }
                Some(EdgeTarget::External(path)) => {
                    self.external_references.insert(path.clone());
                }
                Some(EdgeTarget::Unresolved) | None => {}
            }
        }
        for target in module.export_targets.iter().flatten() {
            match target {
                EdgeTarget::Internal(next) => {
                    self.mark(*next, None);
                }
                EdgeTarget::External(path) => {
                    self.external_references.insert(path.clone());
                }
                EdgeTarget::Unresolved => {}
            }
        }
    }

    fn finish(self) -> Reachability {
        let mut result = Reachability {
            external_references: self.external_references,
            ..Reachability::default()
        };
        for (index, state) in self.states.into_iter().enumerate() {
            let id = ModuleId(index);
            if state.enqueued {
                result.used_modules.insert(id);
            }
            let unused: Vec<UnusedExport> = state
                .pending
                .into_iter()
                .flat_map(|pending| {
                    let edge = pending.edge;
                    if pending.star {
                        vec![UnusedExport { edge, item: None }]
                    } else {
                        pending
                            .items
                            .into_iter()
                            .map(|item| UnusedExport {
                                edge,
                                item: Some(item),
                            })
                            .collect()
                    }
                })
                .collect();
            if !unused.is_empty() {
                result.unused.insert(id, unused);
            }
        }
        result
    }
}

/// Computes the exports of every module that are not reachable from `export`
/// of `entry` (`None` or `*` publishes the whole entry module).
///
/// # Errors
///
/// Returns [`ConfigurationError::EntryExportNotFound`] when the entry module
/// does not export `export`, directly or through `export *` chains.
#[tracing::instrument(level = "debug", skip(graph))]
pub fn analyze_reachability(
    graph: &ModuleGraph,
    entry: ModuleId,
    export: Option<&str>,
) -> Result<Reachability> {
    let export = export.filter(|e| *e != "*");
    if let Some(name) = export {
        if !graph.exports_name(entry, name) {
            return Err(ConfigurationError::EntryExportNotFound {
                entry: graph.module(entry).path.clone(),
                export: name.to_string(),
            }
            .into());
        }
    }

    let mut analyzer = Analyzer::new(graph);
    if !analyzer.mark(entry, export) {
        // the entry is used even when nothing new was proven
        analyzer.touch(entry);
    }
    for (id, module) in graph.iter() {
        if module.edges.has_assignment() {
            analyzer.mark(id, None);
        }
    }

    let mut passes = 0usize;
    while let Some(id) = analyzer.queue.pop_front() {
        passes += 1;
        analyzer.follow(id);
    }

    let result = analyzer.finish();
    tracing::debug!(
        passes,
        used = result.used_modules.len(),
        with_unused = result.unused.len(),
        "reachability fixpoint reached"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FileSetResolver;
    use crate::syntax::{
        Declaration, DeclarationKind, ExportAll, ExportAssignment, ExportList,
        ImportDeclaration, SourceModule, Statement,
    };
    use crate::Error;

    fn iface(name: &str) -> Statement {
        Statement::Declaration(
            Declaration::new(
                DeclarationKind::Interface,
                Some(name),
                format!("interface {name} {{}}"),
            )
            .exported(),
        )
    }

    fn run(modules: &[SourceModule], export: Option<&str>) -> Result<(ModuleGraph, Reachability)> {
        let resolver = FileSetResolver::from_modules(modules);
        let (graph, _) = ModuleGraph::build(modules, &resolver);
        let reach = analyze_reachability(&graph, ModuleId(0), export)?;
        Ok((graph, reach))
    }

    #[test]
    fn test_unrequested_entry_export_is_unused() {
        let modules = vec![SourceModule::new("/p/a.d.ts", vec![iface("foo"), iface("bar")])];
        let (_, reach) = run(&modules, Some("foo")).expect("analysis");
        assert_eq!(
            reach.unused_names(ModuleId(0)),
            BTreeSet::from(["bar".to_string()])
        );
    }

    #[test]
    fn test_named_import_marks_only_that_export() {
        let modules = vec![
            SourceModule::new(
                "/p/a.d.ts",
                vec![
                    Statement::Import(ImportDeclaration::named("./b", &[("x", "x")])),
                    iface("A"),
                ],
            ),
            SourceModule::new("/p/b.d.ts", vec![iface("x"), iface("y")]),
        ];
        let (_, reach) = run(&modules, None).expect("analysis");
        assert!(reach.unused_exports(ModuleId(0)).is_empty());
        assert_eq!(
            reach.unused_names(ModuleId(1)),
            BTreeSet::from(["y".to_string()])
        );
        assert!(reach.is_used(ModuleId(1)));
    }

    #[test]
    fn test_default_import_marks_default_export() {
        let modules = vec![
            SourceModule::new(
                "/p/a.d.ts",
                vec![Statement::Import(ImportDeclaration::default_import("./b", "B"))],
            ),
            SourceModule::new(
                "/p/b.d.ts",
                vec![
                    Statement::Declaration(
                        Declaration::new(DeclarationKind::Class, Some("Impl"), "class Impl {}")
                            .as_default(),
                    ),
                    iface("other"),
                ],
            ),
        ];
        let (_, reach) = run(&modules, None).expect("analysis");
        assert_eq!(
            reach.unused_names(ModuleId(1)),
            BTreeSet::from(["other".to_string()])
        );
    }

    #[test]
    fn test_star_reexport_marks_whole_module() {
        let modules = vec![
            SourceModule::new("/p/a.d.ts", vec![Statement::ExportAll(ExportAll::new("./b"))]),
            SourceModule::new("/p/b.d.ts", vec![iface("x"), iface("y")]),
        ];
        let (_, reach) = run(&modules, Some("x")).expect("analysis");
        assert!(reach.unused_exports(ModuleId(0)).is_empty());
        assert!(reach.unused_exports(ModuleId(1)).is_empty());
    }

    #[test]
    fn test_named_reexport_marks_whole_target() {
        let modules = vec![
            SourceModule::new(
                "/p/a.d.ts",
                vec![
                    Statement::ExportList(ExportList::from_source("./b", &[("x", "x")])),
                    iface("Other"),
                ],
            ),
            SourceModule::new("/p/b.d.ts", vec![iface("x"), iface("y")]),
        ];
        let (_, reach) = run(&modules, Some("Other")).expect("analysis");
        // the re-export of `x` is itself unused, but following it still
        // marks all of `b` used until the edge is stripped
        assert_eq!(
            reach.unused_names(ModuleId(0)),
            BTreeSet::from(["x".to_string()])
        );
        assert!(reach.is_used(ModuleId(1)));
        assert!(reach.unused_exports(ModuleId(1)).is_empty());
    }

    #[test]
    fn test_namespace_import_marks_whole_module() {
        let modules = vec![
            SourceModule::new(
                "/p/a.d.ts",
                vec![
                    Statement::Import(ImportDeclaration::namespace("./b", "ns")),
                    iface("A"),
                ],
            ),
            SourceModule::new("/p/b.d.ts", vec![iface("x"), iface("y")]),
        ];
        let (_, reach) = run(&modules, Some("A")).expect("analysis");
        assert!(reach.unused_exports(ModuleId(1)).is_empty());
    }

    #[test]
    fn test_import_cycle_terminates() {
        let modules = vec![
            SourceModule::new(
                "/p/a.d.ts",
                vec![
                    Statement::Import(ImportDeclaration::named("./b", &[("B", "B")])),
                    iface("A"),
                ],
            ),
            SourceModule::new(
                "/p/b.d.ts",
                vec![
                    Statement::Import(ImportDeclaration::named("./a", &[("A", "A")])),
                    iface("B"),
                ],
            ),
        ];
        let (_, reach) = run(&modules, Some("A")).expect("analysis");
        assert!(reach.unused.is_empty());
        assert_eq!(reach.used_modules.len(), 2);
    }

    #[test]
    fn test_missing_entry_export_is_configuration_error() {
        let modules = vec![SourceModule::new("/p/a.d.ts", vec![iface("foo")])];
        let err = run(&modules, Some("nope")).expect_err("must fail");
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::EntryExportNotFound { .. })
        ));
    }

    #[test]
    fn test_assignment_export_is_always_used() {
        let modules = vec![SourceModule::new(
            "/p/a.d.ts",
            vec![
                Statement::ExportAssignment(ExportAssignment::equals("Foo")),
                iface("Other"),
            ],
        )];
        let (_, reach) = run(&modules, Some("anything")).expect("analysis");
        assert!(reach.is_used(ModuleId(0)));
        assert!(reach.unused.is_empty());
    }

    #[test]
    fn test_default_import_of_assignment_module_follows_its_imports() {
        let modules = vec![
            SourceModule::new(
                "/p/a.d.ts",
                vec![
                    Statement::Import(ImportDeclaration::default_import("./b", "Foo")),
                    iface("Api"),
                ],
            ),
            SourceModule::new(
                "/p/b.d.ts",
                vec![
                    Statement::Import(ImportDeclaration::named("./c", &[("X", "X")])),
                    Statement::Declaration(Declaration::new(
                        DeclarationKind::Class,
                        Some("Foo"),
                        "class Foo { x: X }",
                    )),
                    Statement::ExportAssignment(ExportAssignment::equals("Foo")),
                ],
            ),
            SourceModule::new("/p/c.d.ts", vec![iface("X"), iface("Y")]),
        ];
        let (_, reach) = run(&modules, Some("Api")).expect("analysis");
        assert!(reach.is_used(ModuleId(1)));
        assert!(reach.is_used(ModuleId(2)));
        assert_eq!(
            reach.unused_names(ModuleId(2)),
            BTreeSet::from(["Y".to_string()])
        );
    }

    #[test]
    fn test_unimported_assignment_module_is_still_followed() {
        let modules = vec![
            SourceModule::new("/p/a.d.ts", vec![iface("Api")]),
            SourceModule::new(
                "/p/b.d.ts",
                vec![
                    Statement::Import(ImportDeclaration::named("./c", &[("X", "X")])),
                    Statement::ExportAssignment(ExportAssignment::equals("X")),
                ],
            ),
            SourceModule::new("/p/c.d.ts", vec![iface("X")]),
        ];
        let (_, reach) = run(&modules, None).expect("analysis");
        assert!(reach.is_used(ModuleId(1)));
        assert!(reach.unused_exports(ModuleId(2)).is_empty());
    }

    #[test]
    fn test_unresolved_import_is_a_leaf() {
        let modules = vec![SourceModule::new(
            "/p/a.d.ts",
            vec![
                Statement::Import(ImportDeclaration::named("./gone", &[("g", "g")])),
                Statement::Import(ImportDeclaration::named("lodash", &[("map", "map")])),
                iface("A"),
            ],
        )];
        let (_, reach) = run(&modules, None).expect("analysis");
        assert!(reach.unused.is_empty());
        assert_eq!(
            reach.external_references,
            BTreeSet::from([PathBuf::from("lodash")])
        );
    }
}
