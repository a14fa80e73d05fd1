//! Per-module symbol usage analysis.
//!
//! Builds a reference graph of a module's top-level declarations and import
//! bindings, protects whatever backs a still-used export, and prunes
//! unreferenced leaves until nothing else can be removed.

use crate::extract::extract_edges;
use crate::naming::symbol_keys;
use crate::syntax::{root_identifier, ModuleReference, SourceModule, Statement};
use crate::types::ExportEdge;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Declaration,
    ImportBinding,
}

#[derive(Debug, Clone)]
pub struct SymbolNode {
    pub kind: SymbolKind,
    pub references: BTreeSet<String>,
    pub protected: bool,
}

/// Reference graph of one module, keyed by local name.
///
/// Merged declarations (overloads, interface merging) share a node.
#[derive(Debug, Clone, Default)]
pub struct SymbolGraph {
    nodes: BTreeMap<String, SymbolNode>,
}

impl SymbolGraph {
    /// Builds the graph of `module`, protecting every symbol that backs an
    /// export not listed in `unused_exports`.
    pub fn build(module: &SourceModule, unused_exports: &BTreeSet<String>) -> Self {
        let mut graph = SymbolGraph::default();
        let mut roots: BTreeSet<String> = BTreeSet::new();

        for stmt in &module.statements {
            match stmt {
                Statement::Declaration(decl) => {
                    if decl.is_variable() {
                        for declarator in &decl.declarators {
                            graph.add(
                                &declarator.name,
                                SymbolKind::Declaration,
                                &declarator.references,
                            );
                        }
                    } else {
                        for key in symbol_keys(decl) {
                            graph.add(&key, SymbolKind::Declaration, &decl.references);
                        }
                    }
                }
                Statement::Import(import) => {
                    for binding in import.bindings() {
                        graph.add(binding, SymbolKind::ImportBinding, &BTreeSet::new());
                    }
                }
                Statement::ImportEquals(import) => {
                    let references = match &import.reference {
                        ModuleReference::Entity(entity) => root_identifier(entity)
                            .map(|root| BTreeSet::from([root.to_string()]))
                            .unwrap_or_default(),
                        ModuleReference::External(_) => BTreeSet::new(),
                    };
                    graph.add(&import.name, SymbolKind::ImportBinding, &references);
                }
                Statement::ExportAssignment(assignment) => {
                    if assignment.is_equals || !unused_exports.contains("default") {
                        roots.extend(assignment.references.iter().cloned());
                    }
                }
                Statement::GlobalAugmentation { references, .. }
                | Statement::AmbientModule { references, .. } => {
                    roots.extend(references.iter().cloned());
                }
                Statement::ExportList(_)
                | Statement::ExportAll(_)
                | Statement::NamespaceExport { .. }
                | Statement::Unrecognized { .. } => {}
            }
        }

        let (edges, _) = extract_edges(module);
        for edge in &edges.exports {
            if let ExportEdge::Local { named_exports, .. } = edge {
                roots.extend(
                    named_exports
                        .iter()
                        .filter(|item| !unused_exports.contains(&item.exported_name))
                        .filter_map(|item| root_identifier(item.local_name()))
                        .map(str::to_string),
                );
            }
        }

        for root in roots {
            graph.protect(&root);
        }
        graph
    }

    fn add(&mut self, name: &str, kind: SymbolKind, references: &BTreeSet<String>) {
        let node = self
            .nodes
            .entry(name.to_string())
            .or_insert_with(|| SymbolNode {
                kind,
                references: BTreeSet::new(),
                protected: false,
            });
        node.references
            .extend(references.iter().filter(|r| *r != name).cloned());
    }

    /// Marks `name` as a root. Unknown names are ignored.
    pub fn protect(&mut self, name: &str) -> bool {
        match self.nodes.get_mut(name) {
            Some(node) => {
                node.protected = true;
                true
            }
            None => false,
        }
    }

    pub fn unprotect(&mut self, name: &str) {
        if let Some(node) = self.nodes.get_mut(name) {
            node.protected = false;
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Option<&SymbolNode> {
        self.nodes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Removes unprotected nodes with no live referrer until none are left.
    ///
    /// Unprotected reference cycles survive; only leaves are pruned.
    pub fn dead_symbols(&self) -> BTreeSet<String> {
        let mut incoming: BTreeMap<&str, usize> =
            self.nodes.keys().map(|name| (name.as_str(), 0)).collect();
        for node in self.nodes.values() {
            for target in &node.references {
                if let Some(count) = incoming.get_mut(target.as_str()) {
                    *count += 1;
                }
            }
        }

        let mut queue: VecDeque<&str> = incoming
            .iter()
            .filter(|(name, count)| **count == 0 && !self.nodes[**name].protected)
            .map(|(name, _)| *name)
            .collect();

        let mut dead = BTreeSet::new();
        while let Some(name) = queue.pop_front() {
            if !dead.insert(name.to_string()) {
                continue;
            }
            for target in &self.nodes[name].references {
                let Some(count) = incoming.get_mut(target.as_str()) else {
                    continue;
                };
                *count -= 1;
                if *count == 0 && !self.nodes[target.as_str()].protected {
                    queue.push_back(target.as_str());
                }
            }
        }
        dead
    }
}

/// Local symbols of `module` that are unreferenced once the exports in
/// `unused_exports` are removed.
pub fn find_dead_symbols(module: &SourceModule, unused_exports: &BTreeSet<String>) -> BTreeSet<String> {
    let dead = SymbolGraph::build(module, unused_exports).dead_symbols();
    tracing::trace!(
        file = %module.path.display(),
        dead = dead.len(),
        "dead symbols computed"
    );
    dead
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{
        Declaration, DeclarationKind, ExportList, ImportDeclaration, VariableDeclarator,
        VariableKind,
    };
    use proptest::prelude::*;

    fn decl(name: &str, refs: &[&str]) -> Statement {
        Statement::Declaration(
            Declaration::new(DeclarationKind::Interface, Some(name), format!("interface {name} {{}}"))
                .with_references(refs),
        )
    }

    fn exported(name: &str, refs: &[&str]) -> Statement {
        Statement::Declaration(
            Declaration::new(DeclarationKind::Interface, Some(name), format!("interface {name} {{}}"))
                .with_references(refs)
                .exported(),
        )
    }

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unused_export_cascades_to_helpers() {
        let module = SourceModule::new(
            "/p/a.d.ts",
            vec![
                decl("Helper", &["Inner"]),
                decl("Inner", &[]),
                exported("Api", &["Helper"]),
                exported("Kept", &[]),
            ],
        );
        let dead = find_dead_symbols(&module, &names(&["Api"]));
        assert_eq!(dead, names(&["Api", "Helper", "Inner"]));
    }

    #[test]
    fn test_used_export_protects_its_dependencies() {
        let module = SourceModule::new(
            "/p/a.d.ts",
            vec![decl("Helper", &[]), exported("Api", &["Helper"])],
        );
        assert!(find_dead_symbols(&module, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_unused_export_still_referenced_survives() {
        let module = SourceModule::new(
            "/p/a.d.ts",
            vec![exported("Base", &[]), exported("Api", &["Base"])],
        );
        let dead = find_dead_symbols(&module, &names(&["Base"]));
        assert!(dead.is_empty());
    }

    #[test]
    fn test_import_bindings_are_nodes() {
        let module = SourceModule::new(
            "/p/a.d.ts",
            vec![
                Statement::Import(ImportDeclaration::named("./b", &[("helper", "helper")])),
                Statement::Import(ImportDeclaration::named("./c", &[("kept", "kept")])),
                exported("dead", &["helper"]),
                exported("live", &["kept"]),
            ],
        );
        let dead = find_dead_symbols(&module, &names(&["dead"]));
        assert_eq!(dead, names(&["dead", "helper"]));
    }

    #[test]
    fn test_rename_attributes_usage_to_exported_name() {
        let module = SourceModule::new(
            "/p/a.d.ts",
            vec![
                decl("A", &[]),
                Statement::ExportList(ExportList::local(&[("A", "B")])),
            ],
        );
        assert!(find_dead_symbols(&module, &BTreeSet::new()).is_empty());
        assert_eq!(find_dead_symbols(&module, &names(&["B"])), names(&["A"]));
    }

    #[test]
    fn test_global_augmentation_references_are_roots() {
        let module = SourceModule::new(
            "/p/a.d.ts",
            vec![
                decl("Options", &[]),
                Statement::global("declare global { interface Window { o: Options } }", &["Options"]),
                exported("Unused", &[]),
            ],
        );
        assert_eq!(find_dead_symbols(&module, &names(&["Unused"])), names(&["Unused"]));
    }

    #[test]
    fn test_variable_declarators_are_separate_nodes() {
        let module = SourceModule::new(
            "/p/a.d.ts",
            vec![Statement::Declaration(
                Declaration::variable(
                    VariableKind::Const,
                    vec![
                        VariableDeclarator::new("a", "a: number", &[]),
                        VariableDeclarator::new("b", "b: number", &[]),
                    ],
                )
                .exported(),
            )],
        );
        assert_eq!(find_dead_symbols(&module, &names(&["a"])), names(&["a"]));
    }

    #[test]
    fn test_unprotected_cycle_survives() {
        let module = SourceModule::new(
            "/p/a.d.ts",
            vec![decl("A", &["B"]), decl("B", &["A"]), exported("Api", &[])],
        );
        assert!(find_dead_symbols(&module, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_undeclared_references_are_ignored() {
        let module = SourceModule::new("/p/a.d.ts", vec![exported("Api", &["Promise", "Api"])]);
        assert_eq!(find_dead_symbols(&module, &names(&["Api"])), names(&["Api"]));
    }

    fn arb_graph() -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<bool>)> {
        (1usize..12).prop_flat_map(|n| {
            (
                prop::collection::vec(prop::collection::vec(0..n, 0..4), n),
                prop::collection::vec(any::<bool>(), n),
            )
        })
    }

    fn graph_of(refs: &[Vec<usize>], protected: &[bool]) -> SymbolGraph {
        let mut graph = SymbolGraph::default();
        for (i, targets) in refs.iter().enumerate() {
            let references = targets.iter().map(|t| format!("S{t}")).collect();
            graph.add(&format!("S{i}"), SymbolKind::Declaration, &references);
        }
        for (i, p) in protected.iter().enumerate() {
            if *p {
                graph.protect(&format!("S{i}"));
            }
        }
        graph
    }

    proptest! {
        #[test]
        fn prop_adding_a_root_never_grows_the_dead_set(
            (refs, protected) in arb_graph(),
            extra in 0usize..12,
        ) {
            let mut graph = graph_of(&refs, &protected);
            let before = graph.dead_symbols();
            let extra = format!("S{}", extra % refs.len());
            graph.protect(&extra);
            let after = graph.dead_symbols();
            prop_assert!(after.is_subset(&before));

            graph.unprotect(&extra);
            prop_assert!(graph.dead_symbols().is_superset(&after));
        }

        #[test]
        fn prop_dead_symbols_have_no_live_referrer(
            (refs, protected) in arb_graph(),
        ) {
            let graph = graph_of(&refs, &protected);
            let dead = graph.dead_symbols();
            for name in graph.names() {
                let node = graph.node(name).expect("node");
                if dead.contains(name) {
                    prop_assert!(!node.protected);
                } else {
                    for target in &node.references {
                        prop_assert!(!dead.contains(target));
                    }
                }
            }
        }
    }
}
