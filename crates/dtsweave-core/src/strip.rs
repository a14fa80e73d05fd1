//! Immutable strip transform.
//!
//! A [`StripPlan`] names what to drop from one module; [`strip_module`]
//! builds a new module from the old one without touching it.

use crate::graph::ModuleId;
use crate::naming::symbol_keys;
use crate::reachability::Reachability;
use crate::syntax::{Declaration, ImportDeclaration, SourceModule, Statement};
use crate::symbols::SymbolGraph;
use crate::types::ExportEdge;
use serde::Serialize;
use std::collections::BTreeSet;

/// What to remove from one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StripPlan {
    /// Exported names whose export clauses are removed.
    pub exports: BTreeSet<String>,
    /// Statement indices of `export * from` statements to remove.
    pub star_statements: BTreeSet<usize>,
    /// Local declarations and import bindings to remove.
    pub symbols: BTreeSet<String>,
}

impl StripPlan {
    pub fn is_empty(&self) -> bool {
        self.exports.is_empty() && self.star_statements.is_empty() && self.symbols.is_empty()
    }

    /// Plans the removals for `module` from its reachability result.
    ///
    /// An unused export is removed when its backing symbol is dead or is not
    /// declared in this module. Global scripts are never stripped.
    pub fn for_module(module: &SourceModule, id: ModuleId, reach: &Reachability) -> Self {
        let mut plan = StripPlan::default();
        let unused = reach.unused_exports(id);
        if (unused.is_empty() && reach.is_used(id)) || !module.is_module() {
            return plan;
        }

        let unused_names = reach.unused_names(id);
        let graph = SymbolGraph::build(module, &unused_names);
        plan.symbols = graph.dead_symbols();

        let (edges, _) = crate::extract::extract_edges(module);
        for entry in unused {
            let Some(edge) = edges.exports.get(entry.edge) else {
                continue;
            };
            match (&entry.item, edge) {
                (None, _) => {
                    if !reach.is_used(id) {
                        plan.star_statements.insert(edge.statement());
                    }
                }
                (Some(item), ExportEdge::ReExport { .. }) => {
                    plan.exports.insert(item.exported_name.clone());
                }
                (Some(item), _) => {
                    let local = item.local_name();
                    if !graph.contains(local) || plan.symbols.contains(local) {
                        plan.exports.insert(item.exported_name.clone());
                    }
                }
            }
        }
        plan
    }
}

/// Returns a copy of `module` with everything in `plan` removed.
///
/// A multi-name export or import that loses every member is removed whole,
/// as is a variable statement that loses every declarator.
pub fn strip_module(module: &SourceModule, plan: &StripPlan) -> SourceModule {
    if plan.is_empty() {
        return module.clone();
    }
    let statements = module
        .statements
        .iter()
        .enumerate()
        .filter_map(|(index, stmt)| strip_statement(index, stmt, plan))
        .collect();
    SourceModule::new(module.path.clone(), statements)
}

fn strip_statement(index: usize, stmt: &Statement, plan: &StripPlan) -> Option<Statement> {
    match stmt {
        Statement::Import(import) => strip_import(import, plan).map(Statement::Import),
        Statement::ImportEquals(import) => {
            let dead = plan.symbols.contains(&import.name)
                || (import.exported && plan.exports.contains(&import.name));
            (!dead).then(|| stmt.clone())
        }
        Statement::ExportList(list) => {
            let mut list = list.clone();
            list.specifiers
                .retain(|s| !plan.exports.contains(&s.exported));
            (!list.specifiers.is_empty()).then_some(Statement::ExportList(list))
        }
        Statement::ExportAll(all) => {
            let dead = match &all.alias {
                Some(alias) => plan.exports.contains(alias),
                None => plan.star_statements.contains(&index),
            };
            (!dead).then(|| stmt.clone())
        }
        Statement::ExportAssignment(assignment) => {
            let dead = !assignment.is_equals && plan.exports.contains("default");
            (!dead).then(|| stmt.clone())
        }
        Statement::Declaration(decl) => strip_declaration(decl, plan).map(Statement::Declaration),
        Statement::NamespaceExport { .. }
        | Statement::GlobalAugmentation { .. }
        | Statement::AmbientModule { .. }
        | Statement::Unrecognized { .. } => Some(stmt.clone()),
    }
}

fn strip_import(import: &ImportDeclaration, plan: &StripPlan) -> Option<ImportDeclaration> {
    if !import.has_bindings() {
        return Some(import.clone());
    }
    let keep = |name: &String| !plan.symbols.contains(name);
    let mut import = import.clone();
    import.default_binding = import.default_binding.filter(keep);
    import.namespace_binding = import.namespace_binding.filter(keep);
    import.named.retain(|s| keep(&s.local));
    import.has_bindings().then_some(import)
}

fn strip_declaration(decl: &Declaration, plan: &StripPlan) -> Option<Declaration> {
    if decl.is_variable() {
        let kept = decl.retain_declarators(|d| !plan.symbols.contains(&d.name));
        return (!kept.declarators.is_empty()).then_some(kept);
    }
    let dead = symbol_keys(decl)
        .iter()
        .any(|key| plan.symbols.contains(key));
    (!dead).then(|| decl.clone())
}
