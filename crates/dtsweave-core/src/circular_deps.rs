//! Import cycle detection using Tarjan's algorithm.
//!
//! Cycles never affect bundling; reachability terminates on them by
//! construction. They are reported by the list mode because cyclic
//! declaration files are usually worth knowing about.

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

const MAX_MODULES: usize = 100_000;
const MAX_CYCLE_DEPTH: usize = 1_000;

/// Files that import each other, directly or transitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportCycle {
    /// Members of the cycle, sorted.
    pub modules: Vec<PathBuf>,
}

/// Finds strongly connected components of size two or more.
pub struct ImportCycleDetector {
    nodes: Vec<PathBuf>,
    edges: Vec<Vec<usize>>,
    index_counter: usize,
    stack: Vec<usize>,
    indices: Vec<Option<usize>>,
    low_links: Vec<usize>,
    on_stack: Vec<bool>,
    sccs: Vec<Vec<usize>>,
}

impl ImportCycleDetector {
    /// Creates a detector from a map of module path to the paths it imports.
    /// Dependencies missing from the map's keys are ignored.
    pub fn new(dependencies: HashMap<PathBuf, Vec<PathBuf>>) -> Self {
        let mut nodes: Vec<PathBuf> = dependencies.keys().cloned().collect();
        nodes.sort();
        let position: HashMap<&PathBuf, usize> =
            nodes.iter().enumerate().map(|(i, p)| (p, i)).collect();
        let edges = nodes
            .iter()
            .map(|node| {
                dependencies
                    .get(node)
                    .into_iter()
                    .flatten()
                    .filter_map(|dep| position.get(dep).copied())
                    .collect()
            })
            .collect();
        let count = nodes.len();
        Self {
            nodes,
            edges,
            index_counter: 0,
            stack: Vec::new(),
            indices: vec![None; count],
            low_links: vec![0; count],
            on_stack: vec![false; count],
            sccs: Vec::new(),
        }
    }

    /// # Errors
    /// - `Error::GraphTooLarge` if module count exceeds MAX_MODULES
    /// - `Error::CycleTooDeep` if the search recurses deeper than MAX_CYCLE_DEPTH
    pub fn find_cycles(&mut self) -> Result<Vec<ImportCycle>> {
        if self.nodes.len() > MAX_MODULES {
            return Err(Error::GraphTooLarge {
                module_count: self.nodes.len(),
                max_allowed: MAX_MODULES,
            });
        }

        for v in 0..self.nodes.len() {
            if self.indices[v].is_none() {
                self.strongconnect(v)?;
            }
        }

        let mut cycles: Vec<ImportCycle> = self
            .sccs
            .iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut modules: Vec<PathBuf> =
                    scc.iter().map(|i| self.nodes[*i].clone()).collect();
                modules.sort();
                ImportCycle { modules }
            })
            .collect();
        cycles.sort_by(|a, b| a.modules.cmp(&b.modules));
        Ok(cycles)
    }

    fn strongconnect(&mut self, v: usize) -> Result<()> {
        if self.stack.len() > MAX_CYCLE_DEPTH {
            return Err(Error::CycleTooDeep {
                depth: self.stack.len(),
                max_allowed: MAX_CYCLE_DEPTH,
            });
        }

        let index = self.index_counter;
        self.indices[v] = Some(index);
        self.low_links[v] = index;
        self.index_counter += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        for w in self.edges[v].clone() {
            match self.indices[w] {
                None => {
                    self.strongconnect(w)?;
                    self.low_links[v] = self.low_links[v].min(self.low_links[w]);
                }
                Some(w_index) if self.on_stack[w] => {
                    self.low_links[v] = self.low_links[v].min(w_index);
                }
                Some(_) => {}
            }
        }

        if Some(self.low_links[v]) == self.indices[v] {
            let mut scc = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack[w] = false;
                scc.push(w);
                if w == v {
                    break;
                }
            }
            self.sccs.push(scc);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_graph(edges: Vec<(&str, Vec<&str>)>) -> HashMap<PathBuf, Vec<PathBuf>> {
        edges
            .into_iter()
            .map(|(from, tos)| {
                (
                    PathBuf::from(from),
                    tos.into_iter().map(PathBuf::from).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_simple_cycle() {
        // a → b → c → a
        let graph = create_graph(vec![
            ("a.d.ts", vec!["b.d.ts"]),
            ("b.d.ts", vec!["c.d.ts"]),
            ("c.d.ts", vec!["a.d.ts"]),
        ]);

        let cycles = ImportCycleDetector::new(graph).find_cycles().unwrap();

        assert_eq!(cycles.len(), 1);
        assert_eq!(
            cycles[0].modules,
            vec![
                PathBuf::from("a.d.ts"),
                PathBuf::from("b.d.ts"),
                PathBuf::from("c.d.ts")
            ]
        );
    }

    #[test]
    fn test_no_cycles() {
        let graph = create_graph(vec![("a", vec!["b"]), ("b", vec!["c"]), ("c", vec![])]);
        let cycles = ImportCycleDetector::new(graph).find_cycles().unwrap();
        assert!(cycles.is_empty());
    }

    #[test]
    fn test_multiple_cycles() {
        let graph = create_graph(vec![
            ("a", vec!["b"]),
            ("b", vec!["a"]),
            ("c", vec!["d"]),
            ("d", vec!["c", "external"]),
        ]);
        let cycles = ImportCycleDetector::new(graph).find_cycles().unwrap();
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[1].modules, vec![PathBuf::from("c"), PathBuf::from("d")]);
    }

    #[test]
    fn test_graph_too_large() {
        let mut graph = HashMap::new();
        for i in 0..150_000 {
            graph.insert(PathBuf::from(format!("mod{}.d.ts", i)), vec![]);
        }

        let result = ImportCycleDetector::new(graph).find_cycles();
        assert!(matches!(result, Err(Error::GraphTooLarge { .. })));
    }
}
