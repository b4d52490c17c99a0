//! Cell dependency graph and circular-reference detection.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::core::CellRef;
use crate::formula::{normalize_reference, references_in};

/// Directed graph from a cell to the cells its formula reads.
///
/// Built once per analysis run and read-only thereafter. References that do
/// not resolve to a formula-bearing cell are kept as edges but treated as
/// leaves during traversal. A range reference contributes only its first
/// endpoint as an edge.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: HashMap<CellRef, Vec<CellRef>>,
}

impl DependencyGraph {
    /// Build the graph from every formula-bearing cell in the workbook.
    pub fn build(formula_cells: &[(CellRef, &str)]) -> Self {
        let mut edges: HashMap<CellRef, Vec<CellRef>> = HashMap::new();
        for (cell, formula) in formula_cells {
            let deps = references_in(formula)
                .iter()
                .filter_map(|raw| normalize_reference(raw, &cell.sheet))
                .collect();
            edges.insert(cell.clone(), deps);
        }
        Self { edges }
    }

    #[cfg(test)]
    pub fn add_edge(&mut self, from: CellRef, to: CellRef) {
        self.edges.entry(from).or_default().push(to);
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|deps| deps.len()).sum()
    }

    pub fn dependencies(&self, cell: &CellRef) -> &[CellRef] {
        self.edges.get(cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every cell participating in at least one dependency cycle.
    ///
    /// Runs an explicit stack-based DFS from every node with an owned path
    /// vector and owned on-path set per start, so shared descendants of
    /// non-cyclic diamonds never produce false positives and pathological
    /// graphs (a 10,000-cell linear chain) cannot blow the call stack.
    /// The result is a sorted set: deterministic in content across runs.
    pub fn cycle_cells(&self) -> BTreeSet<CellRef> {
        let mut in_cycle = BTreeSet::new();
        let mut starts: Vec<&CellRef> = self.edges.keys().collect();
        starts.sort();
        for start in starts {
            self.mark_cycles_from(start, &mut in_cycle);
        }
        in_cycle
    }

    fn mark_cycles_from(&self, start: &CellRef, in_cycle: &mut BTreeSet<CellRef>) {
        let mut visited: HashSet<&CellRef> = HashSet::new();
        let mut on_path: HashSet<&CellRef> = HashSet::new();
        let mut path: Vec<&CellRef> = Vec::new();
        let mut stack: Vec<(&CellRef, usize)> = Vec::new();

        visited.insert(start);
        on_path.insert(start);
        path.push(start);
        stack.push((start, 0));

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let deps = self.dependencies(node);
            if frame.1 < deps.len() {
                let next = &deps[frame.1];
                frame.1 += 1;
                if on_path.contains(next) {
                    // Everything from the revisited node's first occurrence
                    // on the path through the current node is on a cycle.
                    if let Some(pos) = path.iter().position(|cell| *cell == next) {
                        for cell in &path[pos..] {
                            in_cycle.insert((*cell).clone());
                        }
                    }
                } else if !visited.contains(next) && self.edges.contains_key(next) {
                    // Cells with no known formula are dead ends, not followed.
                    visited.insert(next);
                    on_path.insert(next);
                    path.push(next);
                    stack.push((next, 0));
                }
            } else {
                stack.pop();
                path.pop();
                on_path.remove(node);
            }
        }
    }
}
