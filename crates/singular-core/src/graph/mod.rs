//! # Singular Dependency Graph
//!
//! Turns registered units into a directed graph of hard dependencies
//! (`unit -> dependency`) and produces a deterministic initialization order in
//! which every dependency precedes its dependents.
//!
//! Weak dependencies never become edges, which is what allows two units to
//! refer to each other without forming a cycle. Every registered unit is a
//! node, so isolated units still appear in the order.
pub mod error;

use std::collections::{BTreeMap, BTreeSet};

pub use error::GraphError;

use crate::unit::UnitDescriptor;

/// Dependency graph over hard unit dependencies
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Nodes in the graph (unit names)
    nodes: BTreeSet<String>,
    /// Edges in the graph (unit -> hard dependencies)
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create a new dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for a set of unit descriptors
    pub fn from_units<'a, I>(units: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a UnitDescriptor)>,
    {
        let mut graph = Self::new();
        for (name, descriptor) in units {
            graph.add_node(name);
            for target in descriptor.hard_targets() {
                graph.add_edge(name, target);
            }
        }
        graph
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, id: &str) {
        self.nodes.insert(id.to_string());
    }

    /// Add an edge to the graph (`unit` depends on `dependency`).
    ///
    /// Edges towards names that are not nodes are kept but ignored by ordering,
    /// so removing a unit never invalidates the graph of the remaining ones.
    pub fn add_edge(&mut self, unit: &str, dependency: &str) {
        self.nodes.insert(unit.to_string());
        self.edges
            .entry(unit.to_string())
            .or_default()
            .insert(dependency.to_string());
    }

    /// Check if the graph contains a node
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over node names in lexical order
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// Hard dependencies of a node that are themselves nodes
    pub fn dependencies_of(&self, id: &str) -> Vec<String> {
        self.present_dependencies(id).map(str::to_string).collect()
    }

    /// Nodes that hard-depend on `id`
    pub fn dependents_of(&self, id: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|(unit, deps)| self.nodes.contains(*unit) && deps.contains(id))
            .map(|(unit, _)| unit.clone())
            .collect()
    }

    fn present_dependencies<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .get(id)
            .into_iter()
            .flatten()
            .filter(|dep| self.nodes.contains(*dep))
            .map(String::as_str)
    }

    /// Check if the graph contains cycles
    pub fn has_cycles(&self) -> bool {
        self.topological_order().is_err()
    }

    /// Initialization order, dependencies first.
    ///
    /// Kahn's algorithm over a sorted ready set, so the order is fully
    /// deterministic: among units whose dependencies are satisfied the
    /// lexically smallest goes first.
    pub fn topological_order(&self) -> Result<Vec<String>, GraphError> {
        let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for node in &self.nodes {
            let mut count = 0;
            for dep in self.present_dependencies(node) {
                count += 1;
                dependents.entry(dep).or_default().push(node.as_str());
            }
            pending.insert(node.as_str(), count);
        }

        let mut ready: BTreeSet<&str> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(node, _)| *node)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(node) = ready.pop_first() {
            order.push(node.to_string());
            for dependent in dependents.get(node).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if order.len() == self.nodes.len() {
            return Ok(order);
        }

        let remaining: BTreeSet<&str> = self
            .nodes
            .iter()
            .map(String::as_str)
            .filter(|node| !order.iter().any(|done| done == node))
            .collect();
        Err(GraphError::CyclicDependency(self.find_cycle(&remaining)))
    }

    /// Walk hard edges inside the unsorted remainder until a node repeats.
    ///
    /// Every remaining node still has at least one remaining dependency, so
    /// the walk always closes a cycle.
    fn find_cycle(&self, remaining: &BTreeSet<&str>) -> Vec<String> {
        let mut path: Vec<&str> = Vec::new();
        let mut position: BTreeMap<&str, usize> = BTreeMap::new();
        let Some(mut current) = remaining.first().copied() else {
            return Vec::new();
        };

        loop {
            if let Some(&start) = position.get(current) {
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(current.to_string());
                return cycle;
            }
            position.insert(current, path.len());
            path.push(current);

            match self
                .present_dependencies(current)
                .find(|dep| remaining.contains(dep))
            {
                Some(next) => current = next,
                None => return path.iter().map(|n| n.to_string()).collect(),
            }
        }
    }

    /// Transitive closure of hard dependencies starting at `roots` (roots included)
    pub fn closure<S: AsRef<str>>(&self, roots: &[S]) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&str> = roots.iter().map(AsRef::as_ref).collect();

        while let Some(node) = stack.pop() {
            if !self.nodes.contains(node) || !seen.insert(node.to_string()) {
                continue;
            }
            stack.extend(self.present_dependencies(node));
        }
        seen
    }
}

/// Compute the initialization order for a set of unit descriptors
pub fn compute_order<'a, I>(units: I) -> Result<Vec<String>, GraphError>
where
    I: IntoIterator<Item = (&'a str, &'a UnitDescriptor)>,
{
    let graph = DependencyGraph::from_units(units);
    let order = graph.topological_order()?;
    log::debug!("Computed initialization order: {:?}", order);
    Ok(order)
}
