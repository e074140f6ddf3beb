//! System dependency graph.
//!
//! Systems declare ordering in two directions: `after: [X]` on `A` means `X`
//! must run before `A`, and `before: [Y]` on `A` means `A` must run before
//! `Y`. Both are normalized into a predecessor set per system, then checked
//! for cycles with Kahn's algorithm. A cycle rejects the whole schedule.

use std::collections::{BTreeSet, HashMap, VecDeque};

use ecsgen_decl::{Diagnostic, DiagnosticCode, Outcome};
use serde::Serialize;
use tracing::{debug, warn};

use crate::allocator::AllocatedId;

/// A system and the IDs of the systems that must run before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemNode<'a> {
    pub id: u32,
    pub name: &'a str,
    pub predecessors: BTreeSet<u32>,
}

/// A validated, acyclic system graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule<'a> {
    /// Nodes in ascending ID order.
    pub nodes: Vec<SystemNode<'a>>,
    /// One valid execution order, as visited by the cycle check.
    pub order: Vec<u32>,
}

impl<'a> Schedule<'a> {
    /// The node with the given system ID.
    #[must_use]
    pub fn node(&self, id: u32) -> Option<&SystemNode<'a>> {
        self.nodes
            .binary_search_by_key(&id, |n| n.id)
            .ok()
            .map(|index| &self.nodes[index])
    }

    /// Predecessors of the named system.
    #[must_use]
    pub fn predecessors_of(&self, name: &str) -> Option<&BTreeSet<u32>> {
        self.nodes
            .iter()
            .find(|n| n.name == name)
            .map(|n| &n.predecessors)
    }
}

/// Normalize every system's `after`/`before` relations into predecessor sets.
///
/// Relations naming an unknown system are ignored with a warning. Duplicate
/// relations collapse.
#[must_use]
pub fn build_graph<'a>(systems: &[AllocatedId<'a>]) -> (Vec<SystemNode<'a>>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let ids: HashMap<&str, u32> = systems.iter().map(|s| (s.name(), s.value)).collect();

    let mut nodes: Vec<SystemNode<'a>> = systems
        .iter()
        .map(|s| SystemNode {
            id: s.value,
            name: &s.owner.name,
            predecessors: BTreeSet::new(),
        })
        .collect();
    nodes.sort_by_key(|n| n.id);
    let position: HashMap<u32, usize> = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();

    let mut unknown = |system: &AllocatedId<'_>, relation: &str, target: &str| {
        warn!(system = system.name(), target, "ordering relation names an unknown system");
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::UnknownSystem,
                format!(
                    "system '{}' declares {relation} '{target}', which is not a known system; the relation is ignored",
                    system.name()
                ),
            )
            .at(system.owner.location.as_ref()),
        );
    };

    for system in systems {
        let this = position[&system.value];
        for target in &system.owner.after {
            match ids.get(target.as_str()) {
                Some(&predecessor) => {
                    nodes[this].predecessors.insert(predecessor);
                }
                None => unknown(system, "after", target),
            }
        }
        for target in &system.owner.before {
            match ids.get(target.as_str()) {
                Some(successor) => {
                    nodes[position[successor]].predecessors.insert(system.value);
                }
                None => unknown(system, "before", target),
            }
        }
    }

    (nodes, diagnostics)
}

/// Kahn's algorithm over predecessor sets.
///
/// Returns a topological order, or the IDs of every node that could not be
/// ordered (the nodes on a cycle and those downstream of one), ascending.
pub fn detect_cycles(nodes: &[SystemNode<'_>]) -> Result<Vec<u32>, Vec<u32>> {
    let position: HashMap<u32, usize> = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
    let mut in_degree: Vec<usize> = vec![0; nodes.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (index, node) in nodes.iter().enumerate() {
        // Predecessors outside the node set impose no ordering.
        for &predecessor in node.predecessors.iter().filter_map(|id| position.get(id)) {
            dependents[predecessor].push(index);
            in_degree[index] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut visited = vec![false; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(index) = queue.pop_front() {
        visited[index] = true;
        order.push(nodes[index].id);
        for &dependent in &dependents[index] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if order.len() == nodes.len() {
        Ok(order)
    } else {
        let mut unvisited: Vec<u32> = nodes
            .iter()
            .zip(&visited)
            .filter(|&(_, &seen)| !seen)
            .map(|(n, _)| n.id)
            .collect();
        unvisited.sort_unstable();
        Err(unvisited)
    }
}

/// Build and validate the schedule for the allocated systems.
#[must_use]
pub fn build_schedule<'a>(systems: &[AllocatedId<'a>]) -> Outcome<Schedule<'a>> {
    let (nodes, mut diagnostics) = build_graph(systems);

    match detect_cycles(&nodes) {
        Ok(order) => {
            let edges: usize = nodes.iter().map(|n| n.predecessors.len()).sum();
            debug!(systems = nodes.len(), edges, "system graph is acyclic");
            Outcome::from_parts(Schedule { nodes, order }, diagnostics)
        }
        Err(unvisited) => {
            let names: Vec<&str> = unvisited
                .iter()
                .filter_map(|id| nodes.iter().find(|n| n.id == *id))
                .map(|n| n.name)
                .collect();
            warn!(systems = names.len(), "dependency cycle; rejecting schedule");
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::DependencyCycle,
                format!(
                    "system ordering contains a cycle involving {}; no schedule is generated",
                    names.join(", ")
                ),
            ));
            Outcome::Rejected(diagnostics)
        }
    }
}
