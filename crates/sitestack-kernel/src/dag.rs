//! Dependency DAG over declared resources
//!
//! Edges point from a dependency to its dependent, so a topological order is
//! a valid submission order. Each edge records *why* it exists: a data
//! reference, a provider binding, an explicit ordering constraint, or any
//! combination of the three.

use crate::error::GraphError;
use crate::types::NodeId;
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Reason for a dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// An input references the dependency's output
    Data,
    /// The dependent is pinned to the dependency as its provider
    Provider,
    /// Explicit ordering with no data flowing across the edge
    Ordering,
}

impl Display for EdgeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EdgeKind::Data => "data",
            EdgeKind::Provider => "provider",
            EdgeKind::Ordering => "ordering",
        })
    }
}

/// Set of reasons carried by one edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EdgeKinds {
    data: bool,
    provider: bool,
    ordering: bool,
}

impl EdgeKinds {
    #[must_use]
    pub fn of(kind: EdgeKind) -> Self {
        Self::default().with(kind)
    }

    #[must_use]
    pub fn with(mut self, kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Data => self.data = true,
            EdgeKind::Provider => self.provider = true,
            EdgeKind::Ordering => self.ordering = true,
        }
        self
    }

    #[must_use]
    pub fn contains(self, kind: EdgeKind) -> bool {
        match kind {
            EdgeKind::Data => self.data,
            EdgeKind::Provider => self.provider,
            EdgeKind::Ordering => self.ordering,
        }
    }

    /// True when the edge carries no data and no provider binding
    #[must_use]
    pub fn is_ordering_only(self) -> bool {
        self.ordering && !self.data && !self.provider
    }

    pub fn iter(self) -> impl Iterator<Item = EdgeKind> {
        [EdgeKind::Data, EdgeKind::Provider, EdgeKind::Ordering]
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl Display for EdgeKinds {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let kinds: Vec<String> = self.iter().map(|kind| kind.to_string()).collect();
        f.write_str(&kinds.join("+"))
    }
}

impl Serialize for EdgeKinds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

/// Acyclic dependency graph
#[derive(Debug, Clone, Default)]
pub struct Dag {
    inner: DiGraphMap<NodeId, EdgeKinds>,
}

impl Dag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node_id: NodeId) {
        self.inner.add_node(node_id);
    }

    #[must_use]
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.inner.contains_node(node_id)
    }

    /// Add `kind` to the edge `from -> to`, creating it if needed
    ///
    /// # Errors
    /// Rejects self-loops, unknown nodes, and edges that would close a cycle.
    /// A rejected edge leaves the graph unchanged.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) -> Result<(), GraphError> {
        if from == to {
            return Err(GraphError::SelfLoop(from));
        }
        for node in [from, to] {
            if !self.inner.contains_node(node) {
                return Err(GraphError::NodeNotFound(node));
            }
        }

        if let Some(existing) = self.inner.edge_weight_mut(from, to) {
            *existing = existing.with(kind);
            return Ok(());
        }

        self.inner.add_edge(from, to, EdgeKinds::of(kind));
        if is_cyclic_directed(&self.inner) {
            self.inner.remove_edge(from, to);
            return Err(GraphError::CycleDetected { from, to });
        }
        Ok(())
    }

    /// Preview whether `from -> to` would close a cycle
    #[must_use]
    pub fn would_create_cycle(&self, from: NodeId, to: NodeId) -> bool {
        from == to || self.can_reach(to, from)
    }

    fn can_reach(&self, source: NodeId, target: NodeId) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = vec![source];
        while let Some(node) = stack.pop() {
            if node == target {
                return true;
            }
            if visited.insert(node) {
                stack.extend(self.inner.neighbors_directed(node, Direction::Outgoing));
            }
        }
        false
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    #[must_use]
    pub fn edge(&self, from: NodeId, to: NodeId) -> Option<EdgeKinds> {
        self.inner.edge_weight(from, to).copied()
    }

    /// All edges as `(dependency, dependent, kinds)`, sorted
    #[must_use]
    pub fn edges(&self) -> Vec<(NodeId, NodeId, EdgeKinds)> {
        let mut edges: Vec<_> = self
            .inner
            .all_edges()
            .map(|(from, to, kinds)| (from, to, *kinds))
            .collect();
        edges.sort_by_key(|(from, to, _)| (*from, *to));
        edges
    }

    /// Direct dependencies of `node_id`, sorted by id
    #[must_use]
    pub fn dependencies(&self, node_id: NodeId) -> Vec<(NodeId, EdgeKinds)> {
        self.neighbors(node_id, Direction::Incoming)
    }

    /// Direct dependents of `node_id`, sorted by id
    #[must_use]
    pub fn dependents(&self, node_id: NodeId) -> Vec<(NodeId, EdgeKinds)> {
        self.neighbors(node_id, Direction::Outgoing)
    }

    fn neighbors(&self, node_id: NodeId, direction: Direction) -> Vec<(NodeId, EdgeKinds)> {
        if !self.inner.contains_node(node_id) {
            return Vec::new();
        }
        let mut neighbors: Vec<_> = self
            .inner
            .neighbors_directed(node_id, direction)
            .filter_map(|other| {
                let kinds = match direction {
                    Direction::Incoming => self.edge(other, node_id),
                    Direction::Outgoing => self.edge(node_id, other),
                };
                kinds.map(|kinds| (other, kinds))
            })
            .collect();
        neighbors.sort_by_key(|(other, _)| *other);
        neighbors
    }

    /// Validate the entire graph structure
    ///
    /// # Errors
    /// Returns [`GraphError::CycleDetected`] if any cycle exists.
    pub fn validate(&self) -> Result<(), GraphError> {
        if is_cyclic_directed(&self.inner) {
            let (from, to, _) = self
                .edges()
                .into_iter()
                .find(|(from, to, _)| self.can_reach(*to, *from))
                .ok_or(GraphError::Internal("cycle without a closing edge"))?;
            return Err(GraphError::CycleDetected { from, to });
        }
        Ok(())
    }

    /// Dependency layers: every node's dependencies sit in earlier waves
    ///
    /// Nodes inside a wave are sorted by id, so the result is deterministic.
    ///
    /// # Errors
    /// Returns [`GraphError::CycleDetected`] if the graph is cyclic.
    pub fn waves(&self) -> Result<Vec<Vec<NodeId>>, GraphError> {
        self.validate()?;

        let mut remaining: std::collections::BTreeMap<NodeId, usize> = self
            .inner
            .nodes()
            .map(|node| (node, self.inner.neighbors_directed(node, Direction::Incoming).count()))
            .collect();
        let mut waves = Vec::new();

        while !remaining.is_empty() {
            let wave: Vec<NodeId> = remaining
                .iter()
                .filter(|(_, pending)| **pending == 0)
                .map(|(node, _)| *node)
                .collect();
            if wave.is_empty() {
                return Err(GraphError::Internal("acyclic graph without a ready node"));
            }
            for node in &wave {
                remaining.remove(node);
                for dependent in self.inner.neighbors_directed(*node, Direction::Outgoing) {
                    if let Some(pending) = remaining.get_mut(&dependent) {
                        *pending -= 1;
                    }
                }
            }
            waves.push(wave);
        }
        Ok(waves)
    }

    /// Deterministic topological order (waves flattened)
    ///
    /// # Errors
    /// Returns [`GraphError::CycleDetected`] if the graph is cyclic.
    pub fn topological_sort(&self) -> Result<Vec<NodeId>, GraphError> {
        Ok(self.waves()?.into_iter().flatten().collect())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn dag_with(count: u32) -> Dag {
        let mut dag = Dag::new();
        for i in 0..count {
            dag.add_node(NodeId(i));
        }
        dag
    }

    #[test]
    fn edge_kinds_accumulate() {
        let mut dag = dag_with(2);
        dag.add_edge(NodeId(0), NodeId(1), EdgeKind::Data).unwrap();
        dag.add_edge(NodeId(0), NodeId(1), EdgeKind::Ordering).unwrap();

        let kinds = dag.edge(NodeId(0), NodeId(1)).unwrap();
        assert!(kinds.contains(EdgeKind::Data));
        assert!(kinds.contains(EdgeKind::Ordering));
        assert!(!kinds.is_ordering_only());
        assert_eq!(dag.edge_count(), 1);
        assert_eq!(kinds.to_string(), "data+ordering");
    }

    #[test]
    fn rejects_self_loop_and_unknown_nodes() {
        let mut dag = dag_with(1);
        assert_eq!(
            dag.add_edge(NodeId(0), NodeId(0), EdgeKind::Data),
            Err(GraphError::SelfLoop(NodeId(0)))
        );
        assert_eq!(
            dag.add_edge(NodeId(0), NodeId(9), EdgeKind::Data),
            Err(GraphError::NodeNotFound(NodeId(9)))
        );
    }

    #[test]
    fn rejected_cycle_leaves_graph_unchanged() {
        let mut dag = dag_with(3);
        dag.add_edge(NodeId(0), NodeId(1), EdgeKind::Data).unwrap();
        dag.add_edge(NodeId(1), NodeId(2), EdgeKind::Data).unwrap();

        assert!(dag.would_create_cycle(NodeId(2), NodeId(0)));
        assert!(matches!(
            dag.add_edge(NodeId(2), NodeId(0), EdgeKind::Ordering),
            Err(GraphError::CycleDetected { .. })
        ));
        assert_eq!(dag.edge_count(), 2);
        assert!(dag.validate().is_ok());
    }

    #[test]
    fn waves_group_independent_nodes() {
        // 0 -> 1 -> 3, 2 -> 3
        let mut dag = dag_with(4);
        dag.add_edge(NodeId(0), NodeId(1), EdgeKind::Provider).unwrap();
        dag.add_edge(NodeId(1), NodeId(3), EdgeKind::Ordering).unwrap();
        dag.add_edge(NodeId(2), NodeId(3), EdgeKind::Data).unwrap();

        let waves = dag.waves().unwrap();
        assert_eq!(
            waves,
            vec![vec![NodeId(0), NodeId(2)], vec![NodeId(1)], vec![NodeId(3)]]
        );
        assert_eq!(
            dag.dependencies(NodeId(3))
                .into_iter()
                .map(|(node, _)| node)
                .collect::<Vec<_>>(),
            vec![NodeId(1), NodeId(2)]
        );
    }
}
