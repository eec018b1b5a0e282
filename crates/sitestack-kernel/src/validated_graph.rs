//! Validated Graph
//!
//! A `ValidatedGraph` can ONLY be produced by `GraphBuilder::validate()`.
//! It has no public constructor and no mutators, so:
//! 1. Every graph reaching an engine has passed validation
//! 2. Its waves and fingerprint are computed once, at sealing time
//! 3. Nothing can be added after the fact

use crate::construction::{DeclaredResource, Export};
use crate::dag::{Dag, EdgeKinds};
use crate::error::GraphError;
use crate::hash::{ContentHash, Fingerprinter};
use crate::types::{GraphContext, NodeId, Urn};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;

/// A sealed, acyclic resource graph
#[derive(Debug, Clone)]
pub struct ValidatedGraph {
    context: GraphContext,
    nodes: Vec<DeclaredResource>,
    by_urn: HashMap<Urn, NodeId>,
    dag: Dag,
    exports: IndexMap<String, Export>,
    waves: Vec<Vec<NodeId>>,
    fingerprint: ContentHash,
}

impl ValidatedGraph {
    /// Seal a validated declaration (crate-internal)
    pub(crate) fn seal(
        context: GraphContext,
        nodes: Vec<DeclaredResource>,
        by_urn: HashMap<Urn, NodeId>,
        dag: Dag,
        exports: IndexMap<String, Export>,
    ) -> Result<Self, GraphError> {
        let waves = dag.waves()?;
        let fingerprint = compute_fingerprint(&context, &nodes, &dag, &exports);
        Ok(Self {
            context,
            nodes,
            by_urn,
            dag,
            exports,
            waves,
            fingerprint,
        })
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &GraphContext {
        &self.context
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.dag.edge_count()
    }

    #[inline]
    #[must_use]
    pub fn node(&self, node_id: NodeId) -> Option<&DeclaredResource> {
        self.nodes.get(node_id.index())
    }

    #[must_use]
    pub fn node_by_urn(&self, urn: &Urn) -> Option<&DeclaredResource> {
        self.by_urn.get(urn).and_then(|id| self.node(*id))
    }

    /// Declared nodes in declaration order
    pub fn nodes(&self) -> impl Iterator<Item = &DeclaredResource> {
        self.nodes.iter()
    }

    /// Nodes whose type token equals `resource_type`
    pub fn nodes_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a DeclaredResource> + 'a {
        self.nodes
            .iter()
            .filter(move |node| node.resource_type.as_str() == resource_type)
    }

    /// Direct dependencies with the reasons for each edge
    #[must_use]
    pub fn dependencies(&self, node_id: NodeId) -> Vec<(NodeId, EdgeKinds)> {
        self.dag.dependencies(node_id)
    }

    #[must_use]
    pub fn dependents(&self, node_id: NodeId) -> Vec<(NodeId, EdgeKinds)> {
        self.dag.dependents(node_id)
    }

    #[must_use]
    pub fn edge(&self, dependency: NodeId, dependent: NodeId) -> Option<EdgeKinds> {
        self.dag.edge(dependency, dependent)
    }

    /// All edges as `(dependency, dependent, kinds)`, sorted
    #[must_use]
    pub fn edges(&self) -> Vec<(NodeId, NodeId, EdgeKinds)> {
        self.dag.edges()
    }

    /// Whether `ancestor` must resolve before `node`
    #[must_use]
    pub fn depends_transitively(&self, node: NodeId, ancestor: NodeId) -> bool {
        node != ancestor && self.dag.would_create_cycle(node, ancestor)
    }

    /// Submission waves; each node's dependencies sit in earlier waves
    #[inline]
    #[must_use]
    pub fn waves(&self) -> &[Vec<NodeId>] {
        &self.waves
    }

    /// Deterministic submission order
    #[must_use]
    pub fn topological_order(&self) -> Vec<NodeId> {
        self.waves.iter().flatten().copied().collect()
    }

    pub fn exports(&self) -> impl Iterator<Item = (&str, &Export)> {
        self.exports.iter().map(|(name, export)| (name.as_str(), export))
    }

    #[must_use]
    pub fn export(&self, name: &str) -> Option<&Export> {
        self.exports.get(name)
    }

    /// Content fingerprint; secret plaintext is excluded
    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> ContentHash {
        self.fingerprint
    }

    /// Serializable, secret-free view of the graph in submission order
    #[must_use]
    pub fn plan(&self) -> Plan {
        let steps = self
            .topological_order()
            .into_iter()
            .filter_map(|id| self.node(id))
            .map(|node| PlanStep {
                urn: node.urn.clone(),
                resource_type: node.resource_type.to_string(),
                inputs: node.inputs.to_redacted_json(),
                provider: node.provider.and_then(|p| self.node(p)).map(|p| p.urn.clone()),
                depends_on: self
                    .dependencies(node.id)
                    .into_iter()
                    .filter_map(|(dep, kinds)| {
                        self.node(dep).map(|dep| PlanDependency {
                            urn: dep.urn.clone(),
                            kinds,
                        })
                    })
                    .collect(),
            })
            .collect();

        Plan {
            project: self.context.project.clone(),
            stack: self.context.stack.clone(),
            fingerprint: self.fingerprint,
            steps,
            exports: self
                .exports
                .iter()
                .map(|(name, export)| (name.clone(), export.value.to_redacted_json()))
                .collect(),
        }
    }

    /// Graphviz rendering; edges are labelled with their kinds
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph stack {\n    rankdir=LR;\n");
        for node in &self.nodes {
            let _ = writeln!(
                dot,
                "    n{} [label=\"{}\\n{}\"];",
                node.id.0,
                escape(&node.name),
                escape(node.resource_type.as_str())
            );
        }
        for (from, to, kinds) in self.dag.edges() {
            let style = if kinds.is_ordering_only() { ", style=dashed" } else { "" };
            let _ = writeln!(dot, "    n{} -> n{} [label=\"{kinds}\"{style}];", from.0, to.0);
        }
        dot.push_str("}\n");
        dot
    }
}

/// One step of a [`Plan`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanStep {
    pub urn: Urn,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub inputs: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Urn>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<PlanDependency>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanDependency {
    pub urn: Urn,
    pub kinds: EdgeKinds,
}

/// Preview of what a submission would register
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub project: String,
    pub stack: String,
    pub fingerprint: ContentHash,
    pub steps: Vec<PlanStep>,
    pub exports: IndexMap<String, serde_json::Value>,
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Hash the canonical form of a declaration
///
/// Binds nodes (urn, type, inputs, declared outputs, provider, ordering),
/// edges with their kinds, and exports. Secrets contribute only a marker.
fn compute_fingerprint(
    context: &GraphContext,
    nodes: &[DeclaredResource],
    dag: &Dag,
    exports: &IndexMap<String, Export>,
) -> ContentHash {
    let mut hasher = Fingerprinter::new();
    hasher.str(&context.project).str(&context.stack);

    hasher.u64(nodes.len() as u64);
    for node in nodes {
        hasher
            .str(node.urn.as_str())
            .str(node.resource_type.as_str())
            .u64(node.inputs.len() as u64);
        for (key, value) in node.inputs.iter() {
            hasher.str(key).property(value);
        }
        hasher.u64(node.outputs.len() as u64);
        for output in &node.outputs {
            hasher.str(output);
        }
        hasher.u64(node.provider.map_or(u64::MAX, |p| u64::from(p.0)));
        hasher.u64(node.depends_on.len() as u64);
        for dependency in &node.depends_on {
            hasher.u64(u64::from(dependency.0));
        }
    }

    let edges = dag.edges();
    hasher.u64(edges.len() as u64);
    for (from, to, kinds) in edges {
        hasher
            .u64(u64::from(from.0))
            .u64(u64::from(to.0))
            .str(&kinds.to_string());
    }

    hasher.u64(exports.len() as u64);
    for (name, export) in exports {
        hasher.str(name).u64(u64::from(export.secret)).property(&export.value);
    }

    hasher.finish()
}
