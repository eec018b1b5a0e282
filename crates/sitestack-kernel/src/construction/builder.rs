//! Graph Builder
//!
//! The primary interface for the construction phase. Every declaration
//! returns the new node's id; handles built from that id are the only way to
//! reference the node's outputs, so references always point backwards.

use crate::construction::ConstructionValidator;
use crate::dag::{Dag, EdgeKind};
use crate::error::{GraphBuilderError, GraphError, ValidationError};
use crate::output::Output;
use crate::property::{PropertyMap, PropertyValue};
use crate::types::{GraphContext, NodeId, ResourceType, Urn};
use crate::validated_graph::ValidatedGraph;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Placement options for a declaration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceOptions {
    /// Provider node the resource is pinned to
    pub provider: Option<NodeId>,
    /// Nodes that must resolve first, with no data dependency implied
    pub depends_on: Vec<NodeId>,
}

impl ResourceOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn provider(mut self, provider: NodeId) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn depends_on(mut self, node: NodeId) -> Self {
        if !self.depends_on.contains(&node) {
            self.depends_on.push(node);
        }
        self
    }
}

/// A resource to declare
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    pub resource_type: ResourceType,
    pub name: String,
    pub inputs: PropertyMap,
    /// Output fields the engine will populate
    pub outputs: Vec<String>,
    pub options: ResourceOptions,
}

impl ResourceSpec {
    pub fn new(resource_type: impl Into<ResourceType>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            inputs: PropertyMap::new(),
            outputs: Vec::new(),
            options: ResourceOptions::default(),
        }
    }

    #[must_use]
    pub fn inputs(mut self, inputs: PropertyMap) -> Self {
        self.inputs = inputs;
        self
    }

    #[must_use]
    pub fn outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn options(mut self, options: ResourceOptions) -> Self {
        self.options = options;
        self
    }
}

/// A declared node, as recorded in the arena
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredResource {
    pub id: NodeId,
    pub urn: Urn,
    pub resource_type: ResourceType,
    pub name: String,
    pub inputs: PropertyMap,
    pub outputs: Vec<String>,
    pub provider: Option<NodeId>,
    pub depends_on: Vec<NodeId>,
}

impl DeclaredResource {
    #[must_use]
    pub fn declares_output(&self, field: &str) -> bool {
        self.outputs.iter().any(|output| output == field)
    }
}

/// A named stack output
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub value: PropertyValue,
    /// Registered through `export_secret`; allowed to carry secrets
    pub secret: bool,
}

/// Builder for resource graphs
///
/// Usage:
/// ```rust,ignore
/// let mut builder = GraphBuilder::new(GraphContext::default());
/// let bucket = builder.add_resource(
///     ResourceSpec::new("aws:s3/bucket:Bucket", "web-bucket").outputs(["id"]),
/// )?;
/// builder.export("bucketName", &Output::<String>::computed(bucket, "id"))?;
/// let validated = builder.validate()?;
/// ```
#[derive(Debug)]
pub struct GraphBuilder {
    context: GraphContext,
    nodes: Vec<DeclaredResource>,
    by_urn: HashMap<Urn, NodeId>,
    dag: Dag,
    exports: IndexMap<String, Export>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new(context: GraphContext) -> Self {
        Self {
            context,
            nodes: Vec::new(),
            by_urn: HashMap::new(),
            dag: Dag::new(),
            exports: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn context(&self) -> &GraphContext {
        &self.context
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.dag.edge_count()
    }

    #[must_use]
    pub fn get_node(&self, node_id: NodeId) -> Option<&DeclaredResource> {
        self.nodes.get(node_id.index())
    }

    /// Declare a resource and wire its dependency edges
    ///
    /// Edges added:
    /// - `Data` from every node referenced inside the inputs
    /// - `Provider` from the provider node
    /// - `Ordering` from each `depends_on` node
    ///
    /// # Errors
    /// Rejects empty names, duplicate URNs, unknown referenced nodes and
    /// non-provider nodes used as providers. A rejected declaration leaves
    /// the builder unchanged.
    pub fn add_resource(&mut self, spec: ResourceSpec) -> Result<NodeId, GraphBuilderError> {
        if spec.name.is_empty() {
            return Err(GraphBuilderError::EmptyName(spec.resource_type.to_string()));
        }

        let urn = self.context.urn(&spec.resource_type, &spec.name);
        if self.by_urn.contains_key(&urn) {
            return Err(GraphBuilderError::DuplicateResource(urn));
        }

        let id = NodeId(
            u32::try_from(self.nodes.len())
                .map_err(|_| GraphError::Internal("node arena exhausted"))?,
        );

        let mut edges: Vec<(NodeId, EdgeKind)> = spec
            .inputs
            .output_refs()
            .into_iter()
            .map(|output| (output.node, EdgeKind::Data))
            .collect();
        if let Some(provider) = spec.options.provider {
            let provider_node = self
                .get_node(provider)
                .ok_or(GraphError::NodeNotFound(provider))?;
            if !provider_node.resource_type.is_provider() {
                return Err(GraphBuilderError::NotAProvider {
                    urn,
                    provider: provider_node.urn.clone(),
                });
            }
            edges.push((provider, EdgeKind::Provider));
        }
        edges.extend(
            spec.options
                .depends_on
                .iter()
                .map(|node| (*node, EdgeKind::Ordering)),
        );

        if let Some((missing, _)) = edges.iter().find(|(node, _)| !self.dag.contains_node(*node)) {
            return Err(GraphError::NodeNotFound(*missing).into());
        }

        self.dag.add_node(id);
        for (dependency, kind) in edges {
            // The new node has no dependents yet, so these edges cannot close a cycle.
            self.dag.add_edge(dependency, id, kind)?;
            tracing::debug!(%urn, %dependency, %kind, "dependency edge");
        }

        tracing::debug!(%urn, node = %id, "declared resource");
        self.by_urn.insert(urn.clone(), id);
        self.nodes.push(DeclaredResource {
            id,
            urn,
            resource_type: spec.resource_type,
            name: spec.name,
            inputs: spec.inputs,
            outputs: spec.outputs,
            provider: spec.options.provider,
            depends_on: spec.options.depends_on,
        });
        Ok(id)
    }

    /// Add an ordering-only edge between two declared nodes
    ///
    /// # Errors
    /// Rejects unknown nodes, self-loops and edges that would close a cycle.
    pub fn add_ordering_edge(
        &mut self,
        dependency: NodeId,
        dependent: NodeId,
    ) -> Result<(), GraphBuilderError> {
        self.dag.add_edge(dependency, dependent, EdgeKind::Ordering)?;
        if let Some(node) = self.nodes.get_mut(dependent.index()) {
            if !node.depends_on.contains(&dependency) {
                node.depends_on.push(dependency);
            }
        }
        Ok(())
    }

    /// Preview whether an ordering edge would close a cycle
    #[must_use]
    pub fn would_create_cycle(&self, dependency: NodeId, dependent: NodeId) -> bool {
        self.dag.would_create_cycle(dependency, dependent)
    }

    /// Register a stack output
    ///
    /// # Errors
    /// Rejects duplicate export names.
    pub fn export<T>(&mut self, name: &str, value: &Output<T>) -> Result<(), GraphBuilderError> {
        self.insert_export(name, value.property().clone(), false)
    }

    /// Register a stack output that is allowed to carry secrets
    ///
    /// # Errors
    /// Rejects duplicate export names.
    pub fn export_secret<T>(
        &mut self,
        name: &str,
        value: &Output<T>,
    ) -> Result<(), GraphBuilderError> {
        self.insert_export(name, PropertyValue::secret(value.property().clone()), true)
    }

    fn insert_export(
        &mut self,
        name: &str,
        value: PropertyValue,
        secret: bool,
    ) -> Result<(), GraphBuilderError> {
        if self.exports.contains_key(name) {
            return Err(GraphBuilderError::DuplicateExport(name.to_string()));
        }
        self.exports.insert(name.to_string(), Export { value, secret });
        Ok(())
    }

    /// Validate the graph and seal it
    ///
    /// Once validated, the graph cannot be modified.
    ///
    /// # Errors
    /// See [`ConstructionValidator::validate`].
    pub fn validate(self) -> Result<ValidatedGraph, ValidationError> {
        let validator = ConstructionValidator::new();
        validator.validate(&self.nodes, &self.dag, &self.exports)?;
        Ok(ValidatedGraph::seal(
            self.context,
            self.nodes,
            self.by_urn,
            self.dag,
            self.exports,
        )?)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(GraphContext::default())
    }
}
