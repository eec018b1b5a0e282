//! Submission Phase
//!
//! The submitter only accepts a `ValidatedGraph`. It performs no policy
//! validation; it resolves inputs against upstream outputs and hands each
//! node to the [`Engine`], wave by wave.
//!
//! # Ordering
//!
//! A wave is submitted only after every node of the previous wave has been
//! registered. Nodes inside a wave are independent and are registered
//! concurrently. A failure aborts the run once every in-flight registration
//! of its wave has returned; nothing is retried, cancelled or rolled back
//! here.

use crate::construction::DeclaredResource;
use crate::engine::{Engine, RegisterRequest, RegisteredResource};
use crate::error::{GraphError, SubmitError};
use crate::property::{OutputRef, PropertyValue};
use crate::types::{NodeId, Urn};
use crate::validated_graph::ValidatedGraph;
use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use ulid::Ulid;

/// Result of a successful submission
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentSummary {
    pub run_id: Ulid,
    /// URNs in the order they were registered
    pub registered: Vec<Urn>,
    pub resources: IndexMap<Urn, RegisteredResource>,
    /// Resolved stack outputs; secrets stay wrapped
    pub exports: IndexMap<String, PropertyValue>,
    pub elapsed_ms: u64,
}

impl DeploymentSummary {
    #[must_use]
    pub fn resource(&self, urn: &Urn) -> Option<&RegisteredResource> {
        self.resources.get(urn)
    }

    #[must_use]
    pub fn export(&self, name: &str) -> Option<&PropertyValue> {
        self.exports.get(name)
    }
}

/// Graph submitter
pub struct Submitter {
    engine: Arc<dyn Engine>,
}

impl Submitter {
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self { engine }
    }

    #[must_use]
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Submit a validated graph
    ///
    /// # Errors
    /// - [`SubmitError::ResourceFailed`] carrying the engine's diagnostic
    /// - [`SubmitError::UnresolvedOutput`] / [`SubmitError::UnresolvedExport`]
    ///   if an engine omitted a declared output
    pub async fn submit(&self, graph: &ValidatedGraph) -> Result<DeploymentSummary, SubmitError> {
        let run_id = Ulid::new();
        let started = Instant::now();
        let span = tracing::info_span!("submit", %run_id, engine = self.engine.name());

        async {
            let mut state = RunState::default();

            for (index, wave) in graph.waves().iter().enumerate() {
                tracing::info!(wave = index, size = wave.len(), "submitting wave");
                let requests = wave
                    .iter()
                    .map(|id| self.prepare(graph, *id, &state))
                    .collect::<Result<Vec<_>, _>>()?;

                let registrations = requests.into_iter().map(|(id, request)| {
                    let urn = request.urn.clone();
                    let resource_type = request.resource_type.clone();
                    async move {
                        let registered = self
                            .engine
                            .register_resource(request)
                            .await
                            .map_err(|source| {
                                tracing::warn!(%urn, error = %source, "registration failed");
                                SubmitError::ResourceFailed {
                                    urn: urn.clone(),
                                    source,
                                }
                            })?;
                        tracing::info!(%urn, %resource_type, id = %registered.id, "registered");
                        Ok::<_, SubmitError>((id, urn, registered))
                    }
                });

                // Siblings of a failed registration still run to completion.
                let mut failure = None;
                for outcome in join_all(registrations).await {
                    match outcome {
                        Ok((id, urn, registered)) => state.record(id, urn, registered),
                        Err(err) => {
                            failure.get_or_insert(err);
                        }
                    }
                }
                if let Some(err) = failure {
                    tracing::warn!(
                        wave = index,
                        registered = state.registered.len(),
                        "aborting after failed wave"
                    );
                    return Err(err);
                }
            }

            let exports = graph
                .exports()
                .map(|(name, export)| {
                    export
                        .value
                        .resolve(&|reference| state.lookup(reference))
                        .map(|value| (name.to_string(), value))
                        .map_err(|reference| SubmitError::UnresolvedExport {
                            export: name.to_string(),
                            reference: reference.to_string(),
                        })
                })
                .collect::<Result<IndexMap<_, _>, _>>()?;

            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            tracing::info!(
                resources = state.registered.len(),
                exports = exports.len(),
                elapsed_ms,
                "submission complete"
            );

            Ok::<_, SubmitError>(DeploymentSummary {
                run_id,
                registered: state.registered,
                resources: state.resources,
                exports,
                elapsed_ms,
            })
        }
        .instrument(span)
        .await
    }

    /// Resolve a node's inputs into a registration request
    fn prepare(
        &self,
        graph: &ValidatedGraph,
        id: NodeId,
        state: &RunState,
    ) -> Result<(NodeId, RegisterRequest), SubmitError> {
        let node: &DeclaredResource = graph.node(id).ok_or(GraphError::NodeNotFound(id))?;
        let inputs = node
            .inputs
            .resolve(&|reference| state.lookup(reference))
            .map_err(|reference| SubmitError::UnresolvedOutput {
                urn: node.urn.clone(),
                reference: reference.to_string(),
            })?;

        let urn_of = |dependency: NodeId| {
            graph
                .node(dependency)
                .map(|dep| dep.urn.clone())
                .ok_or(GraphError::NodeNotFound(dependency))
        };
        let provider = node.provider.map(&urn_of).transpose()?;
        let dependencies = graph
            .dependencies(id)
            .into_iter()
            .map(|(dependency, _)| urn_of(dependency))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((
            id,
            RegisterRequest {
                urn: node.urn.clone(),
                resource_type: node.resource_type.clone(),
                name: node.name.clone(),
                inputs,
                provider,
                dependencies,
            },
        ))
    }
}

/// Outputs recorded so far in one run
#[derive(Default)]
struct RunState {
    outputs: HashMap<NodeId, RegisteredResource>,
    registered: Vec<Urn>,
    resources: IndexMap<Urn, RegisteredResource>,
}

impl RunState {
    fn record(&mut self, id: NodeId, urn: Urn, mut registered: RegisteredResource) {
        // The physical id is always readable as the `id` output.
        if !registered.outputs.contains_key("id") {
            registered
                .outputs
                .insert("id", PropertyValue::String(registered.id.clone()));
        }
        self.registered.push(urn.clone());
        self.resources.insert(urn, registered.clone());
        self.outputs.insert(id, registered);
    }

    fn lookup(&self, reference: &OutputRef) -> Option<PropertyValue> {
        self.outputs
            .get(&reference.node)?
            .outputs
            .get(&reference.field)?
            .at_path(&reference.path)
    }
}
