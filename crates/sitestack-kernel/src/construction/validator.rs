//! Construction Validator
//!
//! Performs every structural check before a graph is sealed. Nothing is
//! re-validated during submission.

use crate::construction::{DeclaredResource, Export};
use crate::dag::{Dag, EdgeKind};
use crate::error::{GraphError, ValidationError};
use crate::property::OutputRef;
use indexmap::IndexMap;

/// Construction-time validator
#[derive(Debug, Default)]
pub struct ConstructionValidator {
    _private: (),
}

impl ConstructionValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a complete declaration
    ///
    /// Checks, in order:
    /// 1. Graph structure (acyclic, every node present in the DAG)
    /// 2. Every input reference names a declared output and has a data edge
    /// 3. Every provider binding has a provider edge
    /// 4. Exports reference declared outputs and plain exports carry no secret
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn validate(
        &self,
        nodes: &[DeclaredResource],
        dag: &Dag,
        exports: &IndexMap<String, Export>,
    ) -> Result<(), ValidationError> {
        self.validate_structure(nodes, dag)?;
        for node in nodes {
            self.validate_references(node, nodes, dag)?;
        }
        self.validate_exports(nodes, exports)?;
        tracing::debug!(
            nodes = nodes.len(),
            edges = dag.edge_count(),
            exports = exports.len(),
            "graph validated"
        );
        Ok(())
    }

    fn validate_structure(&self, nodes: &[DeclaredResource], dag: &Dag) -> Result<(), ValidationError> {
        dag.validate()?;
        if dag.node_count() != nodes.len() {
            return Err(GraphError::Internal("arena and DAG disagree on node count").into());
        }
        for (index, node) in nodes.iter().enumerate() {
            if node.id.index() != index || !dag.contains_node(node.id) {
                return Err(GraphError::NodeNotFound(node.id).into());
            }
        }
        Ok(())
    }

    fn validate_references(
        &self,
        node: &DeclaredResource,
        nodes: &[DeclaredResource],
        dag: &Dag,
    ) -> Result<(), ValidationError> {
        for reference in node.inputs.output_refs() {
            let Some(target) = nodes.get(reference.node.index()) else {
                return Err(ValidationError::DanglingReference {
                    urn: node.urn.clone(),
                    node: reference.node,
                });
            };
            if !target.declares_output(&reference.field) {
                return Err(ValidationError::UnknownOutput {
                    urn: node.urn.clone(),
                    reference: describe(reference, target),
                });
            }
            let has_data_edge = dag
                .edge(target.id, node.id)
                .is_some_and(|kinds| kinds.contains(EdgeKind::Data));
            if !has_data_edge {
                return Err(ValidationError::MissingDataEdge {
                    urn: node.urn.clone(),
                    dependency: target.urn.clone(),
                });
            }
        }

        if let Some(provider) = node.provider {
            let bound = dag
                .edge(provider, node.id)
                .is_some_and(|kinds| kinds.contains(EdgeKind::Provider));
            if !bound {
                return Err(GraphError::Internal("provider binding without a provider edge").into());
            }
        }
        Ok(())
    }

    fn validate_exports(
        &self,
        nodes: &[DeclaredResource],
        exports: &IndexMap<String, Export>,
    ) -> Result<(), ValidationError> {
        for (name, export) in exports {
            if !export.secret && export.value.contains_secret() {
                return Err(ValidationError::SecretExported(name.clone()));
            }
            for reference in export.value.output_refs() {
                let declared = nodes
                    .get(reference.node.index())
                    .filter(|target| target.declares_output(&reference.field));
                if declared.is_none() {
                    return Err(ValidationError::UnknownExportOutput {
                        export: name.clone(),
                        reference: reference.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// `<urn>.<field>` form used in diagnostics
fn describe(reference: &OutputRef, target: &DeclaredResource) -> String {
    format!("{}.{}", target.urn, reference.field)
}
