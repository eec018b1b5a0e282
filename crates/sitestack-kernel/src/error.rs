//! Error types for the resource graph kernel
//!
//! Construction errors ([`GraphBuilderError`], [`ValidationError`]) are
//! raised before anything reaches an engine. [`EngineError`] is produced by
//! the engine and carried verbatim inside [`SubmitError`].

use crate::types::{NodeId, Urn};

/// Structural DAG errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("self-loop on node {0}")]
    SelfLoop(NodeId),

    #[error("edge {from} -> {to} closes a cycle")]
    CycleDetected { from: NodeId, to: NodeId },

    #[error("internal graph error: {0}")]
    Internal(&'static str),
}

/// Errors raised while declaring resources
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphBuilderError {
    /// A resource with the same type and name already exists
    #[error("duplicate resource: {0}")]
    DuplicateResource(Urn),

    /// A stack output with this name already exists
    #[error("duplicate export: {0}")]
    DuplicateExport(String),

    /// Resource names must be non-empty
    #[error("resource of type {0} has an empty name")]
    EmptyName(String),

    /// The referenced provider node is not a provider
    #[error("{urn} uses {provider} as provider, which is not a provider resource")]
    NotAProvider { urn: Urn, provider: Urn },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Errors found when validating a finished graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// An input references a field the target node does not declare
    #[error("{urn} references undeclared output {reference}")]
    UnknownOutput { urn: Urn, reference: String },

    /// An input references a node missing from the graph
    #[error("{urn} references missing node {node}")]
    DanglingReference { urn: Urn, node: NodeId },

    /// A data reference has no matching data edge
    #[error("{urn} reads from {dependency} without a data edge")]
    MissingDataEdge { urn: Urn, dependency: Urn },

    /// An export would publish a secret in plain form
    #[error("export '{0}' carries a secret value")]
    SecretExported(String),

    /// An export references a field no node declares
    #[error("export '{export}' references undeclared output {reference}")]
    UnknownExportOutput { export: String, reference: String },
}

/// Failure reported by the reconciliation engine
///
/// The kernel never interprets or rewrites these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Provider API error (rate limit, permission denial, invalid input)
    #[error("provider error [{code}]: {message}")]
    Provider { code: String, message: String },

    /// An operation did not complete within the engine's window
    #[error("timed out after {waited_secs}s waiting for {operation}")]
    Timeout { operation: String, waited_secs: u64 },

    /// The engine refused the request outright
    #[error("engine rejected request: {0}")]
    Rejected(String),
}

impl EngineError {
    /// Whether a later run might succeed without changing the graph
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Timeout { .. } => true,
            EngineError::Provider { code, .. } => {
                matches!(code.as_str(), "Throttling" | "TooManyRequests" | "ServiceUnavailable")
            }
            EngineError::Rejected(_) => false,
        }
    }
}

/// Errors raised while submitting a validated graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// The engine failed to register a resource
    #[error("{urn}: {source}")]
    ResourceFailed {
        urn: Urn,
        #[source]
        source: EngineError,
    },

    /// An input referenced an output that was never produced
    #[error("{urn}: unresolved output {reference}")]
    UnresolvedOutput { urn: Urn, reference: String },

    /// An export referenced an output that was never produced
    #[error("export '{export}': unresolved output {reference}")]
    UnresolvedExport { export: String, reference: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl SubmitError {
    /// URN of the resource that failed, if any
    #[must_use]
    pub fn failed_resource(&self) -> Option<&Urn> {
        match self {
            SubmitError::ResourceFailed { urn, .. } | SubmitError::UnresolvedOutput { urn, .. } => {
                Some(urn)
            }
            _ => None,
        }
    }

    /// Engine diagnostic, untouched
    #[must_use]
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            SubmitError::ResourceFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.engine_error().is_some_and(EngineError::is_retryable)
    }
}
