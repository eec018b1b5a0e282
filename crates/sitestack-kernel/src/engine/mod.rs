//! Engine seam
//!
//! The reconciliation engine turns registrations into cloud resources. The
//! kernel only hands it fully resolved requests, one per node, in dependency
//! order; creating, updating, diffing and retrying are the engine's business.

use crate::error::EngineError;
use crate::property::{PropertyMap, PropertyValue};
use crate::types::{ResourceType, Urn};
use serde::Serialize;

/// A resource ready for registration: every input is resolved
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterRequest {
    pub urn: Urn,
    pub resource_type: ResourceType,
    pub name: String,
    pub inputs: PropertyMap,
    /// Provider the resource is pinned to, if any
    pub provider: Option<Urn>,
    /// Every direct dependency, whatever the edge kind
    pub dependencies: Vec<Urn>,
}

impl RegisterRequest {
    #[inline]
    #[must_use]
    pub fn input(&self, key: &str) -> Option<&PropertyValue> {
        self.inputs.get(key)
    }
}

/// Engine response for a registered resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisteredResource {
    /// Provider-assigned physical id
    pub id: String,
    pub outputs: PropertyMap,
}

impl RegisteredResource {
    pub fn new(id: impl Into<String>, outputs: PropertyMap) -> Self {
        Self {
            id: id.into(),
            outputs,
        }
    }
}

/// Reconciliation engine
///
/// Implement this trait to bind submission to a real or simulated cloud.
/// Calls for resources in the same wave may run concurrently.
#[async_trait::async_trait]
pub trait Engine: Send + Sync {
    /// Engine name for diagnostics
    fn name(&self) -> &str;

    /// Register one resource and return its outputs
    async fn register_resource(
        &self,
        request: RegisterRequest,
    ) -> Result<RegisteredResource, EngineError>;
}
