//! Identity types for declared resources
//!
//! Node ids are arena indices handed out in declaration order, so rebuilding
//! the same program yields the same ids. URNs are the stable, engine-facing
//! identity of a resource.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Prefix shared by every provider type token
pub const PROVIDER_TYPE_PREFIX: &str = "pulumi:providers:";

/// Arena index of a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Position of the node in the declaration arena
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resource type token, e.g. `aws:s3/bucket:Bucket`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceType(String);

impl ResourceType {
    #[inline]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this token names a provider (`pulumi:providers:<pkg>`)
    #[inline]
    #[must_use]
    pub fn is_provider(&self) -> bool {
        self.0.starts_with(PROVIDER_TYPE_PREFIX)
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Project and stack a graph is declared for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphContext {
    pub project: String,
    pub stack: String,
}

impl GraphContext {
    #[inline]
    pub fn new(project: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            stack: stack.into(),
        }
    }

    /// URN for a resource of `resource_type` named `name` in this context
    #[must_use]
    pub fn urn(&self, resource_type: &ResourceType, name: &str) -> Urn {
        Urn(format!(
            "urn:pulumi:{}::{}::{}::{}",
            self.stack, self.project, resource_type, name
        ))
    }
}

impl Default for GraphContext {
    fn default() -> Self {
        Self::new("static-site", "dev")
    }
}

/// Stable resource identity: `urn:pulumi:<stack>::<project>::<type>::<name>`
///
/// Two resources may share a logical name as long as their types differ.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Urn(String);

impl Urn {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Logical name (last `::` segment)
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }
}

impl Display for Urn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urn_layout() {
        let ctx = GraphContext::new("static-site", "prod");
        let urn = ctx.urn(&ResourceType::new("aws:s3/bucket:Bucket"), "web-bucket");
        assert_eq!(
            urn.as_str(),
            "urn:pulumi:prod::static-site::aws:s3/bucket:Bucket::web-bucket"
        );
        assert_eq!(urn.name(), "web-bucket");
    }

    #[test]
    fn same_name_different_type_gives_distinct_urns() {
        let ctx = GraphContext::default();
        let record = ctx.urn(&"aws:route53/record:Record".into(), "cert-validation");
        let validation = ctx.urn(
            &"aws:acm/certificateValidation:CertificateValidation".into(),
            "cert-validation",
        );
        assert_ne!(record, validation);
    }

    #[test]
    fn provider_token_detection() {
        assert!(ResourceType::new("pulumi:providers:aws").is_provider());
        assert!(!ResourceType::new("aws:acm/certificate:Certificate").is_provider());
    }
}
