//! Sitestack Kernel (sitestack-kernel)
//!
//! Declarative resource graphs with a two-phase design:
//! 1. **Construction Phase**: declare resources, wire dependencies, validate
//! 2. **Submission Phase**: hand a sealed graph to a reconciliation engine
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sitestack_kernel::prelude::*;
//!
//! // Construction phase
//! let mut builder = GraphBuilder::new(GraphContext::new("static-site", "dev"));
//! let bucket = builder.add_resource(
//!     ResourceSpec::new("aws:s3/bucket:Bucket", "web-bucket").outputs(["id", "arn"]),
//! )?;
//! builder.export("bucketName", &Output::<String>::computed(bucket, "id"))?;
//! let validated = builder.validate()?;
//!
//! // Submission phase
//! let summary = Submitter::new(engine).submit(&validated).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod construction;
pub mod dag;
pub mod engine;
pub mod error;
pub mod hash;
pub mod output;
pub mod property;
pub mod secret;
pub mod submit;
pub mod types;
pub mod validated_graph;

pub use error::*;
pub use types::*;
pub use validated_graph::ValidatedGraph;

/// Common imports for declaring and submitting graphs
pub mod prelude {
    pub use crate::construction::{
        ConstructionValidator, DeclaredResource, Export, GraphBuilder, ResourceOptions,
        ResourceSpec,
    };
    pub use crate::dag::{EdgeKind, EdgeKinds};
    pub use crate::engine::{Engine, RegisterRequest, RegisteredResource};
    pub use crate::error::{
        EngineError, GraphBuilderError, GraphError, SubmitError, ValidationError,
    };
    pub use crate::hash::ContentHash;
    pub use crate::output::Output;
    pub use crate::property::{IntoProperty, OutputRef, PathSegment, PropertyMap, PropertyValue};
    pub use crate::secret::Secret;
    pub use crate::submit::{DeploymentSummary, Submitter};
    pub use crate::types::{GraphContext, NodeId, ResourceType, Urn};
    pub use crate::validated_graph::{Plan, PlanDependency, PlanStep, ValidatedGraph};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
