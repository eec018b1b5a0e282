//! Sitestack Core (sitestack-core)
//!
//! The static-site deployment: a regional provider, an ACM certificate with
//! its DNS validation, an S3 website bucket and a CloudFront distribution
//! gated on the certificate being issued.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sitestack_core::prelude::*;
//!
//! let stack = StackConfig::from_file("stack.toml")?;
//! let site = SiteConfig::from_stack_config(&stack)?;
//!
//! // Preview
//! let graph = build_site(&site, &stack.context())?;
//! println!("{}", graph.graph.to_dot());
//!
//! // Deploy through an engine binding
//! let summary = deploy_site(&site, &stack.context(), engine).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod resources;
pub mod site;
pub mod stack;

pub use config::{SiteConfig, StackConfig};
pub use error::{ConfigError, SiteError, StackError};
pub use site::{build_site, deploy_site, SiteGraph, SiteNodes};
pub use stack::Stack;

/// Common imports for site programs
pub mod prelude {
    pub use crate::config::{ConfigValue, SiteConfig, StackConfig};
    pub use crate::error::{ConfigError, SiteError, StackError};
    pub use crate::resources::{Resource, ValidationMethod};
    pub use crate::site::{build_site, deploy_site, SiteGraph, SiteNodes};
    pub use crate::stack::{
        BucketHandle, CertificateHandle, Dependency, DistributionHandle, ProviderHandle, Stack,
        ValidationChallenge, ValidationCompletionHandle, ValidationRecordHandle,
    };
    pub use sitestack_kernel::prelude::*;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
