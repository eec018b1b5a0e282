//! Test utilities for sitestack
//!
//! Fixtures for the canonical `example.com` site and [`SimulatedCloud`], an
//! in-memory engine that behaves like AWS closely enough to exercise
//! submission end to end.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

pub mod cloud;

pub use cloud::{Operation, SimulatedCloud};

use sitestack_core::{SiteConfig, StackConfig};
use sitestack_kernel::secret::REDACTED;
use sitestack_kernel::GraphContext;

pub const DOMAIN: &str = "example.com";
pub const BUCKET: &str = "my-static-site";
/// Hosted zone id used as the secret in every fixture
pub const ZONE_ID: &str = "Z0SECRETZONE42";
pub const PROJECT: &str = "static-site";
pub const STACK: &str = "dev";

/// Stack file for the canonical site
pub const STACK_TOML: &str = r#"
project = "static-site"
stack = "dev"

[config]
"static-site:domain" = "example.com"
"static-site:bucketName" = "my-static-site"
"static-site:hostedZoneId" = { secure = "Z0SECRETZONE42" }
"#;

/// Canonical site configuration
pub fn site_config() -> SiteConfig {
    SiteConfig::new(DOMAIN, BUCKET, ZONE_ID).unwrap()
}

pub fn stack_config() -> StackConfig {
    StackConfig::from_toml(STACK_TOML).unwrap()
}

pub fn context() -> GraphContext {
    GraphContext::new(PROJECT, STACK)
}

/// Simulated cloud that only knows the fixture's hosted zone
pub fn cloud() -> SimulatedCloud {
    SimulatedCloud::new().with_hosted_zone(ZONE_ID)
}

/// Assert the hosted zone id never appears in `rendered`
pub fn assert_no_zone_id(rendered: &str) {
    assert!(
        !rendered.contains(ZONE_ID),
        "hosted zone id leaked into output:\n{rendered}"
    );
}

/// Assert `rendered` carries at least one redaction marker
pub fn assert_redacted(rendered: &str) {
    assert!(
        rendered.contains(REDACTED),
        "expected a redacted value in:\n{rendered}"
    );
}
