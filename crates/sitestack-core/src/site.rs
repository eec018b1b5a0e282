//! Static-site program
//!
//! Declares the whole deployment:
//!
//! ```text
//! east (provider) ──► domain-cert ──► cert-validation (record) ──► cert-validation
//!                                                                       ┆ ordering
//! web-bucket ───────────────────────────────────────────────────────► web-cdn
//! ```
//!
//! and exports the bucket id as `bucketName`.

use crate::config::SiteConfig;
use crate::error::SiteError;
use crate::resources::{
    CacheBehavior, CustomErrorResponse, DistributionArgs, GeoRestriction, Origin, PriceClass,
    ValidationMethod, ViewerCertificate,
};
use crate::stack::{BucketHandle, Stack};
use sitestack_kernel::engine::Engine;
use sitestack_kernel::output::Output;
use sitestack_kernel::submit::{DeploymentSummary, Submitter};
use sitestack_kernel::{GraphContext, NodeId, ValidatedGraph};
use std::sync::Arc;

pub const PROVIDER_NAME: &str = "east";
/// CloudFront only accepts ACM certificates from us-east-1
pub const CERTIFICATE_REGION: &str = "us-east-1";
pub const CERTIFICATE_NAME: &str = "domain-cert";
pub const VALIDATION_RECORD_NAME: &str = "cert-validation";
pub const VALIDATION_NAME: &str = "cert-validation";
pub const BUCKET_NAME: &str = "web-bucket";
pub const DISTRIBUTION_NAME: &str = "web-cdn";
pub const BUCKET_NAME_EXPORT: &str = "bucketName";

pub const INDEX_DOCUMENT: &str = "index.html";
pub const SPA_ENTRY_PATH: &str = "/index.html";
pub const VALIDATION_RECORD_TTL: u32 = 60;
pub const ERROR_CACHING_TTL_SECS: u64 = 86_400;
/// Origin statuses rewritten to the SPA entry document
pub const REWRITTEN_ERROR_CODES: [u16; 2] = [403, 404];

/// Node ids of the declared site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteNodes {
    pub provider: NodeId,
    pub certificate: NodeId,
    pub validation_record: NodeId,
    pub validation: NodeId,
    pub bucket: NodeId,
    pub distribution: NodeId,
}

/// A validated site graph
#[derive(Debug, Clone)]
pub struct SiteGraph {
    pub graph: ValidatedGraph,
    pub nodes: SiteNodes,
}

/// Distribution settings for a bucket-backed single-page site
#[must_use]
pub fn distribution_args(
    aliases: &[Output<String>],
    bucket: &BucketHandle,
    certificate_arn: Output<String>,
) -> DistributionArgs {
    DistributionArgs {
        enabled: true,
        aliases: aliases.to_vec(),
        origins: vec![Origin {
            origin_id: bucket.arn.clone(),
            domain_name: bucket.bucket_domain_name.clone(),
        }],
        default_root_object: Some(INDEX_DOCUMENT.to_string()),
        price_class: PriceClass::NorthAmericaEurope,
        default_cache_behavior: CacheBehavior::static_content(bucket.arn.clone()),
        restrictions: GeoRestriction::unrestricted(),
        viewer_certificate: ViewerCertificate::sni(certificate_arn),
        custom_error_responses: REWRITTEN_ERROR_CODES
            .iter()
            .map(|code| CustomErrorResponse::fallback_to(*code, SPA_ENTRY_PATH, ERROR_CACHING_TTL_SECS))
            .collect(),
    }
}

/// Declare and validate the site graph
///
/// # Errors
/// [`SiteError::Stack`] if a declaration or validation is rejected.
pub fn build_site(config: &SiteConfig, context: &GraphContext) -> Result<SiteGraph, SiteError> {
    let mut stack = Stack::new(context.clone());

    let east = stack.declare_provider(PROVIDER_NAME, CERTIFICATE_REGION, config.profile.as_deref())?;

    let certificate = stack.declare_certificate(
        CERTIFICATE_NAME,
        config.domain.as_str(),
        vec![config.wildcard_domain().into()],
        ValidationMethod::Dns,
        &east,
    )?;

    // The wildcard shares the apex's DNS challenge; only the first is answered.
    let record = stack.declare_validation_record(
        VALIDATION_RECORD_NAME,
        &certificate.first_challenge(),
        config.hosted_zone_id.clone(),
        VALIDATION_RECORD_TTL,
    )?;

    let validation = stack.declare_validation_completion(
        VALIDATION_NAME,
        &certificate,
        vec![record.fqdn.clone()],
        &east,
    )?;

    let bucket = stack.declare_bucket(BUCKET_NAME, config.bucket_name.as_str(), INDEX_DOCUMENT)?;

    let aliases: [Output<String>; 2] = [config.domain.as_str().into(), config.www_domain().into()];
    let distribution = stack.declare_distribution(
        DISTRIBUTION_NAME,
        distribution_args(&aliases, &bucket, certificate.arn.clone()),
        &[&validation],
    )?;

    stack.export_output(BUCKET_NAME_EXPORT, &bucket.id)?;

    let nodes = SiteNodes {
        provider: east.node,
        certificate: certificate.node,
        validation_record: record.node,
        validation: validation.node,
        bucket: bucket.node,
        distribution: distribution.node,
    };
    let graph = stack.finish()?;
    tracing::info!(
        project = %context.project,
        stack = %context.stack,
        resources = graph.node_count(),
        fingerprint = %graph.fingerprint().short(),
        "site graph built"
    );
    Ok(SiteGraph { graph, nodes })
}

/// Build the site graph and submit it to `engine`
///
/// Engine failures come back untouched inside [`SiteError::Submit`].
///
/// # Errors
/// Any declaration error, or the first engine failure.
pub async fn deploy_site(
    config: &SiteConfig,
    context: &GraphContext,
    engine: Arc<dyn Engine>,
) -> Result<DeploymentSummary, SiteError> {
    let site = build_site(config, context)?;
    let submitter = Submitter::new(engine);
    tracing::info!(engine = submitter.engine_name(), "deploying site");
    let summary = submitter.submit(&site.graph).await?;
    Ok(summary)
}
