//! Typed AWS resource descriptors
//!
//! Each args struct converts into the camelCase input map the AWS provider
//! expects and names the output fields the engine will populate.

pub mod acm;
pub mod cloudfront;
pub mod provider;
pub mod route53;
pub mod s3;

use sitestack_kernel::construction::{ResourceOptions, ResourceSpec};
use sitestack_kernel::property::PropertyMap;

pub use acm::{CertificateArgs, CertificateValidationArgs, ValidationMethod};
pub use cloudfront::{
    CacheBehavior, CookieForwarding, CustomErrorResponse, DistributionArgs, ForwardedValues,
    GeoRestriction, HttpMethod, Origin, PriceClass, ViewerCertificate, ViewerProtocolPolicy,
};
pub use provider::ProviderArgs;
pub use route53::RecordArgs;
pub use s3::{BucketArgs, WebsiteArgs};

/// A declarable resource type
pub trait Resource {
    /// Provider type token, e.g. `aws:s3/bucket:Bucket`
    const TYPE: &'static str;

    /// Output fields populated by the engine
    const OUTPUTS: &'static [&'static str];

    /// Input map in the provider's wire naming
    fn into_inputs(self) -> PropertyMap;

    /// Full declaration for `name`
    fn into_spec(self, name: &str, options: ResourceOptions) -> ResourceSpec
    where
        Self: Sized,
    {
        ResourceSpec::new(Self::TYPE, name)
            .inputs(self.into_inputs())
            .outputs(Self::OUTPUTS.iter().copied())
            .options(options)
    }
}
