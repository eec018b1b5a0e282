//! S3 buckets

use super::Resource;
use sitestack_kernel::output::Output;
use sitestack_kernel::property::{IntoProperty, PropertyMap, PropertyValue};

/// Static website hosting settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebsiteArgs {
    pub index_document: String,
    pub error_document: Option<String>,
}

impl WebsiteArgs {
    pub fn index(document: impl Into<String>) -> Self {
        Self {
            index_document: document.into(),
            error_document: None,
        }
    }
}

impl IntoProperty for WebsiteArgs {
    fn into_property(self) -> PropertyValue {
        PropertyMap::new()
            .with("indexDocument", self.index_document)
            .with_opt("errorDocument", self.error_document)
            .into_property()
    }
}

/// `aws:s3/bucket:Bucket`
#[derive(Debug, Clone, PartialEq)]
pub struct BucketArgs {
    pub bucket: Output<String>,
    pub website: Option<WebsiteArgs>,
}

impl Resource for BucketArgs {
    const TYPE: &'static str = "aws:s3/bucket:Bucket";
    const OUTPUTS: &'static [&'static str] = &["id", "arn", "bucketDomainName", "websiteEndpoint"];

    fn into_inputs(self) -> PropertyMap {
        PropertyMap::new()
            .with("bucket", self.bucket)
            .with_opt("website", self.website)
    }
}
