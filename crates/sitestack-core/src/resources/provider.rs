//! Explicit AWS provider

use super::Resource;
use crate::error::StackError;
use once_cell::sync::Lazy;
use regex::Regex;
use sitestack_kernel::property::PropertyMap;

const REGION_PATTERN: &str = r"^[a-z]{2}(-gov|-iso[a-z]?)?-[a-z]+-[0-9]{1,2}$";

static REGION: Lazy<Regex> =
    Lazy::new(|| Regex::new(REGION_PATTERN).expect("region pattern is a valid regex"));

/// Whether `region` looks like an AWS region code (`us-east-1`, `us-gov-west-1`)
#[must_use]
pub fn is_valid_region(region: &str) -> bool {
    REGION.is_match(region)
}

/// `pulumi:providers:aws`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderArgs {
    pub region: String,
    pub profile: Option<String>,
}

impl ProviderArgs {
    /// # Errors
    /// [`StackError::InvalidRegion`] unless `region` is an AWS region code.
    pub fn new(region: impl Into<String>, profile: Option<String>) -> Result<Self, StackError> {
        let region = region.into();
        if !is_valid_region(&region) {
            return Err(StackError::InvalidRegion(region));
        }
        Ok(Self { region, profile })
    }
}

impl Resource for ProviderArgs {
    const TYPE: &'static str = "pulumi:providers:aws";
    const OUTPUTS: &'static [&'static str] = &[];

    fn into_inputs(self) -> PropertyMap {
        PropertyMap::new()
            .with("region", self.region)
            .with_opt("profile", self.profile)
    }
}
