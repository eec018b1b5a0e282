//! Route 53 records

use super::Resource;
use sitestack_kernel::output::Output;
use sitestack_kernel::property::PropertyMap;

/// `aws:route53/record:Record`
///
/// `zone_id` is usually secret; it stays wrapped through resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordArgs {
    pub name: Output<String>,
    /// `CNAME` for ACM DNS validation
    pub record_type: Output<String>,
    pub records: Vec<Output<String>>,
    pub ttl: u32,
    pub zone_id: Output<String>,
}

impl Resource for RecordArgs {
    const TYPE: &'static str = "aws:route53/record:Record";
    const OUTPUTS: &'static [&'static str] = &["fqdn", "name"];

    fn into_inputs(self) -> PropertyMap {
        PropertyMap::new()
            .with("name", self.name)
            .with("type", self.record_type)
            .with("records", self.records)
            .with("ttl", self.ttl)
            .with("zoneId", self.zone_id)
    }
}
