//! ACM certificates and certificate validation

use super::Resource;
use sitestack_kernel::output::Output;
use sitestack_kernel::property::{IntoProperty, PropertyMap, PropertyValue};
use std::fmt::{self, Display, Formatter};

/// How ACM verifies domain ownership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationMethod {
    Dns,
    Email,
}

impl Display for ValidationMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValidationMethod::Dns => "DNS",
            ValidationMethod::Email => "EMAIL",
        })
    }
}

impl IntoProperty for ValidationMethod {
    fn into_property(self) -> PropertyValue {
        PropertyValue::String(self.to_string())
    }
}

/// `aws:acm/certificate:Certificate`
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateArgs {
    pub domain_name: Output<String>,
    pub subject_alternative_names: Vec<Output<String>>,
    pub validation_method: ValidationMethod,
}

impl Resource for CertificateArgs {
    const TYPE: &'static str = "aws:acm/certificate:Certificate";
    const OUTPUTS: &'static [&'static str] = &["arn", "domainValidationOptions", "status"];

    fn into_inputs(self) -> PropertyMap {
        PropertyMap::new()
            .with("domainName", self.domain_name)
            .with("subjectAlternativeNames", self.subject_alternative_names)
            .with("validationMethod", self.validation_method)
    }
}

/// Field names inside one `domainValidationOptions` entry
pub mod validation_option {
    pub const DOMAIN_NAME: &str = "domainName";
    pub const RECORD_NAME: &str = "resourceRecordName";
    pub const RECORD_TYPE: &str = "resourceRecordType";
    pub const RECORD_VALUE: &str = "resourceRecordValue";
}

/// `aws:acm/certificateValidation:CertificateValidation`
///
/// Resolves only once ACM reports the certificate as issued.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateValidationArgs {
    pub certificate_arn: Output<String>,
    pub validation_record_fqdns: Vec<Output<String>>,
}

impl Resource for CertificateValidationArgs {
    const TYPE: &'static str = "aws:acm/certificateValidation:CertificateValidation";
    const OUTPUTS: &'static [&'static str] = &["certificateArn"];

    fn into_inputs(self) -> PropertyMap {
        PropertyMap::new()
            .with("certificateArn", self.certificate_arn)
            .with("validationRecordFqdns", self.validation_record_fqdns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn certificate_inputs_use_provider_names() {
        let inputs = CertificateArgs {
            domain_name: "example.com".into(),
            subject_alternative_names: vec!["*.example.com".into()],
            validation_method: ValidationMethod::Dns,
        }
        .into_inputs();

        assert_eq!(
            inputs.to_redacted_json(),
            json!({
                "domainName": "example.com",
                "subjectAlternativeNames": ["*.example.com"],
                "validationMethod": "DNS",
            })
        );
    }
}
