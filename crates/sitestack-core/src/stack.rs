//! Stack declaration API
//!
//! [`Stack`] wraps the kernel's `GraphBuilder` with one typed call per AWS
//! resource. Every call returns a handle whose outputs are unresolved until
//! the engine registers the node, so a resource can only read from
//! resources declared before it.

use crate::error::StackError;
use crate::resources::acm::validation_option;
use crate::resources::{
    BucketArgs, CertificateArgs, CertificateValidationArgs, DistributionArgs, ProviderArgs,
    RecordArgs, Resource, ValidationMethod, WebsiteArgs,
};
use sitestack_kernel::construction::{GraphBuilder, ResourceOptions};
use sitestack_kernel::output::Output;
use sitestack_kernel::property::PropertyValue;
use sitestack_kernel::secret::Secret;
use sitestack_kernel::{GraphContext, NodeId, ValidatedGraph};

/// Anything that names a declared node
pub trait Dependency {
    fn node_id(&self) -> NodeId;
}

macro_rules! impl_dependency {
    ($($handle:ty),+) => {
        $(
            impl Dependency for $handle {
                #[inline]
                fn node_id(&self) -> NodeId {
                    self.node
                }
            }
        )+
    };
}

/// Regional provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderHandle {
    pub node: NodeId,
}

/// One DNS challenge issued for a certificate
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationChallenge {
    pub domain_name: Output<String>,
    pub record_name: Output<String>,
    pub record_type: Output<String>,
    pub record_value: Output<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CertificateHandle {
    pub node: NodeId,
    pub arn: Output<String>,
    /// List of challenges, one per requested domain
    pub domain_validation_options: Output<Vec<PropertyValue>>,
    pub status: Output<String>,
}

impl CertificateHandle {
    /// Challenge `index`; unresolved until ACM issues it
    #[must_use]
    pub fn challenge(&self, index: usize) -> ValidationChallenge {
        let option: Output<PropertyValue> = self.domain_validation_options.index(index);
        ValidationChallenge {
            domain_name: option.field(validation_option::DOMAIN_NAME),
            record_name: option.field(validation_option::RECORD_NAME),
            record_type: option.field(validation_option::RECORD_TYPE),
            record_value: option.field(validation_option::RECORD_VALUE),
        }
    }

    /// The apex and wildcard names share one challenge, so the first suffices
    #[must_use]
    pub fn first_challenge(&self) -> ValidationChallenge {
        self.challenge(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRecordHandle {
    pub node: NodeId,
    pub fqdn: Output<String>,
}

/// Resolves once the certificate is issued
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationCompletionHandle {
    pub node: NodeId,
    pub certificate_arn: Output<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BucketHandle {
    pub node: NodeId,
    pub id: Output<String>,
    pub arn: Output<String>,
    pub bucket_domain_name: Output<String>,
    pub website_endpoint: Output<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionHandle {
    pub node: NodeId,
    pub id: Output<String>,
    pub arn: Output<String>,
    pub domain_name: Output<String>,
    pub hosted_zone_id: Output<String>,
    pub status: Output<String>,
}

impl_dependency!(
    ProviderHandle,
    CertificateHandle,
    ValidationRecordHandle,
    ValidationCompletionHandle,
    BucketHandle,
    DistributionHandle
);

/// Typed declaration front-end over [`GraphBuilder`]
#[derive(Debug)]
pub struct Stack {
    builder: GraphBuilder,
}

impl Stack {
    #[must_use]
    pub fn new(context: GraphContext) -> Self {
        Self {
            builder: GraphBuilder::new(context),
        }
    }

    #[must_use]
    pub fn context(&self) -> &GraphContext {
        self.builder.context()
    }

    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.builder.node_count()
    }

    fn declare<R: Resource>(
        &mut self,
        name: &str,
        args: R,
        options: ResourceOptions,
    ) -> Result<NodeId, StackError> {
        let node = self.builder.add_resource(args.into_spec(name, options))?;
        tracing::debug!(name, resource_type = R::TYPE, %node, "declared");
        Ok(node)
    }

    /// Explicit AWS provider pinned to `region`
    ///
    /// # Errors
    /// [`StackError::InvalidRegion`] for a malformed region.
    pub fn declare_provider(
        &mut self,
        name: &str,
        region: &str,
        profile: Option<&str>,
    ) -> Result<ProviderHandle, StackError> {
        let args = ProviderArgs::new(region, profile.map(str::to_string))?;
        let node = self.declare(name, args, ResourceOptions::new())?;
        Ok(ProviderHandle { node })
    }

    /// ACM certificate for `domain` plus `sans`, issued through `provider`
    ///
    /// # Errors
    /// Rejects an empty domain and duplicate declarations.
    pub fn declare_certificate(
        &mut self,
        name: &str,
        domain: impl Into<Output<String>>,
        sans: Vec<Output<String>>,
        validation_method: ValidationMethod,
        provider: &ProviderHandle,
    ) -> Result<CertificateHandle, StackError> {
        let domain_name = domain.into();
        if domain_name.property().as_str() == Some("") {
            return Err(StackError::InvalidArgument {
                resource: name.to_string(),
                field: "domainName",
                reason: "must not be empty".into(),
            });
        }
        let args = CertificateArgs {
            domain_name,
            subject_alternative_names: sans,
            validation_method,
        };
        let node = self.declare(name, args, ResourceOptions::new().provider(provider.node))?;
        Ok(CertificateHandle {
            node,
            arn: Output::computed(node, "arn"),
            domain_validation_options: Output::computed(node, "domainValidationOptions"),
            status: Output::computed(node, "status"),
        })
    }

    /// DNS record answering `challenge` in the hosted zone `zone_id`
    ///
    /// `zone_id` stays secret in the graph, in plans and in logs.
    ///
    /// # Errors
    /// Rejects a zero TTL and duplicate declarations.
    pub fn declare_validation_record(
        &mut self,
        name: &str,
        challenge: &ValidationChallenge,
        zone_id: Secret<String>,
        ttl: u32,
    ) -> Result<ValidationRecordHandle, StackError> {
        if ttl == 0 {
            return Err(StackError::InvalidArgument {
                resource: name.to_string(),
                field: "ttl",
                reason: "must be positive".into(),
            });
        }
        let args = RecordArgs {
            name: challenge.record_name.clone(),
            record_type: challenge.record_type.clone(),
            records: vec![challenge.record_value.clone()],
            ttl,
            zone_id: zone_id.into(),
        };
        let node = self.declare(name, args, ResourceOptions::new())?;
        Ok(ValidationRecordHandle {
            node,
            fqdn: Output::computed(node, "fqdn"),
        })
    }

    /// Synchronization point: resolves once ACM reports `certificate` issued
    ///
    /// # Errors
    /// Rejects an empty record list and duplicate declarations.
    pub fn declare_validation_completion(
        &mut self,
        name: &str,
        certificate: &CertificateHandle,
        record_fqdns: Vec<Output<String>>,
        provider: &ProviderHandle,
    ) -> Result<ValidationCompletionHandle, StackError> {
        if record_fqdns.is_empty() {
            return Err(StackError::InvalidArgument {
                resource: name.to_string(),
                field: "validationRecordFqdns",
                reason: "at least one validation record is required".into(),
            });
        }
        let args = CertificateValidationArgs {
            certificate_arn: certificate.arn.clone(),
            validation_record_fqdns: record_fqdns,
        };
        let node = self.declare(name, args, ResourceOptions::new().provider(provider.node))?;
        Ok(ValidationCompletionHandle {
            node,
            certificate_arn: Output::computed(node, "certificateArn"),
        })
    }

    /// S3 bucket configured as a website origin
    ///
    /// # Errors
    /// Rejects duplicate declarations.
    pub fn declare_bucket(
        &mut self,
        name: &str,
        bucket: impl Into<Output<String>>,
        index_document: &str,
    ) -> Result<BucketHandle, StackError> {
        let args = BucketArgs {
            bucket: bucket.into(),
            website: Some(WebsiteArgs::index(index_document)),
        };
        let node = self.declare(name, args, ResourceOptions::new())?;
        Ok(BucketHandle {
            node,
            id: Output::computed(node, "id"),
            arn: Output::computed(node, "arn"),
            bucket_domain_name: Output::computed(node, "bucketDomainName"),
            website_endpoint: Output::computed(node, "websiteEndpoint"),
        })
    }

    /// CloudFront distribution, held back until every `depends_on` node resolves
    ///
    /// `depends_on` adds ordering-only edges; no input reads from them.
    ///
    /// # Errors
    /// Rejects a distribution without origins and duplicate declarations.
    pub fn declare_distribution(
        &mut self,
        name: &str,
        args: DistributionArgs,
        depends_on: &[&dyn Dependency],
    ) -> Result<DistributionHandle, StackError> {
        if args.origins.is_empty() {
            return Err(StackError::InvalidArgument {
                resource: name.to_string(),
                field: "origins",
                reason: "at least one origin is required".into(),
            });
        }
        let options = depends_on
            .iter()
            .fold(ResourceOptions::new(), |options, dependency| {
                options.depends_on(dependency.node_id())
            });
        let node = self.declare(name, args, options)?;
        Ok(DistributionHandle {
            node,
            id: Output::computed(node, "id"),
            arn: Output::computed(node, "arn"),
            domain_name: Output::computed(node, "domainName"),
            hosted_zone_id: Output::computed(node, "hostedZoneId"),
            status: Output::computed(node, "status"),
        })
    }

    /// Register a named stack output
    ///
    /// # Errors
    /// Rejects duplicate names.
    pub fn export_output<T>(&mut self, name: &str, value: &Output<T>) -> Result<(), StackError> {
        self.builder.export(name, value)?;
        Ok(())
    }

    /// Register a named stack output that may carry secrets
    ///
    /// # Errors
    /// Rejects duplicate names.
    pub fn export_secret<T>(&mut self, name: &str, value: &Output<T>) -> Result<(), StackError> {
        self.builder.export_secret(name, value)?;
        Ok(())
    }

    /// Validate and seal the declared graph
    ///
    /// # Errors
    /// Any [`sitestack_kernel::ValidationError`].
    pub fn finish(self) -> Result<ValidatedGraph, StackError> {
        Ok(self.builder.validate()?)
    }
}
