//! In-memory reconciliation engine
//!
//! `SimulatedCloud` models just enough AWS behavior to exercise submission:
//! - deterministic ids derived from inputs
//! - idempotent re-registration keyed by URN
//! - ACM issuing DNS challenges and only validating once a matching record exists
//! - globally unique bucket names
//! - CloudFront refusing certificates that are not issued yet
//! - failure injection per URN

use parking_lot::Mutex;
use sitestack_core::resources::acm::validation_option;
use sitestack_core::resources::{
    BucketArgs, CertificateArgs, CertificateValidationArgs, DistributionArgs, ProviderArgs,
    RecordArgs, Resource,
};
use sitestack_kernel::engine::{Engine, RegisterRequest, RegisteredResource};
use sitestack_kernel::error::EngineError;
use sitestack_kernel::property::{PropertyMap, PropertyValue};
use sitestack_kernel::Urn;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const ACCOUNT_ID: &str = "123456789012";
/// ACM's DNS validation window
pub const VALIDATION_WINDOW_SECS: u64 = 2700;
/// Hosted zone every CloudFront distribution lives in
pub const CLOUDFRONT_ZONE_ID: &str = "Z2FDTNDATAQYW2";

/// Outcome of one registration call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Same,
}

#[derive(Debug, Clone)]
struct Challenge {
    record_name: String,
    record_value: String,
}

#[derive(Debug, Clone)]
struct Certificate {
    challenges: Vec<Challenge>,
    issued: bool,
}

#[derive(Debug, Clone)]
struct Stored {
    inputs: PropertyMap,
    resource: RegisteredResource,
}

#[derive(Debug, Default)]
struct CloudState {
    resources: HashMap<Urn, Stored>,
    certificates: HashMap<String, Certificate>,
    /// record name -> (values, fqdn)
    records: HashMap<String, (Vec<String>, String)>,
    /// bucket name -> owning URN
    buckets: HashMap<String, Urn>,
    hosted_zones: BTreeSet<String>,
    foreign_buckets: BTreeSet<String>,
    /// Records are accepted but never become visible to ACM
    dns_stalled: bool,
    failures: HashMap<Urn, EngineError>,
    log: Vec<(Urn, Operation)>,
}

/// Deterministic in-memory cloud
#[derive(Debug, Default)]
pub struct SimulatedCloud {
    state: Mutex<CloudState>,
}

impl SimulatedCloud {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept records in these hosted zones (any zone when none are set)
    #[must_use]
    pub fn with_hosted_zone(self, zone_id: &str) -> Self {
        self.state.lock().hosted_zones.insert(zone_id.to_string());
        self
    }

    /// A bucket name already owned by another account
    #[must_use]
    pub fn with_foreign_bucket(self, bucket: &str) -> Self {
        self.state.lock().foreign_buckets.insert(bucket.to_string());
        self
    }

    /// Accept records without ever propagating them, so validation times out
    #[must_use]
    pub fn with_stalled_dns(self) -> Self {
        self.state.lock().dns_stalled = true;
        self
    }

    /// Fail every registration of `urn` with `error`
    pub fn fail_on(&self, urn: Urn, error: EngineError) {
        self.state.lock().failures.insert(urn, error);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// URNs in the order they were registered, across all runs
    #[must_use]
    pub fn registrations(&self) -> Vec<Urn> {
        self.state.lock().log.iter().map(|(urn, _)| urn.clone()).collect()
    }

    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .log
            .iter()
            .filter(|(_, op)| *op == operation)
            .count()
    }

    /// Distinct resources currently held
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.state.lock().resources.len()
    }

    #[must_use]
    pub fn inputs_of(&self, urn: &Urn) -> Option<PropertyMap> {
        self.state.lock().resources.get(urn).map(|stored| stored.inputs.clone())
    }

    #[must_use]
    pub fn outputs_of(&self, urn: &Urn) -> Option<RegisteredResource> {
        self.state
            .lock()
            .resources
            .get(urn)
            .map(|stored| stored.resource.clone())
    }

    fn register(
        state: &mut CloudState,
        request: &RegisterRequest,
    ) -> Result<RegisteredResource, EngineError> {
        match request.resource_type.as_str() {
            ProviderArgs::TYPE => Ok(RegisteredResource::new(
                format!("{}-{}", request.name, token(request.urn.as_str(), 8)),
                PropertyMap::new(),
            )),
            CertificateArgs::TYPE => Self::certificate(state, request),
            RecordArgs::TYPE => Self::record(state, request),
            CertificateValidationArgs::TYPE => Self::validation(state, request),
            BucketArgs::TYPE => Self::bucket(state, request),
            DistributionArgs::TYPE => Self::distribution(state, request),
            other => Err(EngineError::Rejected(format!("unsupported resource type {other}"))),
        }
    }

    fn certificate(
        state: &mut CloudState,
        request: &RegisterRequest,
    ) -> Result<RegisteredResource, EngineError> {
        let domain = require_str(request, "domainName")?;
        let arn = format!(
            "arn:aws:acm:us-east-1:{ACCOUNT_ID}:certificate/{}",
            token(&domain, 32)
        );

        let mut names = vec![domain];
        names.extend(
            request
                .input("subjectAlternativeNames")
                .and_then(PropertyValue::as_list)
                .unwrap_or_default()
                .iter()
                .filter_map(plain),
        );

        let mut options = Vec::new();
        let mut challenges: BTreeMap<String, Challenge> = BTreeMap::new();
        for name in names {
            // A wildcard is validated through its apex's record.
            let base = name.trim_start_matches("*.").to_string();
            let challenge = challenges.entry(base.clone()).or_insert_with(|| Challenge {
                record_name: format!("_{}.{base}.", token(&base, 32)),
                record_value: format!("_{}.acm-validations.aws.", token(&format!("{arn}/{base}"), 32)),
            });
            options.push(
                PropertyMap::new()
                    .with(validation_option::DOMAIN_NAME, name)
                    .with(validation_option::RECORD_NAME, challenge.record_name.clone())
                    .with(validation_option::RECORD_TYPE, "CNAME")
                    .with(validation_option::RECORD_VALUE, challenge.record_value.clone()),
            );
        }

        let issued = state.certificates.get(&arn).is_some_and(|cert| cert.issued);
        state.certificates.insert(
            arn.clone(),
            Certificate {
                challenges: challenges.into_values().collect(),
                issued,
            },
        );

        Ok(RegisteredResource::new(
            arn.clone(),
            PropertyMap::new()
                .with("arn", arn)
                .with("domainValidationOptions", options)
                .with("status", if issued { "ISSUED" } else { "PENDING_VALIDATION" }),
        ))
    }

    fn record(
        state: &mut CloudState,
        request: &RegisterRequest,
    ) -> Result<RegisteredResource, EngineError> {
        let zone = require_str(request, "zoneId")?;
        if !state.hosted_zones.is_empty() && !state.hosted_zones.contains(&zone) {
            return Err(EngineError::Provider {
                code: "NoSuchHostedZone".into(),
                message: "No hosted zone found with the supplied ID".into(),
            });
        }
        let name = require_str(request, "name")?;
        let values: Vec<String> = request
            .input("records")
            .and_then(PropertyValue::as_list)
            .unwrap_or_default()
            .iter()
            .filter_map(plain)
            .collect();
        if values.is_empty() {
            return Err(EngineError::Provider {
                code: "InvalidChangeBatch".into(),
                message: format!("record {name} has no values"),
            });
        }

        let fqdn = name.trim_end_matches('.').to_string();
        if !state.dns_stalled {
            state.records.insert(name.clone(), (values, fqdn.clone()));
        }
        Ok(RegisteredResource::new(
            format!("{}_{name}_CNAME", token(&zone, 8)),
            PropertyMap::new().with("fqdn", fqdn).with("name", name),
        ))
    }

    fn validation(
        state: &mut CloudState,
        request: &RegisterRequest,
    ) -> Result<RegisteredResource, EngineError> {
        let arn = require_str(request, "certificateArn")?;
        let fqdns: Vec<String> = request
            .input("validationRecordFqdns")
            .and_then(PropertyValue::as_list)
            .unwrap_or_default()
            .iter()
            .filter_map(plain)
            .collect();

        let timeout = || EngineError::Timeout {
            operation: format!("certificate validation for {arn}"),
            waited_secs: VALIDATION_WINDOW_SECS,
        };
        let certificate = state.certificates.get(&arn).ok_or_else(|| EngineError::Provider {
            code: "ResourceNotFoundException".into(),
            message: format!("certificate {arn} not found"),
        })?;

        let satisfied = certificate.challenges.iter().all(|challenge| {
            state
                .records
                .get(&challenge.record_name)
                .is_some_and(|(values, fqdn)| {
                    values.contains(&challenge.record_value) && fqdns.contains(fqdn)
                })
        });
        if !satisfied {
            return Err(timeout());
        }

        if let Some(certificate) = state.certificates.get_mut(&arn) {
            certificate.issued = true;
        }
        Ok(RegisteredResource::new(
            arn.clone(),
            PropertyMap::new().with("certificateArn", arn),
        ))
    }

    fn bucket(
        state: &mut CloudState,
        request: &RegisterRequest,
    ) -> Result<RegisteredResource, EngineError> {
        let bucket = require_str(request, "bucket")?;
        let owned_elsewhere = state.foreign_buckets.contains(&bucket)
            || state.buckets.get(&bucket).is_some_and(|owner| *owner != request.urn);
        if owned_elsewhere {
            return Err(EngineError::Provider {
                code: "BucketAlreadyExists".into(),
                message: "The requested bucket name is not available".into(),
            });
        }
        state.buckets.insert(bucket.clone(), request.urn.clone());

        Ok(RegisteredResource::new(
            bucket.clone(),
            PropertyMap::new()
                .with("id", bucket.clone())
                .with("arn", format!("arn:aws:s3:::{bucket}"))
                .with("bucketDomainName", format!("{bucket}.s3.amazonaws.com"))
                .with(
                    "websiteEndpoint",
                    format!("{bucket}.s3-website-us-east-1.amazonaws.com"),
                ),
        ))
    }

    fn distribution(
        state: &mut CloudState,
        request: &RegisterRequest,
    ) -> Result<RegisteredResource, EngineError> {
        let certificate_arn = request
            .input("viewerCertificate")
            .and_then(|viewer| viewer.get("acmCertificateArn"))
            .and_then(plain)
            .ok_or_else(|| missing(request, "viewerCertificate.acmCertificateArn"))?;
        let issued = state
            .certificates
            .get(&certificate_arn)
            .is_some_and(|cert| cert.issued);
        if !issued {
            return Err(EngineError::Provider {
                code: "InvalidViewerCertificate".into(),
                message: format!("The specified SSL certificate {certificate_arn} doesn't exist, isn't in us-east-1 region, isn't valid, or doesn't include a valid certificate chain."),
            });
        }

        let id = format!("E{}", token(request.urn.as_str(), 13).to_uppercase());
        Ok(RegisteredResource::new(
            id.clone(),
            PropertyMap::new()
                .with("id", id.clone())
                .with("arn", format!("arn:aws:cloudfront::{ACCOUNT_ID}:distribution/{id}"))
                .with("domainName", format!("{}.cloudfront.net", id.to_lowercase()))
                .with("hostedZoneId", CLOUDFRONT_ZONE_ID)
                .with("status", "Deployed"),
        ))
    }
}

#[async_trait::async_trait]
impl Engine for SimulatedCloud {
    fn name(&self) -> &str {
        "simulated-cloud"
    }

    async fn register_resource(
        &self,
        request: RegisterRequest,
    ) -> Result<RegisteredResource, EngineError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if let Some(error) = state.failures.get(&request.urn) {
            return Err(error.clone());
        }

        if let Some(stored) = state.resources.get(&request.urn) {
            if stored.inputs == request.inputs {
                let resource = stored.resource.clone();
                state.log.push((request.urn.clone(), Operation::Same));
                tracing::debug!(urn = %request.urn, "unchanged");
                return Ok(resource);
            }
        }

        let registered = Self::register(state, &request)?;
        let operation = match state.resources.get(&request.urn) {
            Some(_) => Operation::Update,
            None => Operation::Create,
        };
        tracing::debug!(urn = %request.urn, ?operation, id = %registered.id, "simulated");
        state.resources.insert(
            request.urn.clone(),
            Stored {
                inputs: request.inputs.clone(),
                resource: registered.clone(),
            },
        );
        state.log.push((request.urn, operation));
        Ok(registered)
    }
}

/// Plain string content, looking through secrets
fn plain(value: &PropertyValue) -> Option<String> {
    value.to_exposed_json().as_str().map(str::to_string)
}

fn require_str(request: &RegisterRequest, key: &str) -> Result<String, EngineError> {
    request
        .input(key)
        .and_then(plain)
        .ok_or_else(|| missing(request, key))
}

fn missing(request: &RegisterRequest, key: &str) -> EngineError {
    EngineError::Rejected(format!("{}: missing input {key}", request.urn))
}

/// Deterministic lowercase hex token of `len` characters
fn token(seed: &str, len: usize) -> String {
    let digest = blake3::hash(seed.as_bytes());
    let mut hex = hex::encode(digest.as_bytes());
    hex.truncate(len);
    hex
}
