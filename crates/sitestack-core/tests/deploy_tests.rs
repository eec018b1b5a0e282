//! End-to-end submission against the simulated cloud
//!
//! Run with: cargo test --package sitestack-core --test deploy_tests

use pretty_assertions::assert_eq;
use sitestack_core::prelude::*;
use sitestack_core::resources::acm::validation_option;
use sitestack_core::site::BUCKET_NAME_EXPORT;
use sitestack_test_utils::cloud::VALIDATION_WINDOW_SECS;
use sitestack_test_utils::{
    assert_no_zone_id, cloud, context, site_config, Operation, SimulatedCloud, BUCKET, ZONE_ID,
};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

fn urn_of(site: &SiteGraph, node: NodeId) -> Urn {
    site.graph.node(node).unwrap().urn.clone()
}

async fn deploy(cloud: &Arc<SimulatedCloud>) -> Result<DeploymentSummary, SiteError> {
    deploy_site(&site_config(), &context(), cloud.clone()).await
}

#[tokio::test]
async fn deploys_and_exports_bucket_name() {
    let cloud = Arc::new(cloud());
    let summary = deploy(&cloud).await.unwrap();

    assert_eq!(summary.registered.len(), 6);
    assert_eq!(
        summary.export(BUCKET_NAME_EXPORT).and_then(PropertyValue::as_str),
        Some(BUCKET)
    );
    assert_eq!(summary.exports.len(), 1);
    assert_eq!(cloud.count(Operation::Create), 6);
}

#[tokio::test]
async fn registration_follows_dependencies() {
    let cloud = Arc::new(cloud());
    deploy(&cloud).await.unwrap();

    let site = build_site(&site_config(), &context()).unwrap();
    let order = cloud.registrations();
    let position = |node: NodeId| {
        let urn = urn_of(&site, node);
        order.iter().position(|registered| *registered == urn).unwrap()
    };
    let nodes = site.nodes;
    assert!(position(nodes.provider) < position(nodes.certificate));
    assert!(position(nodes.certificate) < position(nodes.validation_record));
    assert!(position(nodes.validation_record) < position(nodes.validation));
    assert!(position(nodes.validation) < position(nodes.distribution));
    assert!(position(nodes.bucket) < position(nodes.distribution));
    assert_eq!(position(nodes.distribution), 5);
}

#[tokio::test]
async fn record_answers_the_first_challenge() {
    let cloud = Arc::new(cloud());
    let summary = deploy(&cloud).await.unwrap();
    let site = build_site(&site_config(), &context()).unwrap();

    let certificate = summary.resource(&urn_of(&site, site.nodes.certificate)).unwrap();
    let options = certificate
        .outputs
        .get("domainValidationOptions")
        .and_then(PropertyValue::as_list)
        .unwrap();
    // Apex and wildcard, sharing one challenge.
    assert_eq!(options.len(), 2);
    let first = &options[0];
    assert_eq!(
        first.get(validation_option::RECORD_NAME),
        options[1].get(validation_option::RECORD_NAME)
    );

    let record = cloud.inputs_of(&urn_of(&site, site.nodes.validation_record)).unwrap();
    assert_eq!(
        record.get("name"),
        first.get(validation_option::RECORD_NAME)
    );
    assert_eq!(
        record.get("type").and_then(PropertyValue::as_str),
        Some("CNAME")
    );
    assert_eq!(record.get("ttl").and_then(PropertyValue::as_i64), Some(60));

    let distribution = summary.resource(&urn_of(&site, site.nodes.distribution)).unwrap();
    let domain = distribution.outputs.get("domainName").and_then(PropertyValue::as_str).unwrap();
    assert!(domain.ends_with(".cloudfront.net"));
}

#[tokio::test]
async fn redeploy_is_idempotent() {
    let cloud = Arc::new(cloud());
    let first = deploy(&cloud).await.unwrap();
    let second = deploy(&cloud).await.unwrap();

    assert_eq!(cloud.resource_count(), 6);
    assert_eq!(cloud.count(Operation::Create), 6);
    assert_eq!(cloud.count(Operation::Same), 6);
    assert_eq!(first.resources, second.resources);
    assert_eq!(first.exports, second.exports);
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn changed_config_updates_in_place() {
    let cloud = Arc::new(cloud());
    deploy(&cloud).await.unwrap();

    let renamed = SiteConfig::new("example.com", "my-other-site", ZONE_ID).unwrap();
    let summary = deploy_site(&renamed, &context(), cloud.clone()).await.unwrap();

    assert_eq!(cloud.resource_count(), 6);
    assert_eq!(
        summary.export(BUCKET_NAME_EXPORT).and_then(PropertyValue::as_str),
        Some("my-other-site")
    );
    // Bucket and the distribution reading its outputs change; the rest holds.
    assert_eq!(cloud.count(Operation::Update), 2);
}

#[tokio::test]
async fn validation_timeout_aborts_before_the_distribution() {
    let cloud = Arc::new(cloud().with_stalled_dns());
    let err = deploy(&cloud).await.unwrap_err();

    let site = build_site(&site_config(), &context()).unwrap();
    assert_eq!(err.failed_resource(), Some(&urn_of(&site, site.nodes.validation)));
    assert!(matches!(
        err.engine_error(),
        Some(EngineError::Timeout { waited_secs, .. }) if *waited_secs == VALIDATION_WINDOW_SECS
    ));
    assert!(err.is_retryable());
    assert!(!err.is_configuration_error());

    let distribution = urn_of(&site, site.nodes.distribution);
    assert!(!cloud.registrations().contains(&distribution));
}

#[tokio::test]
async fn provider_errors_surface_verbatim() {
    let cloud = Arc::new(cloud().with_foreign_bucket(BUCKET));
    let err = deploy(&cloud).await.unwrap_err();

    let site = build_site(&site_config(), &context()).unwrap();
    assert_eq!(err.failed_resource(), Some(&urn_of(&site, site.nodes.bucket)));
    match err.engine_error() {
        Some(EngineError::Provider { code, message }) => {
            assert_eq!(code, "BucketAlreadyExists");
            assert!(err.to_string().contains(message.as_str()));
        }
        other => panic!("expected provider error, got {other:?}"),
    }
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn injected_failure_names_the_resource() {
    let cloud = Arc::new(cloud());
    let site = build_site(&site_config(), &context()).unwrap();
    let record = urn_of(&site, site.nodes.validation_record);
    cloud.fail_on(
        record.clone(),
        EngineError::Provider {
            code: "Throttling".into(),
            message: "Rate exceeded".into(),
        },
    );

    let err = deploy(&cloud).await.unwrap_err();
    assert_eq!(err.failed_resource(), Some(&record));
    assert!(err.to_string().contains(record.as_str()));
    assert!(err.is_retryable());

    cloud.clear_failures();
    assert!(deploy(&cloud).await.is_ok());
}

#[tokio::test]
async fn wrong_hosted_zone_fails_at_the_record() {
    let cloud = Arc::new(SimulatedCloud::new().with_hosted_zone("ZANOTHER"));
    let err = deploy(&cloud).await.unwrap_err();
    assert!(matches!(
        err.engine_error(),
        Some(EngineError::Provider { code, .. }) if code == "NoSuchHostedZone"
    ));
}

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn hosted_zone_id_stays_out_of_logs_and_results() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(capture.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let cloud = Arc::new(cloud());
    let summary = deploy(&cloud).await.unwrap();

    let logs = capture.contents();
    assert!(logs.contains("registered"));
    assert_no_zone_id(&logs);
    assert_no_zone_id(&format!("{summary:?}"));
    assert_no_zone_id(&serde_json::to_string(&summary.resources).unwrap());

    // The engine does receive it, and only on the record.
    let site = build_site(&site_config(), &context()).unwrap();
    for node in site.graph.nodes() {
        let inputs = cloud.inputs_of(&node.urn).unwrap();
        let exposed: Vec<String> = inputs
            .iter()
            .map(|(_, value)| value.to_exposed_json().to_string())
            .collect();
        let carries_zone = exposed.join(",").contains(ZONE_ID);
        assert_eq!(carries_zone, node.id == site.nodes.validation_record, "{}", node.urn);
    }
}
