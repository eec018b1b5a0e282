//! Site graph shape
//!
//! Run with: cargo test --package sitestack-core --test site_tests

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use sitestack_core::prelude::*;
use sitestack_core::resources::{
    BucketArgs, CertificateArgs, CertificateValidationArgs, DistributionArgs, ProviderArgs,
    RecordArgs,
};
use sitestack_core::site::{BUCKET_NAME_EXPORT, DISTRIBUTION_NAME, VALIDATION_NAME};
use sitestack_test_utils::{assert_no_zone_id, assert_redacted, context, site_config, ZONE_ID};

fn build() -> SiteGraph {
    build_site(&site_config(), &context()).unwrap()
}

fn inputs_json(site: &SiteGraph, node: NodeId) -> serde_json::Value {
    site.graph.node(node).unwrap().inputs.to_redacted_json()
}

#[test]
fn one_node_per_resource_kind() {
    let site = build();
    assert_eq!(site.graph.node_count(), 6);
    for token in [
        ProviderArgs::TYPE,
        CertificateArgs::TYPE,
        RecordArgs::TYPE,
        CertificateValidationArgs::TYPE,
        BucketArgs::TYPE,
        DistributionArgs::TYPE,
    ] {
        assert_eq!(site.graph.nodes_of_type(token).count(), 1, "{token}");
    }
}

#[test]
fn record_and_validation_share_a_name() {
    let site = build();
    let record = site.graph.node(site.nodes.validation_record).unwrap();
    let validation = site.graph.node(site.nodes.validation).unwrap();
    assert_eq!(record.name, VALIDATION_NAME);
    assert_eq!(validation.name, VALIDATION_NAME);
    assert_ne!(record.urn, validation.urn);
}

#[test]
fn distribution_waits_on_validation_out_of_band() {
    let site = build();
    let nodes = site.nodes;

    let dependencies = site.graph.dependencies(nodes.distribution);
    let (_, kinds) = dependencies
        .iter()
        .find(|(node, _)| *node == nodes.validation)
        .expect("validation gates the distribution");
    assert!(kinds.is_ordering_only());

    // Nothing in the distribution's inputs points at the validation node.
    let distribution = site.graph.node(nodes.distribution).unwrap();
    assert!(distribution
        .inputs
        .output_refs()
        .iter()
        .all(|reference| reference.node != nodes.validation));

    // The gate holds transitively through the record as well.
    assert!(site
        .graph
        .depends_transitively(nodes.distribution, nodes.validation_record));
    assert!(!site.graph.depends_transitively(nodes.bucket, nodes.certificate));
}

#[test]
fn certificate_and_validation_pinned_to_east() {
    let site = build();
    for node in [site.nodes.certificate, site.nodes.validation] {
        let kinds = site.graph.edge(site.nodes.provider, node).unwrap();
        assert!(kinds.contains(EdgeKind::Provider));
        assert_eq!(site.graph.node(node).unwrap().provider, Some(site.nodes.provider));
    }
    assert_eq!(
        inputs_json(&site, site.nodes.provider),
        json!({ "region": "us-east-1" })
    );
}

#[test]
fn certificate_covers_apex_and_wildcard() {
    let site = build();
    let inputs = inputs_json(&site, site.nodes.certificate);
    assert_eq!(inputs["domainName"], json!("example.com"));
    assert_eq!(inputs["subjectAlternativeNames"], json!(["*.example.com"]));
    assert_eq!(inputs["validationMethod"], json!("DNS"));
}

#[test]
fn distribution_settings() {
    let site = build();
    let inputs = inputs_json(&site, site.nodes.distribution);

    assert_eq!(inputs["enabled"], json!(true));
    assert_eq!(inputs["aliases"], json!(["example.com", "www.example.com"]));
    assert_eq!(inputs["defaultRootObject"], json!("index.html"));
    assert_eq!(inputs["priceClass"], json!("PriceClass_100"));
    assert_eq!(inputs["viewerCertificate"]["sslSupportMethod"], json!("sni-only"));
    assert_eq!(
        inputs["restrictions"]["geoRestriction"]["restrictionType"],
        json!("none")
    );

    let behavior = &inputs["defaultCacheBehavior"];
    assert_eq!(behavior["viewerProtocolPolicy"], json!("redirect-to-https"));
    assert_eq!(behavior["allowedMethods"], json!(["GET", "HEAD", "OPTIONS"]));
    assert_eq!(behavior["cachedMethods"], json!(["GET", "HEAD", "OPTIONS"]));
    assert_eq!(behavior["forwardedValues"]["queryString"], json!(false));
    assert_eq!(behavior["forwardedValues"]["cookies"]["forward"], json!("none"));
}

#[test]
fn bucket_name_export_reads_bucket_id() {
    let site = build();
    let export = site.graph.export(BUCKET_NAME_EXPORT).unwrap();
    assert!(!export.secret);

    let references = export.value.output_refs();
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].node, site.nodes.bucket);
    assert_eq!(references[0].field, "id");

    assert_eq!(
        inputs_json(&site, site.nodes.bucket),
        json!({ "bucket": "my-static-site", "website": { "indexDocument": "index.html" } })
    );
    assert_eq!(site.graph.exports().count(), 1);
}

#[test]
fn rebuild_is_identical() {
    let first = build();
    let second = build();
    assert_eq!(first.nodes, second.nodes);
    assert_eq!(first.graph.fingerprint(), second.graph.fingerprint());
    assert_eq!(first.graph.plan(), second.graph.plan());
    assert_eq!(first.graph.to_dot(), second.graph.to_dot());
}

#[test]
fn fingerprint_tracks_plain_config_only() {
    let base = build().graph.fingerprint();

    let other_bucket = SiteConfig::new("example.com", "other-bucket", ZONE_ID).unwrap();
    let other_bucket = build_site(&other_bucket, &context()).unwrap();
    assert_ne!(other_bucket.graph.fingerprint(), base);

    let other_zone = SiteConfig::new("example.com", "my-static-site", "ZOTHER").unwrap();
    let other_zone = build_site(&other_zone, &context()).unwrap();
    assert_eq!(other_zone.graph.fingerprint(), base);
}

#[test]
fn zone_id_only_reaches_the_record() {
    let site = build();

    for node in site.graph.nodes() {
        assert_no_zone_id(&node.inputs.to_redacted_json().to_string());
        if node.id != site.nodes.validation_record {
            let exposed: Vec<String> = node
                .inputs
                .iter()
                .map(|(_, value)| value.to_exposed_json().to_string())
                .collect();
            assert_no_zone_id(&exposed.join(","));
            assert!(node.inputs.output_refs().iter().all(|r| !r.field.contains("zone")));
        }
    }

    let record = site.graph.node(site.nodes.validation_record).unwrap();
    let zone = record.inputs.get("zoneId").unwrap();
    assert!(zone.is_secret());
    assert_eq!(zone.to_exposed_json(), json!(ZONE_ID));

    for (_, export) in site.graph.exports() {
        assert!(!export.value.contains_secret());
    }

    let plan = serde_json::to_string(&site.graph.plan()).unwrap();
    assert_no_zone_id(&plan);
    assert_redacted(&plan);
    assert_no_zone_id(&site.graph.to_dot());
    assert_no_zone_id(&format!("{:?}", site_config()));
}

#[test]
fn dot_marks_the_ordering_edge() {
    let site = build();
    let dot = site.graph.to_dot();
    assert!(dot.starts_with("digraph stack {"));
    assert!(dot.contains(&format!(
        "n{} -> n{} [label=\"ordering\", style=dashed];",
        site.nodes.validation.0, site.nodes.distribution.0
    )));
    assert!(dot.contains(DISTRIBUTION_NAME));
}

#[test]
fn empty_site_configuration_is_rejected() {
    assert!(SiteConfig::new("", "bucket", ZONE_ID).is_err());
    assert!(SiteConfig::new("example.com", "", ZONE_ID).is_err());
    assert!(SiteConfig::new("example.com", "bucket", "").is_err());
}

#[test]
fn subdomain_sites_build() {
    let config = SiteConfig::new("www.example.com", "my-static-site", ZONE_ID).unwrap();
    let site = build_site(&config, &context()).unwrap();
    assert_eq!(site.graph.node_count(), 6);
    assert_eq!(
        inputs_json(&site, site.nodes.distribution)["aliases"],
        json!(["www.example.com", "www.www.example.com"])
    );
}

prop_compose! {
    fn any_site()(
        label in "[a-z][a-z0-9]{0,15}",
        tld in prop::sample::select(vec!["com", "org", "io", "dev"]),
        bucket in "[a-z][a-z0-9-]{2,30}[a-z0-9]",
        zone in "Z[A-Z0-9]{8,20}",
    ) -> SiteConfig {
        SiteConfig::new(format!("{label}.{tld}"), bucket, zone).unwrap()
    }
}

proptest! {
    #[test]
    fn every_valid_config_builds_the_same_shape(config in any_site()) {
        let site = build_site(&config, &context()).unwrap();
        prop_assert_eq!(site.graph.node_count(), 6);
        prop_assert_eq!(site.graph.topological_order().len(), 6);

        let validation_edge = site.graph.edge(site.nodes.validation, site.nodes.distribution);
        prop_assert!(validation_edge.is_some_and(EdgeKinds::is_ordering_only));

        let certificate = inputs_json(&site, site.nodes.certificate);
        prop_assert_eq!(
            &certificate["subjectAlternativeNames"],
            &json!([format!("*.{}", config.domain)])
        );
        let distribution = inputs_json(&site, site.nodes.distribution);
        prop_assert_eq!(
            &distribution["aliases"],
            &json!([config.domain.clone(), format!("www.{}", config.domain)])
        );
    }

    #[test]
    fn error_responses_always_rewrite_to_the_entry_document(config in any_site()) {
        let site = build_site(&config, &context()).unwrap();
        let responses = inputs_json(&site, site.nodes.distribution)["customErrorResponses"].clone();
        let expected = json!([
            { "errorCode": 403, "responseCode": 200, "responsePagePath": "/index.html", "errorCachingMinTtl": 86400 },
            { "errorCode": 404, "responseCode": 200, "responsePagePath": "/index.html", "errorCachingMinTtl": 86400 },
        ]);
        prop_assert_eq!(responses, expected);
    }

    #[test]
    fn zone_id_never_leaves_the_record(config in any_site()) {
        let site = build_site(&config, &context()).unwrap();
        let zone = config.hosted_zone_id.expose().clone();
        for node in site.graph.nodes() {
            let exposed = node.inputs.to_redacted_json().to_string();
            prop_assert!(!exposed.contains(&zone));
        }
        let plan = serde_json::to_string(&site.graph.plan()).unwrap();
        prop_assert!(!plan.contains(&zone));
    }
}
