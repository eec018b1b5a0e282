//! Stack file loading
//!
//! Run with: cargo test --package sitestack-core --test config_tests

use sitestack_core::prelude::*;
use sitestack_test_utils::{assert_no_zone_id, STACK_TOML, ZONE_ID};
use std::io::Write;
use tempfile::NamedTempFile;

fn stack_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn loads_site_from_stack_file() {
    let file = stack_file(STACK_TOML);
    let stack = StackConfig::from_file(file.path()).unwrap();
    let site = SiteConfig::from_stack_config(&stack).unwrap();

    assert_eq!(site.domain, "example.com");
    assert_eq!(site.bucket_name, "my-static-site");
    assert_eq!(site.hosted_zone_id.expose(), ZONE_ID);
    assert_eq!(site.profile, None);
    assert_eq!(stack.context(), GraphContext::new("static-site", "dev"));
}

#[test]
fn profile_reaches_the_provider() {
    let file = stack_file(&format!("{STACK_TOML}\"aws:profile\" = \"deploy\"\n"));
    let stack = StackConfig::from_file(file.path()).unwrap();
    let site = SiteConfig::from_stack_config(&stack).unwrap();
    assert_eq!(site.profile.as_deref(), Some("deploy"));

    let graph = build_site(&site, &stack.context()).unwrap();
    let provider = graph.graph.node(graph.nodes.provider).unwrap();
    assert_eq!(
        provider.inputs.get("profile").and_then(PropertyValue::as_str),
        Some("deploy")
    );
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stack.toml");
    let err = StackConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { path: ref p } if *p == path));
}

#[test]
fn parse_errors_name_the_file() {
    let file = stack_file("project = \n");
    let err = StackConfig::from_file(file.path()).unwrap_err();
    match err {
        ConfigError::Parse { origin, .. } => {
            assert_eq!(origin, file.path().display().to_string());
        }
        other => panic!("expected parse error, got {other}"),
    }
}

#[test]
fn unknown_top_level_fields_are_rejected() {
    let file = stack_file("region = \"us-west-2\"\n[config]\n");
    assert!(matches!(
        StackConfig::from_file(file.path()),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn each_required_key_is_enforced() {
    for missing in ["domain", "bucketName", "hostedZoneId"] {
        let content: String = STACK_TOML
            .lines()
            .filter(|line| !line.contains(&format!(":{missing}\"")))
            .map(|line| format!("{line}\n"))
            .collect();
        let stack = StackConfig::from_toml(&content).unwrap();
        let err = SiteConfig::from_stack_config(&stack).unwrap_err();
        assert!(
            matches!(&err, ConfigError::MissingKey(key) if key.ends_with(missing)),
            "{missing}: {err}"
        );

        let err = SiteError::from(err);
        assert!(err.is_configuration_error());
        assert!(!err.is_retryable());
    }
}

#[test]
fn hosted_zone_id_is_never_rendered() {
    let stack = StackConfig::from_toml(STACK_TOML).unwrap();
    let site = SiteConfig::from_stack_config(&stack).unwrap();

    assert_no_zone_id(&format!("{stack:?}"));
    assert_no_zone_id(&format!("{site:?}"));
    assert_no_zone_id(&site.hosted_zone_id.to_string());

    let err = stack.require("hostedZoneId").unwrap_err();
    assert_no_zone_id(&err.to_string());
}
