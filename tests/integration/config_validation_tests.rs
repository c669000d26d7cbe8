//! Configuration loading and validation tests

use rolegate::{Config, PlatformError, Role};
use std::io::Write;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_load_from_yaml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
access:
  cache:
    ttl_secs: 120
    max_entries: 500
applications:
  auto_approve_roles: ["student"]
  application_ttl_days: 30
audit:
  retention_days: 90
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).await.unwrap();
    assert_eq!(config.access.cache.ttl_secs, 120);
    assert_eq!(config.access.cache.max_entries, 500);
    assert_eq!(config.applications.auto_approve_roles, vec![Role::Student]);
    assert_eq!(config.applications.application_ttl_days, 30);
    assert_eq!(config.audit.retention_days, 90);
}

#[tokio::test]
async fn test_missing_file_is_a_config_error() {
    let err = Config::from_file("/nonexistent/rolegate.yaml")
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Config(_)));
}

#[test]
fn test_empty_yaml_uses_defaults() {
    let config = Config::from_yaml("{}").unwrap();
    assert_eq!(config.access.cache.ttl_secs, 300);
    assert_eq!(config.applications.max_commit_retries, 3);
    assert!(config.audit.enabled);
}

#[test]
fn test_zero_ttl_rejected() {
    let err = Config::from_yaml("access:\n  cache:\n    ttl_secs: 0\n").unwrap_err();
    assert!(matches!(err, PlatformError::Config(_)));
    assert!(err.to_string().contains("TTL"));
}

#[test]
fn test_excessive_retries_rejected() {
    let err = Config::from_yaml("applications:\n  max_commit_retries: 50\n").unwrap_err();
    assert!(matches!(err, PlatformError::Config(_)));
}

#[test]
fn test_auto_approving_base_role_rejected() {
    let err = Config::from_yaml("applications:\n  auto_approve_roles: [\"user\"]\n").unwrap_err();
    assert!(matches!(err, PlatformError::Config(_)));
}

#[test]
fn test_malformed_yaml_rejected() {
    let err = Config::from_yaml("access: [not a map").unwrap_err();
    assert!(matches!(err, PlatformError::Config(_)));
}
