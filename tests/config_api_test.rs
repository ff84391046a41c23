//! Integration tests for config module public API.

use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tfguard::config::CONFIG_FILE_NAMES;
use tfguard::{Block, Registry, RuleCode, ScanConfig, Scanner, Severity, SourceFile, SourceRange};

fn slow_logs_domain() -> SourceFile {
    let domain = Block::new(
        "resource",
        ["aws_elasticsearch_domain", "example"],
        SourceRange::new("main.tf", 1, 6),
    )
    .with_child(Block::new(
        "log_publishing_options",
        Vec::<String>::new(),
        SourceRange::new("main.tf", 2, 5),
    ));
    SourceFile::new("main.tf", vec![domain])
}

#[test]
fn public_api_is_accessible() {
    let config = ScanConfig::default();
    assert!(config.worker_count() >= 1);
    assert_eq!(CONFIG_FILE_NAMES[0], ".tfguard.yml");
}

#[test]
fn yaml_extension_is_discovered() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".tfguard.yaml"), "min_severity: ERROR\n").unwrap();

    let config = ScanConfig::discover(temp.path()).unwrap();
    assert_eq!(config.min_severity, Some(Severity::Error));
}

#[test]
fn yml_takes_priority_over_yaml() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".tfguard.yml"), "jobs: 1\n").unwrap();
    fs::write(temp.path().join(".tfguard.yaml"), "jobs: 8\n").unwrap();

    let config = ScanConfig::discover(temp.path()).unwrap();
    assert_eq!(config.jobs, 1);
}

#[test]
fn full_config_workflow() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(".tfguard.yml"),
        r#"
jobs: 2
severity_overrides:
  AWS070: WARNING
"#,
    )
    .unwrap();

    let config = ScanConfig::discover(temp.path()).unwrap();
    let scanner = Scanner::new(Arc::new(Registry::with_builtins().unwrap())).with_config(config);
    let report = scanner.scan(vec![slow_logs_domain()]);

    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].severity, Severity::Warning);
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn excluded_rule_from_file_is_skipped() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".tfguard.yml"), "exclude: [AWS070]\n").unwrap();

    let config = ScanConfig::discover(temp.path()).unwrap();
    assert!(config.is_excluded(&RuleCode::new("AWS070")));

    let scanner = Scanner::new(Arc::new(Registry::with_builtins().unwrap())).with_config(config);
    let report = scanner.scan(vec![slow_logs_domain()]);

    assert_eq!(report.invocations, 0);
    assert!(report.findings.is_empty());
}
