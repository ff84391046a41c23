//! Elasticsearch domain audit logging.
//!
//! An `aws_elasticsearch_domain` that publishes logs must publish `AUDIT_LOGS`
//! among them.

use crate::context::Context;
use crate::finding::Finding;
use crate::model::Block;
use crate::rule::{Documentation, Provider, RuleSpec, Severity};

pub const CODE: &str = "AWS070";

const BAD_EXAMPLE: &str = r#"
resource "aws_elasticsearch_domain" "example" {
  // other config

  // One of the log_publishing_options has to be AUDIT_LOGS
  log_publishing_options {
    cloudwatch_log_group_arn = aws_cloudwatch_log_group.example.arn
    log_type                 = "INDEX_SLOW_LOGS"
  }
}
"#;

const GOOD_EXAMPLE: &str = r#"
resource "aws_elasticsearch_domain" "example" {
  // other config

  // At minimum we should have AUDIT_LOGS enabled
  log_publishing_options {
    cloudwatch_log_group_arn = aws_cloudwatch_log_group.example.arn
    log_type                 = "AUDIT_LOGS"
  }
}
"#;

pub fn rule() -> RuleSpec {
    RuleSpec::new(CODE, Provider::aws())
        .with_severity(Severity::Error)
        .with_block_types(["resource"])
        .with_labels(["aws_elasticsearch_domain"])
        .with_documentation(Documentation {
            summary: "AWS ES Domain should have logging enabled".to_string(),
            explanation: "AWS ES domain should have logging enabled by default.".to_string(),
            bad_example: BAD_EXAMPLE.trim().to_string(),
            good_example: GOOD_EXAMPLE.trim().to_string(),
            links: vec![
                "https://registry.terraform.io/providers/hashicorp/aws/latest/docs/resources/elasticsearch_domain#log_publishing_options".to_string(),
            ],
        })
        .with_check(check)
}

fn check(spec: &RuleSpec, block: &Block, _: &Context) -> Vec<Finding> {
    let mut options = block.blocks("log_publishing_options").peekable();
    if options.peek().is_none() {
        return Vec::new();
    }

    let audit_logs = options.any(|option| {
        option
            .attribute("log_type")
            .is_some_and(|log_type| log_type.equals("AUDIT_LOGS"))
    });
    if audit_logs {
        return Vec::new();
    }

    vec![spec.finding(
        format!(
            "Resource '{}' is missing 'AUDIT_LOGS' in one of the 'log_publishing_options'-'log_type' attributes so audit log is not enabled",
            block.full_name()
        ),
        block.range(),
    )]
}
