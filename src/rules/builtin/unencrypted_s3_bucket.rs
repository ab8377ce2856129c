use crate::rules::{CheckResult, Provider, Rule, RuleDocumentation, Severity};

/// AWS017: S3 buckets should define server-side encryption.
pub fn rule() -> Rule {
    Rule {
        id: "AWS017",
        documentation: RuleDocumentation {
            summary: "Unencrypted S3 bucket.",
            explanation: "\
S3 buckets should be encrypted at rest with a customer-managed or AWS-managed \
key. Add a server_side_encryption_configuration block to enable it.",
            impact: "The bucket objects could be read if compromised",
            resolution: "Configure bucket encryption",
            bad_example: r#"
resource "aws_s3_bucket" "bad_example" {
    bucket = "mybucket"
}
"#,
            good_example: r#"
resource "aws_s3_bucket" "good_example" {
    bucket = "mybucket"

    server_side_encryption_configuration {
        rule {
            apply_server_side_encryption_by_default {
                sse_algorithm = "aws:kms"
            }
        }
    }
}
"#,
            links: &[
                "https://docs.aws.amazon.com/AmazonS3/latest/userguide/bucket-encryption.html",
                "https://registry.terraform.io/providers/hashicorp/aws/latest/docs/resources/s3_bucket",
            ],
        },
        provider: Provider::Aws,
        required_kinds: &["resource"],
        required_labels: &["aws_s3_bucket"],
        check: |set, block, _ctx| {
            // No attribute to point at, so the finding covers the block.
            if block.missing_child("server_side_encryption_configuration") {
                set.add(
                    CheckResult::new(format!(
                        "Resource '{}' defines an unencrypted S3 bucket (missing server_side_encryption_configuration block).",
                        block.full_name()
                    ))
                    .with_range(block.range().clone())
                    .with_severity(Severity::Error),
                );
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::rules::scanner::test_support::scan_source;

    #[test]
    fn flags_bucket_without_encryption_block() {
        let results = scan_source(
            r#"
resource "aws_s3_bucket" "data" {
    bucket = "my-data"
}
"#,
        );
        let result = results.iter().find(|r| r.rule_id == "AWS017").unwrap();
        // Range covers the whole block since there is no attribute.
        assert_eq!(result.range.start_line, 2);
        assert_eq!(result.range.end_line, 4);
    }

    #[test]
    fn passes_bucket_with_encryption_block() {
        let results = scan_source(
            r#"
resource "aws_s3_bucket" "data" {
    bucket = "my-data"

    server_side_encryption_configuration {
        rule {
            apply_server_side_encryption_by_default {
                sse_algorithm = "aws:kms"
            }
        }
    }
}
"#,
        );
        assert!(!results.iter().any(|r| r.rule_id == "AWS017"));
    }
}
