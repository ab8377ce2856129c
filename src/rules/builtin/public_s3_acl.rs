use crate::rules::{CheckResult, Provider, Rule, RuleDocumentation, Severity};

/// AWS001: S3 buckets should not carry a public ACL.
pub fn rule() -> Rule {
    Rule {
        id: "AWS001",
        documentation: RuleDocumentation {
            summary: "S3 Bucket has an ACL defined which allows public access.",
            explanation: "\
Buckets with a public ACL are readable (and with public-read-write, writable) \
by anyone on the internet. Unless the bucket hosts a public website, its \
contents should not be exposed.",
            impact: "The contents of the bucket can be accessed publicly",
            resolution: "Apply a more restrictive bucket ACL",
            bad_example: r#"
resource "aws_s3_bucket" "bad_example" {
    acl = "public-read"
}
"#,
            good_example: r#"
resource "aws_s3_bucket" "good_example" {
    acl = "private"
}
"#,
            links: &[
                "https://docs.aws.amazon.com/AmazonS3/latest/userguide/acl-overview.html",
                "https://registry.terraform.io/providers/hashicorp/aws/latest/docs/resources/s3_bucket",
            ],
        },
        provider: Provider::Aws,
        required_kinds: &["resource"],
        required_labels: &["aws_s3_bucket"],
        check: |set, block, _ctx| {
            let Some(acl) = block.get_attribute("acl") else {
                return;
            };
            if acl.is_any(&["public-read", "public-read-write", "website"]) {
                set.add(
                    CheckResult::new(format!(
                        "Resource '{}' has an ACL which allows public access.",
                        block.full_name()
                    ))
                    .with_range(acl.range().clone())
                    .with_attribute_annotation(acl)
                    .with_severity(Severity::Error),
                );
            }
        },
    }
}
