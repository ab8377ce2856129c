use crate::rules::{CheckResult, Provider, Rule, RuleDocumentation, Severity};

use super::is_open_cidr;

/// AWS008: inline security group ingress rules open to the internet.
pub fn rule() -> Rule {
    Rule {
        id: "AWS008",
        documentation: RuleDocumentation {
            summary: "An inline ingress security group rule allows traffic from /0.",
            explanation: "\
Opening up ports to the public internet is generally to be avoided. Restrict \
access to IP addresses or ranges that explicitly require it where possible.",
            impact: "The port is exposed for ingress from the internet",
            resolution: "Set a more restrictive cidr range",
            bad_example: r#"
resource "aws_security_group" "bad_example" {
    ingress {
        cidr_blocks = ["0.0.0.0/0"]
    }
}
"#,
            good_example: r#"
resource "aws_security_group" "good_example" {
    ingress {
        cidr_blocks = ["1.2.3.4/32"]
    }
}
"#,
            links: &[
                "https://registry.terraform.io/providers/hashicorp/aws/latest/docs/resources/security_group",
            ],
        },
        provider: Provider::Aws,
        required_kinds: &["resource"],
        required_labels: &["aws_security_group"],
        check: |set, block, _ctx| {
            for ingress in block.get_blocks("ingress") {
                for name in ["cidr_blocks", "ipv6_cidr_blocks"] {
                    let Some(cidrs) = ingress.get_attribute(name) else {
                        continue;
                    };
                    if is_open_cidr(cidrs) {
                        set.add(
                            CheckResult::new(format!(
                                "Resource '{}' defines a fully open ingress security group.",
                                block.full_name()
                            ))
                            .with_range(cidrs.range().clone())
                            .with_attribute_annotation(cidrs)
                            .with_severity(Severity::Warning),
                        );
                    }
                }
            }
        },
    }
}
