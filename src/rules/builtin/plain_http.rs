use crate::rules::{CheckResult, Provider, Rule, RuleDocumentation, Severity};

/// AWS004: load balancer listeners should use HTTPS.
pub fn rule() -> Rule {
    Rule {
        id: "AWS004",
        documentation: RuleDocumentation {
            summary: "Use of plain HTTP.",
            explanation: "\
Plain HTTP is unencrypted and human-readable. If a malicious actor eavesdrops \
on the connection they can see all data flowing back and forth.

Use HTTPS, which is HTTP over an encrypted (TLS) connection, so eavesdroppers \
cannot read the traffic.",
            impact: "Your traffic is not protected",
            resolution: "Switch to HTTPS to benefit from TLS security features",
            bad_example: r#"
resource "aws_alb_listener" "bad_example" {
    protocol = "HTTP"
}
"#,
            good_example: r#"
resource "aws_alb_listener" "good_example" {
    protocol = "HTTPS"
}
"#,
            links: &[
                "https://www.cloudflare.com/en-gb/learning/ssl/why-is-http-not-secure/",
                "https://registry.terraform.io/providers/hashicorp/aws/latest/docs/resources/lb_listener",
            ],
        },
        provider: Provider::Aws,
        required_kinds: &["resource"],
        required_labels: &["aws_lb_listener", "aws_alb_listener"],
        check: |set, block, _ctx| {
            let protocol = block.get_attribute("protocol");
            let insecure = match protocol {
                // Listeners default to HTTP when no protocol is given.
                None => true,
                Some(attr) => attr.equals("HTTP"),
            };
            if !insecure {
                return;
            }

            // A listener that redirects straight to HTTPS is fine.
            let action = block.get_block("default_action");
            if action
                .get_attribute("type")
                .map(|a| a.equals("redirect"))
                .unwrap_or(false)
                && action
                    .get_block("redirect")
                    .get_attribute("protocol")
                    .map(|a| a.equals("HTTPS"))
                    .unwrap_or(false)
            {
                return;
            }

            let result = CheckResult::new(format!(
                "Resource '{}' uses plain HTTP instead of HTTPS.",
                block.full_name()
            ))
            .with_severity(Severity::Error);
            set.add(match protocol {
                Some(attr) => result
                    .with_range(attr.range().clone())
                    .with_attribute_annotation(attr),
                None => result.with_range(block.range().clone()),
            });
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::rules::scanner::test_support::scan_source;

    #[test]
    fn flags_http_listener() {
        let results = scan_source(
            r#"
resource "aws_alb_listener" "web" {
    protocol = "HTTP"
}
"#,
        );
        assert!(results.iter().any(|r| r.rule_id == "AWS004"));
    }

    #[test]
    fn passes_https_listener() {
        let results = scan_source(
            r#"
resource "aws_alb_listener" "web" {
    protocol = "HTTPS"
}
"#,
        );
        assert!(!results.iter().any(|r| r.rule_id == "AWS004"));
    }

    #[test]
    fn passes_http_listener_redirecting_to_https() {
        let results = scan_source(
            r#"
resource "aws_lb_listener" "web" {
    protocol = "HTTP"
    default_action {
        type = "redirect"
        redirect {
            protocol = "HTTPS"
        }
    }
}
"#,
        );
        assert!(!results.iter().any(|r| r.rule_id == "AWS004"));
    }

    #[test]
    fn flags_listener_with_no_protocol() {
        let results = scan_source(
            r#"
resource "aws_lb_listener" "web" {
}
"#,
        );
        assert!(results.iter().any(|r| r.rule_id == "AWS004"));
    }
}
