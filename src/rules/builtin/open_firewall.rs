use crate::rules::{CheckResult, Provider, Rule, RuleDocumentation, Severity};

use super::is_open_cidr;

/// GCP003: compute firewall rules open to the internet.
pub fn rule() -> Rule {
    Rule {
        id: "GCP003",
        documentation: RuleDocumentation {
            summary: "An inbound firewall rule allows traffic from /0.",
            explanation: "\
Network security rules should not use very broad subnets. Where possible, \
segments should be broken into smaller subnets and avoid using the /0 range.",
            impact: "The port is exposed for ingress from the internet",
            resolution: "Set a more restrictive source range",
            bad_example: r#"
resource "google_compute_firewall" "bad_example" {
    source_ranges = ["0.0.0.0/0"]
}
"#,
            good_example: r#"
resource "google_compute_firewall" "good_example" {
    source_ranges = ["10.0.0.1/24"]
}
"#,
            links: &[
                "https://cloud.google.com/vpc/docs/using-firewalls",
                "https://registry.terraform.io/providers/hashicorp/google/latest/docs/resources/compute_firewall",
            ],
        },
        provider: Provider::Google,
        required_kinds: &["resource"],
        required_labels: &["google_compute_firewall"],
        check: |set, block, _ctx| {
            let Some(ranges) = block.get_attribute("source_ranges") else {
                return;
            };
            if is_open_cidr(ranges) {
                set.add(
                    CheckResult::new(format!(
                        "Resource '{}' defines a fully open inbound firewall rule.",
                        block.full_name()
                    ))
                    .with_range(ranges.range().clone())
                    .with_attribute_annotation(ranges)
                    .with_severity(Severity::Warning),
                );
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::rules::scanner::test_support::scan_source;

    #[test]
    fn flags_open_source_range() {
        let results = scan_source(
            r#"
resource "google_compute_firewall" "allow_all" {
    source_ranges = ["0.0.0.0/0"]
}
"#,
        );
        assert!(results.iter().any(|r| r.rule_id == "GCP003"));
    }

    #[test]
    fn passes_restricted_source_range() {
        let results = scan_source(
            r#"
resource "google_compute_firewall" "allow_internal" {
    source_ranges = ["10.0.0.1/24"]
}
"#,
        );
        assert!(!results.iter().any(|r| r.rule_id == "GCP003"));
    }
}
