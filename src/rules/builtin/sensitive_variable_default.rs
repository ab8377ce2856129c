use once_cell::sync::Lazy;
use regex::Regex;

use crate::rules::{CheckResult, Provider, Rule, RuleDocumentation, Severity};

static SENSITIVE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(password|secret|token|private_key|api_key)").unwrap());

/// GEN001: variables with sensitive-looking names should not carry defaults.
pub fn rule() -> Rule {
    Rule {
        id: "GEN001",
        documentation: RuleDocumentation {
            summary: "Potentially sensitive data stored in variable default.",
            explanation: "\
Sensitive attributes such as passwords and API tokens should not be hardcoded \
in variable defaults. Supply them through the environment or a secret store \
instead.",
            impact: "Sensitive credentials may be leaked with the source",
            resolution: "Remove the default and source the value externally",
            bad_example: r#"
variable "db_password" {
    default = "p4ssw0rd"
}
"#,
            good_example: r#"
variable "db_password" {
}
"#,
            links: &[
                "https://www.terraform.io/docs/state/sensitive-data.html",
            ],
        },
        provider: Provider::General,
        required_kinds: &["variable"],
        required_labels: &[],
        check: |set, block, _ctx| {
            let Some(name) = block.type_label() else {
                return;
            };
            if !SENSITIVE_NAME_RE.is_match(name) {
                return;
            }
            let Some(default) = block.get_attribute("default") else {
                return;
            };
            if !default.is_empty() {
                set.add(
                    CheckResult::new(format!(
                        "Variable '{}' includes a potentially sensitive default value.",
                        block.full_name()
                    ))
                    .with_range(default.range().clone())
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
    fn flags_password_variable_with_default() {
        let results = scan_source(
            r#"
variable "db_password" {
    default = "p4ssw0rd"
}
"#,
        );
        assert!(results.iter().any(|r| r.rule_id == "GEN001"));
    }

    #[test]
    fn passes_password_variable_without_default() {
        let results = scan_source(
            r#"
variable "db_password" {
}
"#,
        );
        assert!(!results.iter().any(|r| r.rule_id == "GEN001"));
    }

    #[test]
    fn passes_empty_default() {
        let results = scan_source(
            r#"
variable "db_password" {
    default = ""
}
"#,
        );
        assert!(!results.iter().any(|r| r.rule_id == "GEN001"));
    }

    #[test]
    fn passes_unrelated_variable() {
        let results = scan_source(
            r#"
variable "region" {
    default = "eu-west-1"
}
"#,
        );
        assert!(!results.iter().any(|r| r.rule_id == "GEN001"));
    }
}
