use crate::rules::{CheckResult, Provider, Rule, RuleDocumentation, Severity};

/// AZU003: Azure managed disks must not disable encryption.
pub fn rule() -> Rule {
    Rule {
        id: "AZU003",
        documentation: RuleDocumentation {
            summary: "Unencrypted managed disk.",
            explanation: "\
Managed disks should be encrypted at rest. When specifying the \
encryption_settings block, the enabled attribute should be set to true.",
            impact: "Data could be read if compromised",
            resolution: "Enable encryption on managed disks",
            bad_example: r#"
resource "azurerm_managed_disk" "bad_example" {
    encryption_settings {
        enabled = false
    }
}
"#,
            good_example: r#"
resource "azurerm_managed_disk" "good_example" {
    encryption_settings {
        enabled = true
    }
}
"#,
            links: &[
                "https://docs.microsoft.com/en-us/azure/virtual-machines/linux/disk-encryption",
                "https://www.terraform.io/docs/providers/azurerm/r/managed_disk.html",
            ],
        },
        provider: Provider::Azure,
        required_kinds: &["resource"],
        required_labels: &["azurerm_managed_disk"],
        check: |set, block, _ctx| {
            // Encryption is on by default; only an explicit opt-out fails.
            // Only the boolean false counts — the string "false" stays
            // unresolved policy-wise and is not flagged here.
            let settings = block.get_block("encryption_settings");
            let Some(enabled) = settings.get_attribute("enabled") else {
                return;
            };
            if enabled.is_false() {
                set.add(
                    CheckResult::new(format!(
                        "Resource '{}' defines an unencrypted managed disk.",
                        block.full_name()
                    ))
                    .with_range(enabled.range().clone())
                    .with_attribute_annotation(enabled)
                    .with_severity(Severity::Error),
                );
            }
        },
    }
}
