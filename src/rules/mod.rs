//! Rule definitions, the registry, and the scanner.

pub mod builtin;
pub mod result;
pub mod scanner;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GuardError, Result};
use crate::model::Block;
use crate::resolve::Context;

pub use result::{CheckResult, ResultSet, Severity, Status};
pub use scanner::{RuleFault, ScanOutcome, ScanPolicy, Scanner};

/// Cloud provider a rule targets, carried onto its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
    Google,
    General,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aws => write!(f, "aws"),
            Self::Azure => write!(f, "azure"),
            Self::Google => write!(f, "google"),
            Self::General => write!(f, "general"),
        }
    }
}

/// Static documentation carried by every rule. Consumed by `list-rules`
/// and doc generation, never by the scanning logic.
#[derive(Debug, Clone, Serialize)]
pub struct RuleDocumentation {
    /// Brief description, e.g. "Use of plain HTTP.".
    pub summary: &'static str,
    /// Reasoning for the check and remediation detail (markdown).
    pub explanation: &'static str,
    pub impact: &'static str,
    pub resolution: &'static str,
    /// Configuration that would fail the check.
    pub bad_example: &'static str,
    /// The bad example amended to pass.
    pub good_example: &'static str,
    pub links: &'static [&'static str],
}

/// A targeted security check. `required_kinds` selects block kinds (e.g.
/// "resource"); `required_labels` selects type labels, empty meaning any.
/// The check function is a plain `fn` so rules cannot capture mutable
/// state across invocations.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: &'static str,
    pub documentation: RuleDocumentation,
    pub provider: Provider,
    pub required_kinds: &'static [&'static str],
    pub required_labels: &'static [&'static str],
    pub check: fn(&mut ResultSet, &Block, &Context),
}

impl Rule {
    /// Whether this rule applies to the given block.
    pub fn matches(&self, block: &Block) -> bool {
        self.required_kinds.contains(&block.kind())
            && (self.required_labels.is_empty()
                || block
                    .type_label()
                    .map(|label| self.required_labels.contains(&label))
                    .unwrap_or(false))
    }

    /// Flat metadata row for rule listings.
    pub fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: self.id.to_string(),
            summary: self.documentation.summary.to_string(),
            provider: self.provider,
            impact: self.documentation.impact.to_string(),
            resolution: self.documentation.resolution.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleMetadata {
    pub id: String,
    pub summary: String,
    pub provider: Provider,
    pub impact: String,
    pub resolution: String,
}

/// An explicit registry value, populated before scanning starts. Rules are
/// keyed and iterated by id so dispatch order is deterministic.
#[derive(Debug, Default)]
pub struct Registry {
    rules: BTreeMap<&'static str, Rule>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the builtin rule catalogue.
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        for rule in builtin::all_rules() {
            registry.register(rule)?;
        }
        Ok(registry)
    }

    /// Duplicate ids are a configuration error, never a silent overwrite.
    pub fn register(&mut self, rule: Rule) -> Result<()> {
        if self.rules.contains_key(rule.id) {
            return Err(GuardError::DuplicateRule(rule.id.to_string()));
        }
        self.rules.insert(rule.id, rule);
        Ok(())
    }

    /// Rules in id-ascending order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.get(id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_rule(id: &'static str) -> Rule {
        Rule {
            id,
            documentation: RuleDocumentation {
                summary: "Test rule.",
                explanation: "",
                impact: "",
                resolution: "",
                bad_example: "",
                good_example: "",
                links: &[],
            },
            provider: Provider::General,
            required_kinds: &["resource"],
            required_labels: &[],
            check: |_, _, _| {},
        }
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut registry = Registry::new();
        registry.register(noop_rule("TST001")).unwrap();
        let err = registry.register(noop_rule("TST001")).unwrap_err();
        assert!(matches!(err, GuardError::DuplicateRule(id) if id == "TST001"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rules_iterate_in_id_order() {
        let mut registry = Registry::new();
        registry.register(noop_rule("B002")).unwrap();
        registry.register(noop_rule("A001")).unwrap();
        let ids: Vec<_> = registry.rules().map(|r| r.id).collect();
        assert_eq!(ids, vec!["A001", "B002"]);
    }

    #[test]
    fn builtin_catalogue_registers_cleanly() {
        let registry = Registry::with_builtin().unwrap();
        assert!(!registry.is_empty());
        assert!(registry.get("AWS004").is_some());
    }

    #[test]
    fn matching_respects_kind_and_labels() {
        let blocks = crate::loader::load_source(
            r#"
resource "aws_lb_listener" "web" {}

resource "aws_instance" "web" {}

variable "web" {}
"#,
        )
        .unwrap();

        let mut rule = noop_rule("TST001");
        rule.required_labels = &["aws_lb_listener"];
        assert!(rule.matches(&blocks[0]));
        assert!(!rule.matches(&blocks[1]));
        assert!(!rule.matches(&blocks[2]));

        let any_resource = noop_rule("TST002");
        assert!(any_resource.matches(&blocks[0]));
        assert!(any_resource.matches(&blocks[1]));
        assert!(!any_resource.matches(&blocks[2]));
    }
}
