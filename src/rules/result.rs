use serde::{Deserialize, Serialize};

use crate::model::{Attribute, Range};

use super::{Provider, Rule};

/// Severity tier of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Outcome of one rule evaluation against one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Failed,
    Passed,
    Ignored,
}

/// One finding (or passed/ignored record) emitted by a rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub rule_id: String,
    pub rule_summary: String,
    pub provider: Provider,
    pub impact: String,
    pub resolution: String,
    pub links: Vec<String>,
    pub description: String,
    #[serde(rename = "location")]
    pub range: Range,
    /// `[type] value` snapshot of the offending attribute, for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    pub severity: Severity,
    pub status: Status,
}

impl CheckResult {
    /// Start a failed result with a description; rule identity fields are
    /// stamped by the `ResultSet` on add.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            rule_id: String::new(),
            rule_summary: String::new(),
            provider: Provider::General,
            impact: String::new(),
            resolution: String::new(),
            links: Vec::new(),
            description: description.into(),
            range: Range::new("", 0, 0),
            annotation: None,
            severity: Severity::Error,
            status: Status::Failed,
        }
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = range;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Attach a typed snapshot of the offending attribute. Non-scalar
    /// values attach nothing.
    pub fn with_attribute_annotation(mut self, attr: &Attribute) -> Self {
        self.annotation = attr.annotation();
        self
    }
}

/// Append-only, order-preserving collector handed to a rule's check
/// function. Results added here are stamped with the owning rule's
/// identity and documentation.
#[derive(Debug)]
pub struct ResultSet {
    rule_id: String,
    rule_summary: String,
    provider: Provider,
    impact: String,
    resolution: String,
    links: Vec<String>,
    results: Vec<CheckResult>,
}

impl ResultSet {
    pub(crate) fn for_rule(rule: &Rule) -> Self {
        Self {
            rule_id: rule.id.to_string(),
            rule_summary: rule.documentation.summary.to_string(),
            provider: rule.provider,
            impact: rule.documentation.impact.to_string(),
            resolution: rule.documentation.resolution.to_string(),
            links: rule
                .documentation
                .links
                .iter()
                .map(|l| l.to_string())
                .collect(),
            results: Vec::new(),
        }
    }

    pub fn add(&mut self, result: CheckResult) {
        self.results.push(CheckResult {
            rule_id: self.rule_id.clone(),
            rule_summary: self.rule_summary.clone(),
            provider: self.provider,
            impact: self.impact.clone(),
            resolution: self.resolution.clone(),
            links: self.links.clone(),
            ..result
        });
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub(crate) fn into_results(self) -> Vec<CheckResult> {
        self.results
    }
}
