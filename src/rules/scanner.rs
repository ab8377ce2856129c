use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::model::Block;

use super::result::{CheckResult, ResultSet, Severity, Status};
use super::Registry;

/// Post-scan policy: rule ids to suppress and per-rule severity overrides,
/// plus reporting switches. Loaded from the config file collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanPolicy {
    /// Rule ids whose results are dropped (or marked ignored).
    #[serde(default)]
    pub exclude: HashSet<String>,
    /// Per-rule severity replacements.
    #[serde(default)]
    pub severity_overrides: HashMap<String, Severity>,
    /// Synthesize an explicit passed record for each matched-but-clean
    /// (block, rule) pair.
    #[serde(default)]
    pub include_passed: bool,
    /// Retain excluded results with `Status::Ignored` instead of dropping.
    #[serde(default)]
    pub show_ignored: bool,
}

/// A check function that panicked. Reported alongside results; never
/// aborts the scan.
#[derive(Debug, Clone, Serialize)]
pub struct RuleFault {
    pub rule_id: String,
    pub block: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub results: Vec<CheckResult>,
    pub faults: Vec<RuleFault>,
}

/// Dispatches blocks to matching rules. Blocks are visited in sequence
/// order and rules in id order, so two scans of the same input produce
/// identical ordered results.
pub struct Scanner<'a> {
    registry: &'a Registry,
    policy: ScanPolicy,
    cancel: Option<CancelToken>,
}

impl<'a> Scanner<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            policy: ScanPolicy::default(),
            cancel: None,
        }
    }

    pub fn with_policy(mut self, policy: ScanPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn scan(&self, blocks: &[Block]) -> Result<ScanOutcome> {
        let mut outcome = ScanOutcome::default();

        for block in blocks {
            if let Some(token) = &self.cancel {
                if token.is_cancelled() {
                    return Err(crate::error::GuardError::Cancelled);
                }
            }
            for rule in self.registry.rules() {
                if !rule.matches(block) {
                    continue;
                }
                let dispatch = panic::catch_unwind(AssertUnwindSafe(|| {
                    let mut set = ResultSet::for_rule(rule);
                    (rule.check)(&mut set, block, block.context().as_ref());
                    set
                }));
                match dispatch {
                    Ok(set) => {
                        if set.is_empty() && self.policy.include_passed {
                            let mut set = ResultSet::for_rule(rule);
                            set.add(
                                CheckResult::new(format!(
                                    "Resource '{}' passed check: {}",
                                    block.full_name(),
                                    rule.documentation.summary
                                ))
                                .with_range(block.range().clone())
                                .with_severity(Severity::Info)
                                .with_status(Status::Passed),
                            );
                            outcome.results.extend(set.into_results());
                        } else {
                            outcome.results.extend(set.into_results());
                        }
                    }
                    Err(payload) => {
                        let message = panic_message(payload);
                        tracing::error!(
                            rule = rule.id,
                            block = %block.full_name(),
                            %message,
                            "check function fault, continuing scan"
                        );
                        outcome.faults.push(RuleFault {
                            rule_id: rule.id.to_string(),
                            block: block.full_name(),
                            message,
                        });
                    }
                }
            }
        }

        outcome.results = self.apply_policy(outcome.results);
        Ok(outcome)
    }

    fn apply_policy(&self, results: Vec<CheckResult>) -> Vec<CheckResult> {
        results
            .into_iter()
            .filter_map(|mut result| {
                if self.policy.exclude.contains(&result.rule_id) {
                    if !self.policy.show_ignored {
                        return None;
                    }
                    result.status = Status::Ignored;
                }
                if let Some(&severity) = self.policy.severity_overrides.get(&result.rule_id) {
                    result.severity = severity;
                }
                Some(result)
            })
            .collect()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Scanner;
    use crate::rules::{CheckResult, Registry};

    /// Parse a source string and scan it with the builtin catalogue.
    pub(crate) fn scan_source(source: &str) -> Vec<CheckResult> {
        let blocks = crate::loader::load_source(source).unwrap();
        let registry = Registry::with_builtin().unwrap();
        Scanner::new(&registry).scan(&blocks).unwrap().results
    }
}
