use regex::Regex;

use super::range::Range;
use super::value::Value;

/// A single named value on a block.
///
/// All predicates are total: they answer false (never panic, never error)
/// when the value has the wrong variant, so rules read as plain predicate
/// chains without defensive checks.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    value: Value,
    raw_expression: String,
    range: Range,
}

impl Attribute {
    pub fn new(
        name: impl Into<String>,
        value: Value,
        raw_expression: impl Into<String>,
        range: Range,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            raw_expression: raw_expression.into(),
            range,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The unevaluated source form, kept for the cases resolution fails.
    pub fn raw_expression(&self) -> &str {
        &self.raw_expression
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    /// True only for the boolean variant holding `true`. A string `"true"`
    /// does not satisfy this; rules that want to accept the string form call
    /// `equals_ignore_case("true")` explicitly as a second check.
    pub fn is_true(&self) -> bool {
        matches!(self.value, Value::Bool(true))
    }

    /// True only for the boolean variant holding `false`.
    pub fn is_false(&self) -> bool {
        matches!(self.value, Value::Bool(false))
    }

    pub fn is_unknown(&self) -> bool {
        self.value.is_unknown()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn equals(&self, expected: impl Into<Value>) -> bool {
        self.value.equals(&expected.into(), false)
    }

    pub fn equals_ignore_case(&self, expected: &str) -> bool {
        self.value.equals(&Value::from(expected), true)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.value.contains(needle, false)
    }

    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        self.value.contains(needle, true)
    }

    /// Applies only to the string variant; anything else is false.
    pub fn regex_matches(&self, pattern: &Regex) -> bool {
        self.value
            .as_str()
            .map(|s| pattern.is_match(s))
            .unwrap_or(false)
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.value
            .as_str()
            .map(|s| s.starts_with(prefix))
            .unwrap_or(false)
    }

    pub fn ends_with(&self, suffix: &str) -> bool {
        self.value
            .as_str()
            .map(|s| s.ends_with(suffix))
            .unwrap_or(false)
    }

    /// True when the string value equals any of the given options.
    pub fn is_any(&self, options: &[&str]) -> bool {
        self.value
            .as_str()
            .map(|s| options.contains(&s))
            .unwrap_or(false)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }

    pub fn as_number(&self) -> Option<f64> {
        self.value.as_number()
    }

    /// Render a `[type] value` snapshot of scalar values for display next to
    /// a finding's range. Non-scalar values render nothing.
    pub fn annotation(&self) -> Option<String> {
        match &self.value {
            Value::String(s) => Some(format!("[string] {:?}", s)),
            Value::Bool(b) => Some(format!("[bool] {}", b)),
            Value::Number(n) => Some(format!("[number] {}", n)),
            _ => None,
        }
    }
}
