use indexmap::IndexMap;
use serde::Serialize;

/// A resolved attribute value.
///
/// This is a closed set: every consumer matches exhaustively, so a rule can
/// never assume the wrong variant. "Absent" is deliberately not a variant —
/// a missing attribute is an `Option::None` at the lookup site, keeping
/// "missing" and "present but empty/false" distinguishable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    /// Resolved but indeterminate (computed-only expression, unsupported
    /// function, reference cycle). Rules treat this as "cannot assert".
    Unknown,
    String(String),
    Bool(bool),
    Number(f64),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    /// True for unknown, the empty string, and zero-length lists/maps.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Unknown => true,
            Value::String(s) => s.is_empty(),
            Value::Bool(_) | Value::Number(_) => false,
            Value::List(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Type-aware equality: string-to-string (optionally case-insensitive),
    /// boolean-to-boolean, number-to-number, element-wise for lists and maps.
    /// Cross-variant comparisons are always false, and unknown equals
    /// nothing, not even another unknown.
    pub fn equals(&self, other: &Value, ignore_case: bool) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => {
                if ignore_case {
                    a.eq_ignore_ascii_case(b)
                } else {
                    a == b
                }
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y, ignore_case))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.get(k).map(|w| v.equals(w, ignore_case)).unwrap_or(false)
                    })
            }
            _ => false,
        }
    }

    /// Containment: substring for strings, element membership for lists,
    /// key membership for maps. Other variants contain nothing.
    pub fn contains(&self, needle: &str, ignore_case: bool) -> bool {
        match self {
            Value::String(s) => {
                if ignore_case {
                    s.to_ascii_lowercase()
                        .contains(&needle.to_ascii_lowercase())
                } else {
                    s.contains(needle)
                }
            }
            Value::List(items) => items
                .iter()
                .any(|item| item.equals(&Value::from(needle), ignore_case)),
            Value::Map(entries) => entries.keys().any(|key| {
                if ignore_case {
                    key.eq_ignore_ascii_case(needle)
                } else {
                    key == needle
                }
            }),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}
