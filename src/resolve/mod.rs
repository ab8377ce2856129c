//! Expression and cross-reference resolution.
//!
//! A `Context` evaluates raw HCL expressions against variable bindings,
//! locals, sibling blocks and child modules. Resolution is a pure function
//! of the parsed tree and the bindings: anything it cannot determine
//! (function calls, for-expressions, reference cycles, undeclared
//! variables) resolves to `Value::Unknown` rather than failing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use hcl_edit::expr::{
    BinaryOperator, Expression, ObjectKey, Traversal, TraversalOperator, UnaryOperator,
};
use hcl_edit::template::Element;

use crate::model::{Range, Value};

/// Unresolved block tree as parsed from one module, before value
/// resolution. The loader builds these; the context reads them when
/// chasing references.
#[derive(Debug, Clone)]
pub(crate) struct RawBlock {
    pub kind: String,
    pub labels: Vec<String>,
    pub attrs: Vec<RawAttr>,
    pub children: Vec<RawBlock>,
    pub range: Range,
}

#[derive(Debug, Clone)]
pub(crate) struct RawAttr {
    pub name: String,
    pub expr: Expression,
    pub range: Range,
}

impl RawBlock {
    fn attr(&self, name: &str) -> Option<&RawAttr> {
        self.attrs.iter().find(|a| a.name == name)
    }
}

/// Resolution context for one module instantiation.
#[derive(Debug, Default)]
pub struct Context {
    module_path: Option<String>,
    /// Caller-supplied input bindings; these override variable defaults.
    variables: HashMap<String, Value>,
    blocks: Vec<RawBlock>,
    children: HashMap<String, Arc<Context>>,
}

impl Context {
    pub(crate) fn new(
        module_path: Option<String>,
        blocks: Vec<RawBlock>,
        variables: HashMap<String, Value>,
    ) -> Self {
        Self {
            module_path,
            variables,
            blocks,
            children: HashMap::new(),
        }
    }

    pub(crate) fn attach_child(&mut self, name: String, child: Arc<Context>) {
        self.children.insert(name, child);
    }

    pub(crate) fn raw_blocks(&self) -> &[RawBlock] {
        &self.blocks
    }

    pub fn module_path(&self) -> Option<&str> {
        self.module_path.as_deref()
    }

    /// The value bound or declared for a variable, or unknown.
    pub fn variable(&self, name: &str) -> Value {
        let mut visited = HashSet::new();
        self.resolve_variable(name, &mut visited)
    }

    /// Resolve a raw expression to a concrete value, or `Value::Unknown`.
    pub fn resolve(&self, expr: &Expression) -> Value {
        let mut visited = HashSet::new();
        self.evaluate(expr, &mut visited)
    }

    /// Module-qualified key so the visitation guard distinguishes the same
    /// reference name across module instantiations.
    fn qualify(&self, key: &str) -> String {
        match &self.module_path {
            Some(path) => format!("{}:{}", path, key),
            None => format!("root:{}", key),
        }
    }

    fn evaluate(&self, expr: &Expression, visited: &mut HashSet<String>) -> Value {
        match expr {
            // An explicit null carries nothing a rule can assert on.
            Expression::Null(_) => Value::Unknown,
            Expression::Bool(b) => Value::Bool(*b.value()),
            Expression::Number(n) => n
                .value()
                .as_f64()
                .map(Value::Number)
                .unwrap_or(Value::Unknown),
            Expression::String(s) => Value::String(s.value().clone()),
            Expression::Array(array) => {
                Value::List(array.iter().map(|e| self.evaluate(e, visited)).collect())
            }
            Expression::Object(object) => {
                let mut entries = indexmap::IndexMap::new();
                for (key, value) in object.iter() {
                    let key = match key {
                        ObjectKey::Ident(ident) => ident.value().as_str().to_string(),
                        ObjectKey::Expression(expr) => match self.evaluate(expr, visited) {
                            Value::String(s) => s,
                            _ => expr.to_string().trim().to_string(),
                        },
                    };
                    entries.insert(key, self.evaluate(value.expr(), visited));
                }
                Value::Map(entries)
            }
            Expression::StringTemplate(template) => {
                self.evaluate_template(template.iter(), visited)
            }
            Expression::HeredocTemplate(heredoc) => {
                self.evaluate_template(heredoc.template.iter(), visited)
            }
            Expression::Parenthesis(paren) => self.evaluate(paren.inner(), visited),
            Expression::UnaryOp(op) => {
                let operand = self.evaluate(&op.expr, visited);
                match (op.operator.value(), operand) {
                    (UnaryOperator::Neg, Value::Number(n)) => Value::Number(-n),
                    (UnaryOperator::Not, Value::Bool(b)) => Value::Bool(!b),
                    _ => Value::Unknown,
                }
            }
            Expression::BinaryOp(op) => {
                let lhs = self.evaluate(&op.lhs_expr, visited);
                let rhs = self.evaluate(&op.rhs_expr, visited);
                self.fold_binary(op.operator.value(), lhs, rhs)
            }
            Expression::Conditional(cond) => match self.evaluate(&cond.cond_expr, visited) {
                Value::Bool(true) => self.evaluate(&cond.true_expr, visited),
                Value::Bool(false) => self.evaluate(&cond.false_expr, visited),
                _ => Value::Unknown,
            },
            Expression::Traversal(traversal) => self.evaluate_traversal(traversal, visited),
            // Bare identifiers, function calls, for-expressions and
            // anything else computed at apply time.
            _ => Value::Unknown,
        }
    }

    fn evaluate_template<'a>(
        &self,
        elements: impl Iterator<Item = &'a Element>,
        visited: &mut HashSet<String>,
    ) -> Value {
        let mut out = String::new();
        for element in elements {
            match element {
                Element::Literal(literal) => out.push_str(literal.value()),
                Element::Interpolation(interpolation) => {
                    match self.evaluate(&interpolation.expr, visited) {
                        Value::String(s) => out.push_str(&s),
                        Value::Number(n) => out.push_str(&format_number(n)),
                        Value::Bool(b) => out.push_str(if b { "true" } else { "false" }),
                        _ => return Value::Unknown,
                    }
                }
                Element::Directive(_) => return Value::Unknown,
            }
        }
        Value::String(out)
    }

    fn fold_binary(&self, operator: &BinaryOperator, lhs: Value, rhs: Value) -> Value {
        use BinaryOperator::*;
        if lhs.is_unknown() || rhs.is_unknown() {
            return Value::Unknown;
        }
        match operator {
            Eq => Value::Bool(lhs.equals(&rhs, false)),
            NotEq => Value::Bool(!lhs.equals(&rhs, false)),
            And => match (lhs.as_bool(), rhs.as_bool()) {
                (Some(a), Some(b)) => Value::Bool(a && b),
                _ => Value::Unknown,
            },
            Or => match (lhs.as_bool(), rhs.as_bool()) {
                (Some(a), Some(b)) => Value::Bool(a || b),
                _ => Value::Unknown,
            },
            _ => match (lhs.as_number(), rhs.as_number()) {
                (Some(a), Some(b)) => match operator {
                    Plus => Value::Number(a + b),
                    Minus => Value::Number(a - b),
                    Mul => Value::Number(a * b),
                    Div if b != 0.0 => Value::Number(a / b),
                    Mod if b != 0.0 => Value::Number(a % b),
                    Less => Value::Bool(a < b),
                    LessEq => Value::Bool(a <= b),
                    Greater => Value::Bool(a > b),
                    GreaterEq => Value::Bool(a >= b),
                    _ => Value::Unknown,
                },
                _ => Value::Unknown,
            },
        }
    }

    fn evaluate_traversal(&self, traversal: &Traversal, visited: &mut HashSet<String>) -> Value {
        let Expression::Variable(root) = &traversal.expr else {
            return Value::Unknown;
        };
        let ops = &traversal.operators;
        let step = |index: usize| -> Option<&str> {
            match ops.get(index).map(|op| op.value()) {
                Some(TraversalOperator::GetAttr(ident)) => Some(ident.value().as_str()),
                _ => None,
            }
        };

        match root.value().as_str() {
            "var" => {
                let Some(name) = step(0) else {
                    return Value::Unknown;
                };
                let value = self.resolve_variable(name, visited);
                self.apply_operators(value, &ops[1..], visited)
            }
            "local" => {
                let Some(name) = step(0) else {
                    return Value::Unknown;
                };
                let value = self.resolve_local(name, visited);
                self.apply_operators(value, &ops[1..], visited)
            }
            "module" => {
                let (Some(name), Some(output)) = (step(0), step(1)) else {
                    return Value::Unknown;
                };
                let Some(child) = self.children.get(name) else {
                    return Value::Unknown;
                };
                let value = child.resolve_output(output, visited);
                self.apply_operators(value, &ops[2..], visited)
            }
            "data" => {
                let (Some(type_label), Some(name), Some(attr)) = (step(0), step(1), step(2))
                else {
                    return Value::Unknown;
                };
                let value = self.resolve_block_attr("data", &[type_label, name], attr, visited);
                self.apply_operators(value, &ops[3..], visited)
            }
            // Instance-scoped references have no single value statically.
            "each" | "count" | "self" | "path" | "terraform" => Value::Unknown,
            type_label => {
                let (Some(name), Some(attr)) = (step(0), step(1)) else {
                    return Value::Unknown;
                };
                let value = self.resolve_block_attr("resource", &[type_label, name], attr, visited);
                self.apply_operators(value, &ops[2..], visited)
            }
        }
    }

    fn apply_operators(
        &self,
        mut value: Value,
        ops: &[hcl_edit::Decorated<TraversalOperator>],
        visited: &mut HashSet<String>,
    ) -> Value {
        for op in ops {
            value = match op.value() {
                TraversalOperator::GetAttr(ident) => match &value {
                    Value::Map(entries) => entries
                        .get(ident.value().as_str())
                        .cloned()
                        .unwrap_or(Value::Unknown),
                    _ => Value::Unknown,
                },
                TraversalOperator::Index(index_expr) => {
                    match (self.evaluate(index_expr, visited), &value) {
                        (Value::Number(n), Value::List(items)) => {
                            items.get(n as usize).cloned().unwrap_or(Value::Unknown)
                        }
                        (Value::String(key), Value::Map(entries)) => {
                            entries.get(&key).cloned().unwrap_or(Value::Unknown)
                        }
                        _ => Value::Unknown,
                    }
                }
                TraversalOperator::LegacyIndex(index) => match &value {
                    Value::List(items) => items
                        .get(*index.value() as usize)
                        .cloned()
                        .unwrap_or(Value::Unknown),
                    _ => Value::Unknown,
                },
                _ => Value::Unknown,
            };
        }
        value
    }

    /// Resolve with an on-stack guard: a reference revisited within the same
    /// request is a cycle and resolves to unknown instead of recursing.
    fn guarded(
        &self,
        key: String,
        visited: &mut HashSet<String>,
        resolve: impl FnOnce(&Self, &mut HashSet<String>) -> Value,
    ) -> Value {
        if !visited.insert(key.clone()) {
            return Value::Unknown;
        }
        let value = resolve(self, visited);
        visited.remove(&key);
        value
    }

    fn resolve_variable(&self, name: &str, visited: &mut HashSet<String>) -> Value {
        self.guarded(self.qualify(&format!("var.{}", name)), visited, |ctx, visited| {
            if let Some(bound) = ctx.variables.get(name) {
                return bound.clone();
            }
            ctx.blocks
                .iter()
                .find(|b| b.kind == "variable" && b.labels.first().map(String::as_str) == Some(name))
                .and_then(|b| b.attr("default"))
                .map(|attr| ctx.evaluate(&attr.expr, visited))
                .unwrap_or(Value::Unknown)
        })
    }

    fn resolve_local(&self, name: &str, visited: &mut HashSet<String>) -> Value {
        self.guarded(self.qualify(&format!("local.{}", name)), visited, |ctx, visited| {
            ctx.blocks
                .iter()
                .filter(|b| b.kind == "locals")
                .find_map(|b| b.attr(name))
                .map(|attr| ctx.evaluate(&attr.expr, visited))
                .unwrap_or(Value::Unknown)
        })
    }

    fn resolve_output(&self, name: &str, visited: &mut HashSet<String>) -> Value {
        self.guarded(self.qualify(&format!("output.{}", name)), visited, |ctx, visited| {
            ctx.blocks
                .iter()
                .find(|b| b.kind == "output" && b.labels.first().map(String::as_str) == Some(name))
                .and_then(|b| b.attr("value"))
                .map(|attr| ctx.evaluate(&attr.expr, visited))
                .unwrap_or(Value::Unknown)
        })
    }

    fn resolve_block_attr(
        &self,
        kind: &str,
        labels: &[&str],
        attr: &str,
        visited: &mut HashSet<String>,
    ) -> Value {
        let key = self.qualify(&format!("{}.{}.{}", kind, labels.join("."), attr));
        self.guarded(key, visited, |ctx, visited| {
            ctx.blocks
                .iter()
                .find(|b| {
                    b.kind == kind
                        && b.labels.len() >= labels.len()
                        && b.labels.iter().zip(labels).all(|(a, b)| a == b)
                })
                .and_then(|b| b.attr(attr))
                .map(|a| ctx.evaluate(&a.expr, visited))
                .unwrap_or(Value::Unknown)
        })
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::loader::load_source;
    use crate::model::Value;

    fn resolved(source: &str, attr: &str) -> Value {
        let blocks = load_source(source).unwrap();
        let block = blocks
            .iter()
            .find(|b| b.kind() == "resource")
            .expect("no resource block in source");
        block
            .get_attribute(attr)
            .expect("attribute missing")
            .value()
            .clone()
    }

    #[test]
    fn literals_resolve_immediately() {
        let source = r#"
resource "thing" "a" {
    s = "hello"
    b = true
    n = 42
    l = ["x", "y"]
}
"#;
        assert_eq!(resolved(source, "s"), Value::from("hello"));
        assert_eq!(resolved(source, "b"), Value::Bool(true));
        assert_eq!(resolved(source, "n"), Value::Number(42.0));
        assert_eq!(
            resolved(source, "l"),
            Value::List(vec![Value::from("x"), Value::from("y")])
        );
    }

    #[test]
    fn variable_default_resolves() {
        let source = r#"
variable "region" {
    default = "eu-west-1"
}

resource "thing" "a" {
    region = var.region
}
"#;
        assert_eq!(resolved(source, "region"), Value::from("eu-west-1"));
    }

    #[test]
    fn undeclared_variable_is_unknown() {
        let source = r#"
resource "thing" "a" {
    region = var.missing
}
"#;
        assert_eq!(resolved(source, "region"), Value::Unknown);
    }

    #[test]
    fn locals_and_cross_block_references() {
        let source = r#"
locals {
    bucket_acl = "private"
}

resource "aws_s3_bucket" "logs" {
    acl = local.bucket_acl
}

resource "aws_s3_bucket_policy" "logs" {
    acl_copy = aws_s3_bucket.logs.acl
}
"#;
        let blocks = load_source(source).unwrap();
        let policy = blocks
            .iter()
            .find(|b| b.type_label() == Some("aws_s3_bucket_policy"))
            .unwrap();
        assert!(policy.get_attribute("acl_copy").unwrap().equals("private"));
    }

    #[test]
    fn string_template_interpolation() {
        let source = r#"
variable "env" {
    default = "prod"
}

resource "thing" "a" {
    name = "app-${var.env}"
    port_text = "port-${8080}"
}
"#;
        assert_eq!(resolved(source, "name"), Value::from("app-prod"));
        assert_eq!(resolved(source, "port_text"), Value::from("port-8080"));
    }

    #[test]
    fn reference_cycle_yields_unknown() {
        let source = r#"
resource "thing" "a" {
    v = thing.b.v
}

resource "thing" "b" {
    v = thing.a.v
}
"#;
        assert_eq!(resolved(source, "v"), Value::Unknown);
    }

    #[test]
    fn repeated_reference_is_not_a_cycle() {
        let source = r#"
variable "env" {
    default = "prod"
}

resource "thing" "a" {
    name = "${var.env}-${var.env}"
}
"#;
        assert_eq!(resolved(source, "name"), Value::from("prod-prod"));
    }

    #[test]
    fn function_calls_are_unknown() {
        let source = r#"
resource "thing" "a" {
    v = max(1, 2)
}
"#;
        assert_eq!(resolved(source, "v"), Value::Unknown);
    }

    #[test]
    fn conditionals_and_operators_fold() {
        let source = r#"
variable "count" {
    default = 3
}

resource "thing" "a" {
    doubled = var.count * 2
    label = var.count > 2 ? "many" : "few"
}
"#;
        assert_eq!(resolved(source, "doubled"), Value::Number(6.0));
        assert_eq!(resolved(source, "label"), Value::from("many"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let source = r#"
variable "env" {
    default = "prod"
}

resource "thing" "a" {
    name = "app-${var.env}"
}
"#;
        let first = load_source(source).unwrap();
        let second = load_source(source).unwrap();
        assert_eq!(
            first[1].get_attribute("name").unwrap().value(),
            second[1].get_attribute("name").unwrap().value()
        );
    }
}
