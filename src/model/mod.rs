//! Semantic document model for parsed configuration.
//!
//! A `Block` is a named syntactic unit (resource, module call, variable
//! group, nested sub-block); an `Attribute` is a named value on a block.
//! The model is read-only after construction and every navigation or query
//! operation is total: missing data yields the absent/false/empty answer,
//! never a panic or an error.

pub mod attribute;
pub mod range;
pub mod value;

use std::sync::Arc;

pub use attribute::Attribute;
pub use range::Range;
pub use value::Value;

use crate::resolve::Context;

/// A named syntactic unit in the parsed configuration.
#[derive(Debug, Clone)]
pub struct Block {
    kind: String,
    type_label: Option<String>,
    instance_labels: Vec<String>,
    attributes: Vec<Attribute>,
    children: Vec<Block>,
    range: Range,
    module_path: Option<String>,
    ctx: Arc<Context>,
}

impl Block {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        kind: String,
        type_label: Option<String>,
        instance_labels: Vec<String>,
        attributes: Vec<Attribute>,
        children: Vec<Block>,
        range: Range,
        module_path: Option<String>,
        ctx: Arc<Context>,
    ) -> Self {
        Self {
            kind,
            type_label,
            instance_labels,
            attributes,
            children,
            range,
            module_path,
            ctx,
        }
    }

    /// Block category: "resource", "module", "variable", or the name of a
    /// nested sub-block such as "ingress".
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// First label, e.g. a resource type name such as `aws_s3_bucket`.
    pub fn type_label(&self) -> Option<&str> {
        self.type_label.as_deref()
    }

    /// Remaining labels, e.g. the resource instance name.
    pub fn instance_labels(&self) -> &[String] {
        &self.instance_labels
    }

    /// Which module instantiation produced this block, for multi-module
    /// trees. `None` for the root module.
    pub fn module_path(&self) -> Option<&str> {
        self.module_path.as_deref()
    }

    /// The resolution context of this block's module.
    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn children(&self) -> &[Block] {
        &self.children
    }

    /// The attribute with the given name, or `None`. Never resolves
    /// defaults implicitly — default-value policy belongs to the rule.
    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// First direct child block of the given kind. Returns an absent
    /// sentinel rather than an option so navigation chains stay total:
    /// `block.get_block("a").get_block("b").get_attribute("c")` is safe
    /// regardless of which levels exist.
    pub fn get_block(&self, name: &str) -> BlockRef<'_> {
        BlockRef(self.children.iter().find(|b| b.kind == name))
    }

    /// All direct child blocks of the given kind, in source order.
    pub fn get_blocks(&self, name: &str) -> Vec<&Block> {
        self.children.iter().filter(|b| b.kind == name).collect()
    }

    /// Whether an attribute or child block with this name exists.
    pub fn has_child(&self, name: &str) -> bool {
        self.get_attribute(name).is_some() || self.get_block(name).is_present()
    }

    /// Exact complement of `has_child`.
    pub fn missing_child(&self, name: &str) -> bool {
        !self.has_child(name)
    }

    /// Human-readable `kind.typeLabel.instanceLabel` path for messages,
    /// prefixed with the module path for blocks inside modules.
    pub fn full_name(&self) -> String {
        let mut parts = vec![self.kind.as_str()];
        if let Some(label) = &self.type_label {
            parts.push(label);
        }
        for label in &self.instance_labels {
            parts.push(label);
        }
        let name = parts.join(".");
        match &self.module_path {
            Some(path) => format!("{}:{}", path, name),
            None => name,
        }
    }
}

/// Possibly-absent reference to a block. Implements the same navigation
/// surface as `Block`, answering absent/empty for every query when no block
/// is present.
#[derive(Debug, Clone, Copy)]
pub struct BlockRef<'a>(Option<&'a Block>);

impl<'a> BlockRef<'a> {
    pub(crate) fn absent() -> Self {
        BlockRef(None)
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    pub fn as_block(&self) -> Option<&'a Block> {
        self.0
    }

    pub fn get_attribute(&self, name: &str) -> Option<&'a Attribute> {
        self.0.and_then(|b| b.get_attribute(name))
    }

    pub fn get_block(&self, name: &str) -> BlockRef<'a> {
        match self.0 {
            Some(block) => block.get_block(name),
            None => BlockRef::absent(),
        }
    }

    pub fn get_blocks(&self, name: &str) -> Vec<&'a Block> {
        self.0.map(|b| b.get_blocks(name)).unwrap_or_default()
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.0.map(|b| b.has_child(name)).unwrap_or(false)
    }

    pub fn missing_child(&self, name: &str) -> bool {
        !self.has_child(name)
    }

    pub fn range(&self) -> Option<&'a Range> {
        self.0.map(|b| b.range())
    }
}

#[cfg(test)]
mod tests {
    use crate::loader::load_source;

    #[test]
    fn navigation_misses_are_total() {
        let blocks = load_source(
            r#"
resource "aws_s3_bucket" "logs" {
    acl = "private"
}
"#,
        )
        .unwrap();
        let bucket = &blocks[0];

        assert!(bucket.get_attribute("versioning").is_none());
        assert!(bucket.missing_child("versioning"));
        assert!(!bucket.has_child("versioning"));

        // Chained navigation through absent blocks never panics.
        let attr = bucket
            .get_block("lifecycle_rule")
            .get_block("expiration")
            .get_attribute("days");
        assert!(attr.is_none());
        assert!(bucket.get_block("lifecycle_rule").missing_child("days"));
    }

    #[test]
    fn labels_and_full_name() {
        let blocks = load_source(
            r#"
resource "aws_s3_bucket" "logs" {
    acl = "private"
}
"#,
        )
        .unwrap();
        let bucket = &blocks[0];
        assert_eq!(bucket.kind(), "resource");
        assert_eq!(bucket.type_label(), Some("aws_s3_bucket"));
        assert_eq!(bucket.instance_labels(), &["logs".to_string()]);
        assert_eq!(bucket.full_name(), "resource.aws_s3_bucket.logs");
    }

    #[test]
    fn nested_blocks_preserve_order() {
        let blocks = load_source(
            r#"
resource "aws_security_group" "web" {
    ingress {
        from_port = 80
    }
    ingress {
        from_port = 443
    }
}
"#,
        )
        .unwrap();
        let group = &blocks[0];
        let ingress = group.get_blocks("ingress");
        assert_eq!(ingress.len(), 2);
        assert!(ingress[0].get_attribute("from_port").unwrap().equals(80i64));
        assert!(ingress[1].get_attribute("from_port").unwrap().equals(443i64));
        assert!(group.get_block("ingress").is_present());
        assert!(group.has_child("ingress"));
    }
}
