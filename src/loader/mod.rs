//! Discovery and parsing of configuration directories.
//!
//! A module is one directory of `.tf`/`.hcl` files, parsed in lexical file
//! order. Each `module` block whose `source` points at a local directory is
//! loaded recursively with the caller's resolved input bindings, producing
//! one flattened, stable-ordered block sequence for the whole tree.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hcl_edit::Span;
use walkdir::WalkDir;

use crate::cancel::CancelToken;
use crate::error::{GuardError, Result};
use crate::model::{Attribute, Block, Range, Value};
use crate::resolve::{Context, RawAttr, RawBlock};

/// Module recursion ceiling; deeper trees are almost certainly cyclic
/// through a path the directory-visitation set cannot see (symlinks).
const MAX_MODULE_DEPTH: usize = 16;

/// Module call meta-arguments that are not input bindings.
const MODULE_META_ARGS: &[&str] = &["source", "version", "providers", "count", "for_each", "depends_on"];

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Strict mode: abort the whole load on the first syntax error.
    /// Lenient mode (default) skips the offending file with a warning.
    pub stop_on_parse_error: bool,
    pub cancel: Option<CancelToken>,
}

#[derive(Debug, Default)]
pub struct Loader {
    options: LoadOptions,
}

impl Loader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    /// Load the directory tree rooted at `root` into a flattened, ordered
    /// block sequence: root module blocks in file order, each child
    /// module's subtree appended in call-site order.
    pub fn load_directory(&self, root: &Path) -> Result<Vec<Block>> {
        let mut visited = HashSet::new();
        if let Ok(canonical) = root.canonicalize() {
            visited.insert(canonical);
        }
        let (_, blocks) = self.load_module(root, None, HashMap::new(), 0, &visited)?;
        Ok(blocks)
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.options.cancel {
            Some(token) if token.is_cancelled() => Err(GuardError::Cancelled),
            _ => Ok(()),
        }
    }

    fn load_module(
        &self,
        dir: &Path,
        module_path: Option<String>,
        inputs: HashMap<String, Value>,
        depth: usize,
        visited_dirs: &HashSet<PathBuf>,
    ) -> Result<(Arc<Context>, Vec<Block>)> {
        let mut raw_blocks = Vec::new();
        for file in discover_files(dir)? {
            self.check_cancelled()?;
            let content = std::fs::read_to_string(&file)?;
            match parse_file(&file, &content) {
                Ok(blocks) => raw_blocks.extend(blocks),
                Err(message) => {
                    if self.options.stop_on_parse_error {
                        return Err(GuardError::Parse {
                            file: file.display().to_string(),
                            message,
                        });
                    }
                    tracing::warn!(
                        file = %file.display(),
                        error = %message,
                        "skipping file with syntax errors"
                    );
                }
            }
        }

        let mut ctx = Context::new(module_path.clone(), raw_blocks, inputs);
        let mut child_blocks = Vec::new();

        let module_calls: Vec<RawBlock> = ctx
            .raw_blocks()
            .iter()
            .filter(|b| b.kind == "module" && b.labels.len() == 1)
            .cloned()
            .collect();

        for call in module_calls {
            self.check_cancelled()?;
            let name = call.labels[0].clone();
            let Some(source) = call
                .attrs
                .iter()
                .find(|a| a.name == "source")
                .map(|a| ctx.resolve(&a.expr))
                .and_then(|v| v.as_str().map(str::to_string))
            else {
                tracing::warn!(module = %name, "module call without a resolvable source");
                continue;
            };

            let child_dir = dir.join(&source);
            let Ok(canonical) = child_dir.canonicalize() else {
                // Registry or remote sources have no local directory to scan.
                tracing::warn!(module = %name, source = %source, "skipping non-local module source");
                continue;
            };
            if visited_dirs.contains(&canonical) {
                tracing::warn!(module = %name, "skipping cyclic module reference");
                continue;
            }
            if depth >= MAX_MODULE_DEPTH {
                tracing::warn!(module = %name, "module nesting too deep, skipping");
                continue;
            }

            let bindings: HashMap<String, Value> = call
                .attrs
                .iter()
                .filter(|a| !MODULE_META_ARGS.contains(&a.name.as_str()))
                .map(|a| (a.name.clone(), ctx.resolve(&a.expr)))
                .collect();

            let child_path = match &module_path {
                Some(parent) => format!("{}.module.{}", parent, name),
                None => format!("module.{}", name),
            };

            let mut child_visited = visited_dirs.clone();
            child_visited.insert(canonical.clone());
            let (child_ctx, blocks) =
                self.load_module(&canonical, Some(child_path), bindings, depth + 1, &child_visited)?;
            ctx.attach_child(name, child_ctx);
            child_blocks.extend(blocks);
        }

        let ctx = Arc::new(ctx);
        let mut blocks: Vec<Block> = ctx
            .raw_blocks()
            .iter()
            .map(|raw| materialize(raw, &ctx, &module_path))
            .collect();
        blocks.extend(child_blocks);
        Ok((ctx, blocks))
    }
}

/// Parse a single in-memory source as one root module. No module recursion
/// is performed; intended for tests and embedding.
pub fn load_source(source: &str) -> Result<Vec<Block>> {
    let raw = parse_file(Path::new("main.tf"), source).map_err(|message| GuardError::Parse {
        file: "main.tf".to_string(),
        message,
    })?;
    let ctx = Arc::new(Context::new(None, raw, HashMap::new()));
    Ok(ctx
        .raw_blocks()
        .iter()
        .map(|block| materialize(block, &ctx, &None))
        .collect())
}

/// Configuration files directly in the module directory, lexically sorted.
/// Not recursive: nested directories are only reached via module calls.
fn discover_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(GuardError::Config(format!(
            "not a directory: {}",
            dir.display()
        )));
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("tf") | Some("hcl")
            )
        })
        .collect();
    files.sort();
    Ok(files)
}

fn parse_file(path: &Path, content: &str) -> std::result::Result<Vec<RawBlock>, String> {
    let body = hcl_edit::parser::parse_body(content).map_err(|e| e.to_string())?;
    let lines = LineIndex::new(content);
    Ok(body
        .blocks()
        .map(|block| convert_block(block, path, &lines))
        .collect())
}

fn convert_block(
    block: &hcl_edit::structure::Block,
    path: &Path,
    lines: &LineIndex,
) -> RawBlock {
    let labels = block
        .labels
        .iter()
        .map(|label| match label {
            hcl_edit::structure::BlockLabel::String(s) => s.value().clone(),
            hcl_edit::structure::BlockLabel::Ident(ident) => ident.value().as_str().to_string(),
        })
        .collect();

    let attrs = block
        .body
        .attributes()
        .map(|attr| RawAttr {
            name: attr.key.value().as_str().to_string(),
            expr: attr.value.clone(),
            range: lines.range(path, attr.span()),
        })
        .collect();

    let children = block
        .body
        .blocks()
        .map(|child| convert_block(child, path, lines))
        .collect();

    RawBlock {
        kind: block.ident.value().as_str().to_string(),
        labels,
        attrs,
        children,
        range: lines.range(path, block.span()),
    }
}

fn materialize(raw: &RawBlock, ctx: &Arc<Context>, module_path: &Option<String>) -> Block {
    let attributes = raw
        .attrs
        .iter()
        .map(|attr| {
            Attribute::new(
                attr.name.clone(),
                ctx.resolve(&attr.expr),
                attr.expr.to_string().trim().to_string(),
                attr.range.clone(),
            )
        })
        .collect();
    let children = raw
        .children
        .iter()
        .map(|child| materialize(child, ctx, module_path))
        .collect();
    Block::new(
        raw.kind.clone(),
        raw.labels.first().cloned(),
        raw.labels.get(1..).unwrap_or_default().to_vec(),
        attributes,
        children,
        raw.range.clone(),
        module_path.clone(),
        Arc::clone(ctx),
    )
}

/// Byte-offset to 1-based line translation for one file.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(content: &str) -> Self {
        let mut starts = vec![0];
        for (offset, byte) in content.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(offset + 1);
            }
        }
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }

    fn range(&self, path: &Path, span: Option<std::ops::Range<usize>>) -> Range {
        match span {
            Some(span) => Range::new(
                path,
                self.line_of(span.start),
                self.line_of(span.end.saturating_sub(1).max(span.start)),
            ),
            None => Range::new(path, 1, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::model::Value;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn loads_files_in_lexical_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.tf", "resource \"thing\" \"second\" {}\n");
        write(dir.path(), "a.tf", "resource \"thing\" \"first\" {}\n");
        write(dir.path(), "notes.txt", "not configuration\n");

        let blocks = Loader::default().load_directory(dir.path()).unwrap();
        let names: Vec<_> = blocks
            .iter()
            .map(|b| b.instance_labels()[0].clone())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn strict_mode_aborts_on_syntax_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "bad.tf", "resource \"thing\" {{{\n");

        let loader = Loader::new(LoadOptions {
            stop_on_parse_error: true,
            cancel: None,
        });
        let err = loader.load_directory(dir.path()).unwrap_err();
        assert!(matches!(err, GuardError::Parse { .. }));
    }

    #[test]
    fn lenient_mode_skips_bad_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "bad.tf", "resource \"thing\" {{{\n");
        write(dir.path(), "good.tf", "resource \"thing\" \"ok\" {}\n");

        let blocks = Loader::default().load_directory(dir.path()).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].instance_labels(), &["ok".to_string()]);
    }

    #[test]
    fn module_inputs_resolve_in_child() {
        let root = TempDir::new().unwrap();
        let child = root.path().join("child");
        fs::create_dir(&child).unwrap();
        write(
            root.path(),
            "main.tf",
            r#"
module "m" {
    source = "./child"
    enabled = true
}
"#,
        );
        write(
            &child,
            "main.tf",
            r#"
resource "thing" "inner" {
    enabled = var.enabled
}
"#,
        );

        let blocks = Loader::default().load_directory(root.path()).unwrap();
        let inner = blocks
            .iter()
            .find(|b| b.module_path() == Some("module.m"))
            .unwrap();
        assert_eq!(
            inner.get_attribute("enabled").unwrap().value(),
            &Value::Bool(true)
        );
        assert!(inner.get_attribute("enabled").unwrap().is_true());
        assert_eq!(inner.full_name(), "module.m:resource.thing.inner");
    }

    #[test]
    fn module_outputs_propagate_to_parent() {
        let root = TempDir::new().unwrap();
        let child = root.path().join("net");
        fs::create_dir(&child).unwrap();
        write(
            root.path(),
            "main.tf",
            r#"
module "net" {
    source = "./net"
}

resource "thing" "consumer" {
    vpc = module.net.vpc_id
}
"#,
        );
        write(
            &child,
            "main.tf",
            r#"
output "vpc_id" {
    value = "vpc-123"
}
"#,
        );

        let blocks = Loader::default().load_directory(root.path()).unwrap();
        let consumer = blocks
            .iter()
            .find(|b| b.kind() == "resource" && b.module_path().is_none())
            .unwrap();
        assert!(consumer.get_attribute("vpc").unwrap().equals("vpc-123"));
    }

    #[test]
    fn cyclic_module_references_are_skipped() {
        let root = TempDir::new().unwrap();
        write(
            root.path(),
            "main.tf",
            r#"
module "loop" {
    source = "./"
}

resource "thing" "a" {}
"#,
        );

        // Loads the root once; the self-referencing module call is skipped.
        let blocks = Loader::default().load_directory(root.path()).unwrap();
        assert_eq!(
            blocks.iter().filter(|b| b.kind() == "resource").count(),
            1
        );
    }

    #[test]
    fn cancellation_returns_error_not_partial_set() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.tf", "resource \"thing\" \"a\" {}\n");

        let token = CancelToken::new();
        token.cancel();
        let loader = Loader::new(LoadOptions {
            stop_on_parse_error: false,
            cancel: Some(token),
        });
        let err = loader.load_directory(dir.path()).unwrap_err();
        assert!(matches!(err, GuardError::Cancelled));
    }

    #[test]
    fn ranges_point_at_real_lines() {
        let blocks = load_source("resource \"thing\" \"a\" {\n    acl = \"private\"\n}\n").unwrap();
        let block = &blocks[0];
        assert_eq!(block.range().start_line, 1);
        assert_eq!(block.range().end_line, 3);
        let attr = block.get_attribute("acl").unwrap();
        assert_eq!(attr.range().start_line, 2);
        assert_eq!(attr.range().end_line, 2);
    }
}
