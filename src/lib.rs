//! terraguard — static-analysis security scanner for Terraform-style
//! infrastructure code.
//!
//! Parses a directory tree of HCL configuration into a block/attribute
//! model, resolves variables, locals and cross-module references, and runs
//! a registry of security rules against the result.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use terraguard::{scan, ScanOptions};
//!
//! let options = ScanOptions::default();
//! let report = scan(Path::new("./infrastructure"), &options).unwrap();
//! println!("Findings: {}", report.results.len());
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod output;
pub mod resolve;
pub mod rules;

use std::path::Path;

use cancel::CancelToken;
use config::Config;
use error::Result;
use loader::{LoadOptions, Loader};
use output::OutputFormat;
use rules::{CheckResult, Registry, RuleFault, Scanner, Status};

/// Options for a scan invocation.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Path to config file (defaults to `.terraguard.toml` in the scan dir).
    pub config_path: Option<std::path::PathBuf>,
    /// Abort on the first syntax error instead of skipping the file.
    pub strict: bool,
    /// Synthesize explicit passed records (overrides the config when set).
    pub include_passed: bool,
    /// Retain excluded results with ignored status.
    pub show_ignored: bool,
    pub cancel: Option<CancelToken>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            strict: false,
            include_passed: false,
            show_ignored: false,
            cancel: None,
        }
    }
}

/// Complete scan report.
#[derive(Debug)]
pub struct ScanReport {
    pub target_name: String,
    pub results: Vec<CheckResult>,
    pub faults: Vec<RuleFault>,
}

impl ScanReport {
    /// True when no result failed.
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.status != Status::Failed)
    }
}

/// Run a complete scan: load config, parse the tree, run all rules.
pub fn scan(path: &Path, options: &ScanOptions) -> Result<ScanReport> {
    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| path.join(".terraguard.toml"));
    let config = Config::load(&config_path)?;

    let mut policy = config.policy;
    if options.include_passed {
        policy.include_passed = true;
    }
    if options.show_ignored {
        policy.show_ignored = true;
    }

    let loader = Loader::new(LoadOptions {
        stop_on_parse_error: options.strict,
        cancel: options.cancel.clone(),
    });
    let blocks = loader.load_directory(path)?;

    let registry = Registry::with_builtin()?;
    let mut scanner = Scanner::new(&registry).with_policy(policy);
    if let Some(token) = &options.cancel {
        scanner = scanner.with_cancel(token.clone());
    }
    let outcome = scanner.scan(&blocks)?;

    let target_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(ScanReport {
        target_name,
        results: outcome.results,
        faults: outcome.faults,
    })
}

/// Render a scan report in the specified format.
pub fn render_report(report: &ScanReport, format: OutputFormat) -> Result<String> {
    output::render(&report.results, format)
}

#[cfg(test)]
mod integration_tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn clean_tree_yields_no_findings() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "main.tf",
            r#"
resource "aws_alb_listener" "web" {
    protocol = "HTTPS"
}
"#,
        );
        let report = scan(dir.path(), &ScanOptions::default()).unwrap();
        assert!(report.results.is_empty());
        assert!(report.passed());
    }

    #[test]
    fn http_listener_detected() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "main.tf",
            r#"
resource "aws_alb_listener" "web" {
    protocol = "HTTP"
}
"#,
        );
        let report = scan(dir.path(), &ScanOptions::default()).unwrap();
        assert!(report.results.iter().any(|r| r.rule_id == "AWS004"));
        assert!(!report.passed());
    }

    #[test]
    fn config_exclusions_apply() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "main.tf",
            r#"
resource "aws_alb_listener" "web" {
    protocol = "HTTP"
}
"#,
        );
        write(
            dir.path(),
            ".terraguard.toml",
            "[policy]\nexclude = [\"AWS004\"]\n",
        );
        let report = scan(dir.path(), &ScanOptions::default()).unwrap();
        assert!(report.results.is_empty());
        assert!(report.passed());
    }

    #[test]
    fn module_blocks_are_scanned_with_resolved_inputs() {
        let root = TempDir::new().unwrap();
        let child = root.path().join("storage");
        fs::create_dir(&child).unwrap();
        write(
            root.path(),
            "main.tf",
            r#"
module "storage" {
    source = "./storage"
    acl = "public-read"
}
"#,
        );
        write(
            &child,
            "main.tf",
            r#"
resource "aws_s3_bucket" "assets" {
    acl = var.acl
}
"#,
        );
        let report = scan(root.path(), &ScanOptions::default()).unwrap();
        let finding = report
            .results
            .iter()
            .find(|r| r.rule_id == "AWS001")
            .unwrap();
        assert!(finding.description.contains("module.storage:"));
    }
}
