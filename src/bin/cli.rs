use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use terraguard::config::Config;
use terraguard::output::OutputFormat;
use terraguard::rules::Registry;
use terraguard::ScanOptions;

#[derive(Parser)]
#[command(
    name = "terraguard",
    about = "Static-analysis security scanner for Terraform-style infrastructure code",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a configuration directory for security issues
    Scan {
        /// Path to the configuration directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (console, json)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Abort on the first syntax error instead of skipping the file
        #[arg(long)]
        strict: bool,

        /// Include explicit passed records for clean checks
        #[arg(long)]
        include_passed: bool,

        /// Show excluded results, marked ignored, instead of dropping them
        #[arg(long)]
        show_ignored: bool,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List all registered rules
    ListRules {
        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .terraguard.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan {
            path,
            config,
            format,
            strict,
            include_passed,
            show_ignored,
            output,
        } => cmd_scan(path, config, format, strict, include_passed, show_ignored, output),
        Commands::ListRules { format } => cmd_list_rules(format),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_scan(
    path: PathBuf,
    config: Option<PathBuf>,
    format_str: String,
    strict: bool,
    include_passed: bool,
    show_ignored: bool,
    output_path: Option<PathBuf>,
) -> Result<i32, terraguard::error::GuardError> {
    let format = OutputFormat::from_str_lenient(&format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    });

    let options = ScanOptions {
        config_path: config,
        strict,
        include_passed,
        show_ignored,
        cancel: None,
    };

    let report = terraguard::scan(&path, &options)?;
    let rendered = terraguard::render_report(&report, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    for fault in &report.faults {
        eprintln!(
            "Warning: rule {} faulted on {}: {}",
            fault.rule_id, fault.block, fault.message
        );
    }

    // Exit code: 0 = pass, 1 = failed findings
    Ok(if report.passed() { 0 } else { 1 })
}

fn cmd_list_rules(format_str: String) -> Result<i32, terraguard::error::GuardError> {
    let registry = Registry::with_builtin()?;
    let rules: Vec<_> = registry.rules().map(|r| r.metadata()).collect();

    match format_str.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&rules)?;
            println!("{}", json);
        }
        _ => {
            println!("{:<10} {:<10} SUMMARY", "ID", "PROVIDER");
            println!("{}", "-".repeat(72));
            for rule in &rules {
                println!("{:<10} {:<10} {}", rule.id, rule.provider.to_string(), rule.summary);
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, terraguard::error::GuardError> {
    let path = PathBuf::from(".terraguard.toml");

    if path.exists() && !force {
        eprintln!(".terraguard.toml already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created .terraguard.toml");

    Ok(0)
}
