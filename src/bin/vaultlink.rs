//! vaultlink CLI: turn note-title mentions into wiki-links across a vault.
//!
//! Usage:
//!   vaultlink <vault> [--dry-run] [--jobs N] [--config file.yaml] [--json]

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vaultlink::{
    discover_notes, BatchCoordinator, BatchReport, ConfigError, DocumentId, FsStore, LinkerConfig,
};

/// Some documents failed, or the run was interrupted
const EXIT_PARTIAL: i32 = 2;

#[derive(Parser)]
#[command(
    name = "vaultlink",
    version,
    about = "Insert [[wiki-links]] wherever a note mentions another note's title"
)]
struct Cli {
    /// Vault root directory
    vault: PathBuf,

    /// YAML config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Maximum notes processed at once
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Note extension to include (repeatable, replaces the configured list)
    #[arg(long = "extension", value_name = "EXT")]
    extensions: Vec<String>,

    /// Match note extensions case-insensitively (`Note.MD`)
    #[arg(long)]
    ignore_extension_case: bool,

    /// Descend into dot-directories such as .obsidian
    #[arg(long)]
    include_hidden: bool,

    /// Don't link a note's own title inside it
    #[arg(long)]
    skip_self_links: bool,

    /// Ignore titles shorter than this many characters
    #[arg(long, value_name = "CHARS")]
    min_title_length: Option<usize>,

    /// Write notes in place instead of via temp file and rename
    #[arg(long)]
    no_atomic_writes: bool,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn build_config(cli: &Cli) -> Result<LinkerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => LinkerConfig::from_yaml_file(path)?,
        None => LinkerConfig::new(),
    };

    if !cli.extensions.is_empty() {
        config = config.with_extensions(cli.extensions.iter().cloned());
    }
    if let Some(jobs) = cli.jobs {
        config = config.with_concurrency(jobs);
    }
    if let Some(min) = cli.min_title_length {
        config = config.with_min_title_length(min);
    }
    if cli.dry_run {
        config = config.with_dry_run(true);
    }
    if cli.ignore_extension_case {
        config = config.with_case_sensitive_extensions(false);
    }
    if cli.include_hidden {
        config = config.with_hidden(true);
    }
    if cli.skip_self_links {
        config = config.with_skip_self_links(true);
    }
    if cli.no_atomic_writes {
        config = config.with_atomic_writes(false);
    }

    config.validate()?;
    Ok(config)
}

fn display_path<'a>(vault: &Path, id: &'a DocumentId) -> std::path::Display<'a> {
    id.as_path()
        .strip_prefix(vault)
        .unwrap_or(id.as_path())
        .display()
}

fn print_report(vault: &Path, report: &BatchReport) {
    let verb = if report.dry_run { "Would edit" } else { "Edited" };
    println!("{} {} files.", verb, report.edited_count());
    if !report.edited.is_empty() {
        println!("Modified files:");
        for id in &report.edited {
            println!("{}", display_path(vault, id));
        }
    }

    if report.has_failures() {
        eprintln!("Failed files:");
        for failure in &report.failures {
            eprintln!(
                "{} ({:?}, {}): {}",
                display_path(vault, &failure.id),
                failure.stage,
                failure.kind,
                failure.message
            );
        }
    }
    if report.was_cancelled() {
        eprintln!("Interrupted: {} files not processed", report.not_dispatched);
    }

    println!("\nSummary:");
    println!("Total markdown files found: {}", report.found);
    println!("Total files edited: {}", report.edited_count());
    println!("Total links inserted: {}", report.links_inserted);
}

async fn run(cli: Cli) -> i32 {
    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let notes = match discover_notes(&cli.vault, &config) {
        Ok(notes) => notes,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if !cli.json {
        println!("Found {} markdown files.", notes.len());
    }

    let store = Arc::new(FsStore::new().with_atomic_writes(config.atomic_writes));
    let coordinator = BatchCoordinator::new(store, config);

    let token = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing notes already in progress");
            token.cancel();
        }
    });

    let report = match coordinator.run(notes).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: failed to serialize report: {}", e);
                return 1;
            }
        }
    } else {
        print_report(&cli.vault, &report);
    }

    if report.has_failures() || report.was_cancelled() {
        EXIT_PARTIAL
    } else {
        0
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };
    let code = runtime.block_on(run(cli));
    std::process::exit(code);
}
