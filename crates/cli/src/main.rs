//! revdiff command-line tool.
//!
//! Loads a directory of revision JSON files into an in-memory version store
//! and provides subcommands for comparing revisions, reconciling a
//! comparison into a new revision, viewing lineage, and generating /
//! validating configuration files.

mod compare;
mod reconcile;
mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use revdiff_core::config::AppConfig;
use revdiff_core::models::Revision;
use revdiff_core::reconcile::Decision;
use revdiff_core::store::{InMemoryVersionStore, VersionStore};
use revdiff_core::VersionService;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// revdiff command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "revdiff",
    version,
    about = "Compare revisions, classify their changes and reconcile them selectively"
)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory of revision JSON files.
    #[arg(short, long, global = true, default_value = "./revisions")]
    revisions: PathBuf,

    /// Log level (overrides the config file and RUST_LOG).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare two revisions.
    Compare {
        /// Base revision id.
        from: String,
        /// Target revision id.
        to: String,

        /// Print the comparison as JSON.
        #[arg(long)]
        json: bool,

        /// Also print a unified patch of every changed section.
        #[arg(long)]
        patch: bool,
    },

    /// Accept or reject hunks of a comparison and build a candidate revision.
    Reconcile {
        /// Base revision id.
        from: String,
        /// Target revision id.
        to: String,

        /// Hunk ids to accept (repeatable).
        #[arg(long, value_delimiter = ',')]
        accept: Vec<String>,

        /// Hunk ids to reject (repeatable).
        #[arg(long, value_delimiter = ',')]
        reject: Vec<String>,

        /// Decision for hunks not listed (overrides the config file).
        #[arg(long, value_enum)]
        default: Option<DecisionArg>,

        /// Persist the candidate into the revisions directory.
        #[arg(long)]
        save: bool,

        /// Version for the saved revision (default: parent's patch + 1).
        #[arg(long, requires = "save")]
        version: Option<String>,

        /// Author recorded on the saved revision (default: parent's author).
        #[arg(long)]
        author: Option<String>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the lineage of a revision, newest first.
    Log {
        /// Revision id.
        id: String,
    },

    /// List every stored revision.
    List,

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./revdiff.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum DecisionArg {
    Accept,
    Reject,
}

impl From<DecisionArg> for Decision {
    fn from(arg: DecisionArg) -> Self {
        match arg {
            DecisionArg::Accept => Decision::Accept,
            DecisionArg::Reject => Decision::Reject,
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        config,
        revisions,
        log_level,
        command,
    } = cli;
    let log_level = log_level.as_deref();

    match command {
        Commands::Init { output } => {
            init_logging(log_level, None);
            cmd_init(&output)
        }
        Commands::Validate => {
            init_logging(log_level, None);
            let path = config.unwrap_or_else(|| PathBuf::from("./revdiff.toml"));
            cmd_validate(&path)
        }
        Commands::Compare {
            from,
            to,
            json,
            patch,
        } => {
            let service = open_service(config.as_deref(), &revisions, log_level, None)?;
            compare::run_compare(&service, &from, &to, json, patch).await
        }
        Commands::Reconcile {
            from,
            to,
            accept,
            reject,
            default,
            save,
            version,
            author,
            json,
        } => {
            let service = open_service(config.as_deref(), &revisions, log_level, default)?;
            let args = reconcile::ReconcileArgs {
                from,
                to,
                accept,
                reject,
                json,
                save,
                version,
                author,
            };
            reconcile::run_reconcile(&service, &revisions, args).await
        }
        Commands::Log { id } => {
            let service = open_service(config.as_deref(), &revisions, log_level, None)?;
            cmd_log(service.store(), &id)
        }
        Commands::List => {
            let service = open_service(config.as_deref(), &revisions, log_level, None)?;
            cmd_list(service.store()).await
        }
    }
}

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

/// Install the tracing subscriber. Precedence: `--log-level`, then
/// `RUST_LOG`, then the config file, then `warn`.
fn init_logging(flag: Option<&str>, config_level: Option<&str>) {
    let filter = match flag {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config_level.unwrap_or("warn"))),
    };
    // Keeps the first subscriber if one is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load configuration, install logging and build a service over the
/// revisions directory. `default` overrides the configured default decision.
fn open_service(
    config_path: Option<&Path>,
    revisions: &Path,
    log_level: Option<&str>,
    default: Option<DecisionArg>,
) -> Result<VersionService<InMemoryVersionStore>> {
    let mut config = load_config(config_path)?;
    init_logging(log_level, Some(&config.logging.level));
    if let Some(d) = default {
        config.reconcile.default_decision = d.into();
    }

    let store = load_store(revisions)?;
    VersionService::new(Arc::new(store), &config).context("invalid classifier configuration")
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            AppConfig::load_and_validate(path).context("failed to load configuration file")
        }
        None => Ok(AppConfig::default()),
    }
}

/// Read every `*.json` file in `dir` as a revision and insert them into a
/// fresh store, parents before children.
fn load_store(dir: &Path) -> Result<InMemoryVersionStore> {
    let mut revisions = read_revisions(dir)?;
    // Versions strictly increase along a lineage, so version order puts
    // every parent ahead of its children.
    revisions.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.id.cmp(&b.id)));

    let store = InMemoryVersionStore::new();
    for rev in revisions {
        let id = rev.id.clone();
        store
            .insert(rev)
            .with_context(|| format!("failed to load revision {}", id))?;
    }
    debug!(count = store.len(), dir = %dir.display(), "revisions loaded");
    Ok(store)
}

fn read_revisions(dir: &Path) -> Result<Vec<Revision>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read revisions directory {}", dir.display()))?;

    let mut revisions = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let body = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let rev: Revision = serde_json::from_str(&body)
            .with_context(|| format!("failed to parse revision {}", path.display()))?;
        revisions.push(rev);
    }
    Ok(revisions)
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_log(store: &InMemoryVersionStore, id: &str) -> Result<()> {
    let lineage = store
        .lineage(id)
        .with_context(|| format!("failed to resolve lineage of {}", id))?;

    println!();
    println!("{}", style::header(&format!("Lineage of {}", id)));
    println!();
    print_revisions(&lineage);
    Ok(())
}

async fn cmd_list(store: &InMemoryVersionStore) -> Result<()> {
    let all = store
        .list_revisions()
        .await
        .context("failed to list revisions")?;
    if all.is_empty() {
        println!("No revisions found.");
        return Ok(());
    }
    println!();
    print_revisions(&all);
    println!("{} revision(s)", all.len());
    Ok(())
}

fn print_revisions(revisions: &[Arc<Revision>]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Version", "Status", "Author", "Parent", "Created", "Sections"]);

    for rev in revisions {
        let sections: Vec<&str> = rev.sections.keys().map(|k| k.as_str()).collect();
        table.add_row(vec![
            Cell::new(&rev.id),
            Cell::new(rev.version.to_string()),
            Cell::new(rev.status.to_string()),
            Cell::new(&rev.author_id),
            Cell::new(rev.parent_id.as_deref().unwrap_or("—")),
            Cell::new(
                rev.created_at
                    .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            ),
            Cell::new(sections.join(", ")),
        ]);
    }

    println!("{}", table);
    println!();
}

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# revdiff configuration
# Every setting is optional; the values below are the defaults.

[diff]
# Unchanged lines allowed between a removal and an addition for the two to
# be reported as one "modified" hunk.
coalesce_gap = 0

[classifier]
# Hunks spanning more lines than this are high severity.
large_hunk_threshold = 20
# Sections checked for removed public symbols.
code_sections = ["logic"]
# Extra regexes whose first capture group is a public symbol name.
extra_public_patterns = []

[reconcile]
# Decision applied to hunks without an explicit accept / reject.
default_decision = "accept"

[cache]
enabled = true
max_entries = 256

[logging]
level = "warn"
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!("{}", style::success(&format!("Default configuration written to {}", output.display())));
    println!();
    println!("Next steps:");
    println!("  1. Adjust the classifier heuristics for your sections");
    println!("  2. Validate with: revdiff validate --config {}", output.display());

    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let config = AppConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    match config.validate() {
        Ok(()) => {
            println!("  [OK] All values are valid");
        }
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    let code_sections: Vec<&str> = config
        .classifier
        .code_sections
        .iter()
        .map(|s| s.as_str())
        .collect();

    println!();
    println!("Configuration summary:");
    println!("  Coalesce gap      : {}", config.diff.coalesce_gap);
    println!("  Large hunk lines  : {}", config.classifier.large_hunk_threshold);
    println!("  Code sections     : {}", code_sections.join(", "));
    println!(
        "  Extra patterns    : {}",
        config.classifier.extra_public_patterns.len()
    );
    println!("  Default decision  : {}", config.reconcile.default_decision);
    println!(
        "  Cache             : {}",
        if config.cache.enabled {
            format!("enabled ({} entries)", config.cache.max_entries)
        } else {
            "disabled".to_string()
        }
    );
    println!("  Log level         : {}", config.logging.level);
    println!();
    println!("Configuration is valid.");

    Ok(())
}
