use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use crafting_graph::{Catalog, ValidationPolicy, ValidationReport};
use crafting_search::{RawSearchConfig, SearchConfig, Solver};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::flags::{
    BottomUpFlag, ExecutionFlag, ModeFlag, PolicyFlag, StrategyFlag, TraversalFlag,
};

mod flags;

#[derive(Parser)]
#[command(name = "crafting")]
#[command(about = "Explain how an item is crafted from base elements", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Catalog file: JSON array of {name, tier, recipes}
    #[arg(long, global = true, default_value = "data/recipes.json")]
    catalog: PathBuf,

    /// Search config file (JSON, same keys as the flags below)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Malformed recipes: keep and skip during search, or drop at load
    #[arg(long, global = true, value_enum, default_value = "warn")]
    policy: PolicyFlag,
}

#[derive(Subcommand)]
enum Commands {
    /// Search and print the crafting tree as JSON
    Solve(SolveArgs),

    /// Search and print a snapshot per expanded item (SSE framing)
    Stream(StreamArgs),

    /// Load the catalog and print its validation report
    Validate(ValidateArgs),
}

#[derive(Args)]
struct SearchArgs {
    /// Item to explain
    target: String,

    /// Recipe quota; 1 keeps a single recipe per item
    #[arg(long, short = 'q', allow_negative_numbers = true)]
    quota: Option<i64>,

    /// Search direction
    #[arg(long, value_enum)]
    mode: Option<ModeFlag>,

    /// Top-down recipe strategy
    #[arg(long, value_enum)]
    strategy: Option<StrategyFlag>,

    /// Top-down visiting order
    #[arg(long, value_enum)]
    traversal: Option<TraversalFlag>,

    /// Top-down execution
    #[arg(long, value_enum)]
    execution: Option<ExecutionFlag>,

    /// Bottom-up strategy (bidirectional mode)
    #[arg(long, value_enum)]
    bottom_up: Option<BottomUpFlag>,

    /// Concurrent top-down expansions (default: quota - 1, at most 32)
    #[arg(long)]
    max_in_flight: Option<usize>,
}

impl SearchArgs {
    fn overrides(&self) -> RawSearchConfig {
        RawSearchConfig {
            recipe_limit: self.quota,
            mode: self.mode.map(ModeFlag::as_domain),
            strategy: self.strategy.map(StrategyFlag::as_domain),
            traversal: self.traversal.map(TraversalFlag::as_domain),
            execution: self.execution.map(ExecutionFlag::as_domain),
            bottom_up: self.bottom_up.map(BottomUpFlag::as_domain),
            max_in_flight: self.max_in_flight,
            ..RawSearchConfig::default()
        }
    }
}

#[derive(Args)]
struct SolveArgs {
    #[command(flatten)]
    search: SearchArgs,

    /// Single-line JSON output
    #[arg(long)]
    compact: bool,
}

#[derive(Args)]
struct StreamArgs {
    #[command(flatten)]
    search: SearchArgs,

    /// Pause before each intermediate snapshot
    #[arg(long)]
    delay_ms: Option<u64>,
}

#[derive(Args)]
struct ValidateArgs {
    /// Exit with an error when the report is not clean
    #[arg(long)]
    strict: bool,
}

#[derive(Serialize)]
struct CatalogSummary<'a> {
    items: usize,
    recipes: usize,
    base_items: usize,
    max_tier: u32,
    clean: bool,
    report: &'a ValidationReport,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let policy = cli.policy.as_domain();
    match cli.command {
        Commands::Solve(args) => {
            run_solve(&cli.catalog, cli.config.as_deref(), policy, args).await?
        }
        Commands::Stream(args) => {
            run_stream(&cli.catalog, cli.config.as_deref(), policy, args).await?
        }
        Commands::Validate(args) => run_validate(&cli.catalog, policy, args)?,
    }

    Ok(())
}

fn load_catalog(path: &Path, policy: ValidationPolicy) -> Result<Arc<Catalog>> {
    let catalog = Catalog::from_path_with(path, policy)
        .with_context(|| format!("Failed to load catalog {}", path.display()))?;
    Ok(Arc::new(catalog))
}

/// Defaults, then the config file, then environment, then flags
fn load_config(path: Option<&Path>, overrides: RawSearchConfig) -> Result<SearchConfig> {
    let mut config = match path {
        Some(path) => SearchConfig::from_file(path).context("Invalid search config")?,
        None => SearchConfig::default(),
    };
    config.apply_env();
    config.apply(overrides).context("Invalid search options")?;
    Ok(config)
}

async fn run_solve(
    catalog: &Path,
    config: Option<&Path>,
    policy: ValidationPolicy,
    args: SolveArgs,
) -> Result<()> {
    let config = load_config(config, args.search.overrides())?;
    let solver = Solver::new(load_catalog(catalog, policy)?);

    let solution = solver.solve(&args.search.target, &config).await?;

    let output = if args.compact {
        serde_json::to_string(&solution)?
    } else {
        serde_json::to_string_pretty(&solution)?
    };
    println!("{output}");
    Ok(())
}

async fn run_stream(
    catalog: &Path,
    config: Option<&Path>,
    policy: ValidationPolicy,
    args: StreamArgs,
) -> Result<()> {
    let mut overrides = args.search.overrides();
    overrides.snapshot_delay_ms = args.delay_ms;
    let config = load_config(config, overrides)?;
    let solver = Solver::new(load_catalog(catalog, policy)?);

    let mut snapshots = solver.stream(&args.search.target, &config)?;
    while let Some(snapshot) = snapshots.recv().await {
        let payload = serde_json::to_string(&snapshot)?;
        let mut out = io::stdout().lock();
        write!(out, "data: {payload}\n\n")?;
        out.flush()?;
    }
    Ok(())
}

fn run_validate(catalog: &Path, policy: ValidationPolicy, args: ValidateArgs) -> Result<()> {
    let catalog = load_catalog(catalog, policy)?;
    let report = catalog.validation();

    let summary = CatalogSummary {
        items: catalog.item_count(),
        recipes: catalog.recipe_count(),
        base_items: catalog.base_items().len(),
        max_tier: catalog.max_tier(),
        clean: report.is_clean(),
        report,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if args.strict && !report.is_clean() {
        anyhow::bail!("Catalog validation found problems");
    }
    Ok(())
}
