//! Pipeline front end.
//!
//! `run` takes the raw judged-scoring table and writes the two derived
//! tables (cleaned wide, normalized long) into an intermediate directory.
//! `views` reads a derived long table back, applies a dimension selection
//! and writes the filtered rows and statistics for the dashboard.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tourney_stats_rust::{compute_stats, DimensionSelection, StatViews, TournamentData};

#[derive(Parser, Debug)]
#[command(
    name = "run_pipeline",
    version,
    about = "Tournament judged-scoring analytics pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate, clean, reshape and normalize a raw scoring table
    Run(RunArgs),
    /// Compute filtered row and statistics views from a derived long table
    Views(ViewsArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Raw judged-scoring table (.csv or .parquet)
    #[arg(long)]
    input: PathBuf,

    /// Directory the derived tables are written to (swept before writing)
    #[arg(long, default_value = "data/intermediate")]
    out_dir: PathBuf,

    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct ViewsArgs {
    /// Derived long table written by `run`
    #[arg(long)]
    long: PathBuf,

    /// JSON dimension selection; omitted means unrestricted
    #[arg(long)]
    selection: Option<PathBuf>,

    /// Output path for the statistics views (JSON)
    #[arg(long, default_value = "data/result/views.json")]
    out: PathBuf,

    /// Optional output path for the filtered rows (CSV)
    #[arg(long)]
    rows_out: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "pipeline failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_pipeline(args),
        Commands::Views(args) => run_views(args),
    }
}

fn run_pipeline(args: RunArgs) -> Result<()> {
    let raw = TournamentData::read_table(&args.input)?;
    let data = TournamentData::from_raw(&raw)?;

    prepare_out_dir(&args.out_dir)?;
    let extension = args.format.extension();

    let cleaned_path = args.out_dir.join(format!("notes_cleaned.{extension}"));
    let mut cleaned = data.cleaned.clone();
    TournamentData::write_table(&mut cleaned, &cleaned_path)?;

    let long_path = args.out_dir.join(format!("notes_long.{extension}"));
    let mut long = data.long.clone();
    TournamentData::write_table(&mut long, &long_path)?;

    info!(
        cleaned = %cleaned_path.display(),
        long = %long_path.display(),
        "derived tables written"
    );
    Ok(())
}

fn run_views(args: ViewsArgs) -> Result<()> {
    let long = TournamentData::read_table(&args.long)?;
    let selection = load_selection(args.selection.as_deref())?;

    let mut rows = selection.apply(&long)?;
    let stats = compute_stats(&rows)?;
    info!(rows = rows.height(), "computed views for selection");

    if let Some(parent) = args.out.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    write_stats(&stats, &args.out)?;

    if let Some(rows_path) = args.rows_out {
        TournamentData::write_table(&mut rows, &rows_path)?;
    }
    Ok(())
}

fn load_selection(path: Option<&Path>) -> Result<DimensionSelection> {
    let Some(path) = path else {
        return Ok(DimensionSelection::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read selection file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse selection JSON: {}", path.display()))
}

fn write_stats(stats: &StatViews, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(stats).context("failed to serialize views")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Create the output directory if needed and sweep files left by a previous
/// run.
fn prepare_out_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            fs::remove_file(entry.path())
                .with_context(|| format!("failed to remove stale file {}", entry.path().display()))?;
        }
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
