// src/main.rs
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timesheet_core::{
    export, format_hours, format_signed_hours, parse_timesheet, run_analysis, AnalysisConfig,
    RawTimeEntry, ResultBundle, TimesheetError,
};

// --- Error Handling ---

#[derive(Error, Debug)]
enum AppError {
    #[error("Timesheet error: {0}")]
    Timesheet(#[from] TimesheetError),
    #[error("File I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON serialization/deserialization failed: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
}

// --- CLI Definition ---

#[derive(Parser)]
#[command(
    name = "timesheet-analyzer",
    version,
    about = "Analyze a captured attendance timesheet against a daily hours target"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Parse the timesheet, merge tracked time and report daily/weekly hours.
    Analyze(AnalyzeArgs),
    /// Print the attendance records found in a captured timesheet page as JSON.
    Parse {
        #[arg(value_name = "MARKUP_FILE")]
        markup_file: PathBuf,
    },
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// Saved HTML of the attendance grid.
    #[arg(value_name = "MARKUP_FILE")]
    markup_file: PathBuf,

    /// JSON array of tracked time entries (date, duration, description, projectName, taskName).
    #[arg(long, value_name = "JSON_FILE")]
    entries: Option<PathBuf>,

    /// Daily target in hours (overrides TIMESHEET_DAILY_TARGET_HOURS).
    #[arg(long, value_name = "HOURS")]
    target: Option<Decimal>,

    /// Skip malformed attendance rows instead of failing.
    #[arg(long)]
    skip_malformed: bool,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Also write daily.csv and weekly.csv into this directory.
    #[arg(long, value_name = "DIR")]
    csv_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

// --- Main ---

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Analyze(args) => run_analyze(&args),
        Command::Parse { markup_file } => run_parse(&markup_file),
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn read_markup(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read timesheet markup from {}", path.display()))
}

fn read_entries(path: &Path) -> anyhow::Result<Vec<RawTimeEntry>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read time entries from {}", path.display()))?;
    let entries: Vec<RawTimeEntry> = serde_json::from_str(&raw)
        .map_err(AppError::from)
        .with_context(|| format!("Invalid time entries JSON in {}", path.display()))?;
    info!("Loaded {} tracked time entries from {}", entries.len(), path.display());
    Ok(entries)
}

// --- Commands ---

fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<()> {
    let mut config = AnalysisConfig::from_env().map_err(AppError::from)?;
    if let Some(target) = args.target {
        config = config.with_daily_target(target).map_err(AppError::from)?;
    }
    if args.skip_malformed {
        config.skip_malformed_rows = true;
    }

    let markup = read_markup(&args.markup_file)?;
    let entries = args.entries.as_deref().map(read_entries).transpose()?;

    let (bundle, skipped) =
        run_analysis(&markup, entries.as_deref(), &config).map_err(AppError::from)?;
    if !skipped.is_empty() {
        warn!("Skipped {} malformed attendance rows", skipped.len());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => print_text(&mut out, &bundle)?,
        OutputFormat::Json => print_json(&mut out, &bundle)?,
    }

    if let Some(dir) = &args.csv_dir {
        write_csv(dir, &bundle)
            .with_context(|| format!("Failed to write CSV reports into {}", dir.display()))?;
    }
    Ok(())
}

fn run_parse(markup_file: &Path) -> anyhow::Result<()> {
    let markup = read_markup(markup_file)?;
    let records = parse_timesheet(&markup).map_err(AppError::from)?;
    info!("Parsed {} attendance records", records.len());
    let json = serde_json::to_string_pretty(&records).map_err(AppError::from)?;
    println!("{}", json);
    Ok(())
}

// --- Output ---

fn print_text<W: Write>(out: &mut W, bundle: &ResultBundle) -> Result<(), AppError> {
    if bundle.is_empty() {
        writeln!(out, "No workdays with recorded hours.")?;
        return Ok(());
    }

    writeln!(out, "Daily (target {})", format_hours(bundle.daily_target()))?;
    writeln!(
        out,
        "{:<10}  {:<9}  {:>5}  {:>5}  {:>10}  {:>11}  {:>10}  {:<6}",
        "Date", "Day", "In", "Out", "Hours", "Difference", "Tracked", "Target"
    )?;
    for day in bundle.daily() {
        let time = |t: Option<chrono::NaiveTime>| {
            t.map(|t| t.format("%H:%M").to_string()).unwrap_or_default()
        };
        writeln!(
            out,
            "{:<10}  {:<9}  {:>5}  {:>5}  {:>10}  {:>11}  {:>10}  {:<6}",
            day.date.format("%Y-%m-%d"),
            day.day_of_week,
            time(day.first_in),
            time(day.last_out),
            day.hours_formatted,
            day.difference_formatted,
            day.external_hours_formatted,
            if day.on_target { "yes" } else { "no" }
        )?;
    }

    if let Some(weekly) = bundle.weekly() {
        writeln!(out)?;
        writeln!(out, "Weekly")?;
        writeln!(
            out,
            "{:<8}  {:>4}  {:>6}  {:>11}  {:>11}  {:>11}  {:>10}",
            "Week", "Days", "OnTgt", "Hours", "Target", "Difference", "Avg/day"
        )?;
        for week in weekly {
            writeln!(
                out,
                "{:<8}  {:>4}  {:>6}  {:>11}  {:>11}  {:>11}  {:>10}",
                format!("{}-W{:02}", week.iso_year, week.week),
                week.work_days,
                week.on_target_percentage_formatted,
                week.hours_formatted,
                week.target_hours_formatted,
                week.weekly_difference_formatted,
                week.avg_daily_hours_formatted
            )?;
        }
    }

    let summary = bundle.summary();
    writeln!(out)?;
    writeln!(
        out,
        "Summary: {} work days, {} on target, {} worked of {} ({})",
        summary.work_days,
        summary.on_target_days,
        format_hours(summary.hours),
        format_hours(summary.target_hours),
        format_signed_hours(summary.difference)
    )?;
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    bundle: &'a ResultBundle,
    details: BTreeMap<String, String>,
}

fn print_json<W: Write>(out: &mut W, bundle: &ResultBundle) -> Result<(), AppError> {
    let report = JsonReport {
        bundle,
        details: bundle.detail_by_date(),
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

fn write_csv(dir: &Path, bundle: &ResultBundle) -> Result<(), AppError> {
    fs::create_dir_all(dir)?;
    export::write_daily_csv(File::create(dir.join("daily.csv"))?, bundle.daily())?;
    export::write_weekly_csv(
        File::create(dir.join("weekly.csv"))?,
        bundle.weekly().unwrap_or_default(),
    )?;
    info!("Wrote daily.csv and weekly.csv to {}", dir.display());
    Ok(())
}
