//! `slotsync` CLI — run full and delta syncs against a JSON state file.
//!
//! The state file holds recruiter rows, calendars, slots, cached snapshots
//! and the batch cursor (see `slot_sync::SyncState`). A run loads it into the
//! in-memory collaborators, drives one pass, writes the resulting state back
//! and prints the run report as JSON.
//!
//! ## Usage
//!
//! ```sh
//! # Nightly pass, clock taken from the system
//! slotsync full --state state.json
//!
//! # Delta pass at a fixed instant, with custom settings, new state elsewhere
//! slotsync delta --state state.json --settings settings.json \
//!     --now 2026-03-02T12:00:00Z --output next.json
//!
//! # Run the full pass outside quiet hours
//! slotsync full --state state.json --force
//!
//! # Compare two calendar snapshots
//! slotsync diff --cached before.json --current after.json
//! ```
//!
//! Logs go to stderr at `info`; `-v` for debug, `-vv` for trace. `RUST_LOG`
//! overrides both.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use slot_engine::{diff_snapshots, CalendarSnapshot};
use slot_sync::{
    DeltaSync, FullSync, MemoryBackend, RunOptions, RunStatus, SyncReport, SyncSettings, SyncState,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slotsync",
    version,
    about = "Reconcile interview slots with recruiter calendars"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the next batch of recruiters across all sync days
    Full(RunArgs),
    /// Act on calendar changes since the cached snapshots
    Delta(RunArgs),
    /// Show what changed between two calendar snapshots
    Diff {
        /// Snapshot from the previous pass
        #[arg(long)]
        cached: PathBuf,
        /// Snapshot of the calendar now
        #[arg(long)]
        current: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// State file to read (and update, unless --output is given)
    #[arg(long)]
    state: PathBuf,
    /// Settings file; defaults apply when omitted
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Clock reading for this run (RFC 3339); defaults to now
    #[arg(long)]
    now: Option<String>,
    /// Ignore the quiet-hours gate
    #[arg(long)]
    force: bool,
    /// Write the resulting state here instead of over --state
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Full(args) => {
            let report = run_pass(&args, |backend, settings, options| {
                FullSync::new(backend.services(), settings).run(options)
            })?;
            finish(&report)
        }
        Commands::Delta(args) => {
            let report = run_pass(&args, |backend, settings, options| {
                DeltaSync::new(backend.services(), settings).run(options)
            })?;
            finish(&report)
        }
        Commands::Diff { cached, current } => {
            let cached = read_snapshot(&cached)?;
            let current = read_snapshot(&current)?;
            let delta = diff_snapshots(&cached, &current).context("Failed to diff snapshots")?;
            println!("{}", serde_json::to_string_pretty(&delta)?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Load state and settings, run one pass, persist the state.
fn run_pass<F>(args: &RunArgs, pass: F) -> Result<SyncReport>
where
    F: FnOnce(&MemoryBackend, &SyncSettings, RunOptions) -> SyncReport,
{
    let state: SyncState = read_json(&args.state)?;
    let settings: SyncSettings = match &args.settings {
        Some(path) => read_json(path)?,
        None => SyncSettings::default(),
    };
    let tz = settings.validate().context("Invalid settings")?;
    let now = parse_now(args.now.as_deref())?;
    let options = RunOptions {
        now,
        force: args.force,
    };

    let backend = MemoryBackend::from_state(state, tz);
    let report = pass(&backend, &settings, options);

    let target = args.output.as_ref().unwrap_or(&args.state);
    let updated = serde_json::to_string_pretty(&backend.to_state())?;
    std::fs::write(target, updated)
        .with_context(|| format!("Failed to write state: {}", target.display()))?;
    info!(path = %target.display(), "state written");
    Ok(report)
}

/// Print the report; a failed run exits non-zero.
fn finish(report: &SyncReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    if let RunStatus::Failed(reason) = &report.status {
        eprintln!("Error: sync failed: {}", reason);
        process::exit(1);
    }
    Ok(())
}

fn parse_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("Invalid --now timestamp: {}", raw)),
        None => Ok(Utc::now()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse JSON: {}", path.display()))
}

fn read_snapshot(path: &Path) -> Result<CalendarSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    CalendarSnapshot::from_json(&raw)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
}
