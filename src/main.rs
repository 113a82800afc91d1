//! hapimerge command line
//!
//! Run with: hapimerge merge A.json B.json, or hapimerge resample A.json --interval 1min
//!
//! Inputs and outputs are HAPI JSON documents (info keys, `parameters` and
//! `data` in one object). Output goes to `-o` or stdout.
//!
//! Environment variables:
//! - HAPIMERGE_HOW: Join mode for merge (default: outer)
//! - HAPIMERGE_ROUND_TO_SEC: Round times to the nearest second (default: false)
//! - HAPIMERGE_FILL_NAN: Apply declared fill values after merge (default: false)
//! - HAPIMERGE_INTERVAL: Resample grid spacing
//! - HAPIMERGE_TOLERANCE: Resample snapping tolerance
//! - HAPIMERGE_LIMIT: Resample nearest-fill step limit
//! - RUST_LOG: Log filter (default: hapimerge=info)

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use hapimerge::data::{parse_time, RecordCollection};
use hapimerge::format::{read_document_from_path, write_document, write_document_to_path};
use hapimerge::merge::{merge, JoinMode, MergeOptions};
use hapimerge::metadata::Metadata;
use hapimerge::resample::{resample, Interval, ResampleOptions};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Merge and resample HAPI time-series data
#[derive(Parser)]
#[command(name = "hapimerge")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which timestamps survive a merge
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum HowArg {
    Left,
    Right,
    #[default]
    Outer,
    Inner,
}

impl From<HowArg> for JoinMode {
    fn from(arg: HowArg) -> Self {
        match arg {
            HowArg::Left => JoinMode::Left,
            HowArg::Right => JoinMode::Right,
            HowArg::Outer => JoinMode::Outer,
            HowArg::Inner => JoinMode::Inner,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Merge two datasets on time
    Merge {
        /// First dataset; its parameters keep their names
        #[arg(value_name = "A")]
        a: PathBuf,

        /// Second dataset; colliding parameters get its x_dataset as suffix
        #[arg(value_name = "B")]
        b: PathBuf,

        /// Join mode
        #[arg(long, value_enum, default_value = "outer", env = "HAPIMERGE_HOW")]
        how: HowArg,

        /// Round times to the nearest second before joining
        #[arg(long, env = "HAPIMERGE_ROUND_TO_SEC")]
        round_to_sec: bool,

        /// Replace missing cells with each parameter's fill value
        #[arg(long, env = "HAPIMERGE_FILL_NAN")]
        fill_nan: bool,

        /// Share one column for parameters declared identically in both datasets
        #[arg(long)]
        no_join_all: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Resample one dataset onto a regular grid
    Resample {
        /// Input dataset
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Grid spacing, e.g. 5s, 1min, 2H
        #[arg(long, env = "HAPIMERGE_INTERVAL")]
        interval: Interval,

        /// Keep only grid times with a sample this close (e.g. 30s)
        #[arg(long, env = "HAPIMERGE_TOLERANCE")]
        tolerance: Option<Interval>,

        /// Drop samples before this time
        #[arg(long, value_parser = parse_time_arg)]
        start: Option<DateTime<Utc>>,

        /// Drop samples after this time
        #[arg(long, value_parser = parse_time_arg)]
        end: Option<DateTime<Utc>>,

        /// Most grid steps one sample may be carried forward or back
        #[arg(long, env = "HAPIMERGE_LIMIT")]
        limit: Option<NonZeroUsize>,

        /// Round times to the nearest second first
        #[arg(long, env = "HAPIMERGE_ROUND_TO_SEC")]
        round_to_sec: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },
}

fn parse_time_arg(s: &str) -> Result<DateTime<Utc>, String> {
    parse_time(s).map_err(|e| e.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays a clean document
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hapimerge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Merge {
            a,
            b,
            how,
            round_to_sec,
            fill_nan,
            no_join_all,
            output,
        } => {
            let (data_a, meta_a) = read_document_from_path(&a)?;
            let (data_b, meta_b) = read_document_from_path(&b)?;

            let options = MergeOptions::new()
                .with_how(how.into())
                .with_round_to_sec(round_to_sec)
                .with_fill_nan(fill_nan)
                .with_join_all(!no_join_all);

            let out = merge(&data_a, &meta_a, &data_b, &meta_b, &options)?;
            if fill_nan {
                tracing::info!(
                    cells = out.fill_report.cells_filled(),
                    unfilled = out.fill_report.unfilled.len(),
                    "applied fill values"
                );
            }

            let (data, meta) = out.into_parts();
            emit(output.as_deref(), &data, &meta)?;
        }
        Commands::Resample {
            input,
            interval,
            tolerance,
            start,
            end,
            limit,
            round_to_sec,
            output,
        } => {
            let (data, meta) = read_document_from_path(&input)?;

            let mut options = ResampleOptions::new(interval)
                .with_round_to_sec(round_to_sec)
                .with_window(start, end);
            if let Some(tolerance) = tolerance {
                options = options.with_tolerance(tolerance);
            }
            if let Some(limit) = limit {
                options = options.with_limit(limit);
            }

            let (data, meta) = resample(&data, &meta, &options)?.into_parts();
            emit(output.as_deref(), &data, &meta)?;
        }
    }

    Ok(())
}

fn emit(output: Option<&Path>, data: &RecordCollection, meta: &Metadata) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            write_document_to_path(path, data, meta)?;
            tracing::info!(path = %path.display(), rows = data.len(), "wrote document");
        }
        None => write_document(std::io::stdout().lock(), data, meta)?,
    }
    Ok(())
}
