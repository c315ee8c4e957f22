//! Command-line argument definitions for the indicators tool
//!
//! Defines the CLI surface with the clap derive API. Global options select
//! the data directory, config file and verbosity; each subcommand is one
//! view over the loaded dataset.

use crate::analytics::{Operation, PeriodRange, Transform};
use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::export::ExportFormat;
use crate::normalize::{parse_period, period_key};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the indicators tool
///
/// Loads every indicator file of a directory, reconciles their headers and
/// formats, and answers catalog, series, panel and comparison queries.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "indicators",
    version,
    about = "Ingest, normalize and query economic indicator CSV files",
    long_about = "Loads loosely-structured economic indicator files (semicolon, comma or tab \
                  separated, UTF-8 or Latin-1, with varying header spellings) from a directory, \
                  normalizes them into one deduplicated dataset and reports on it."
)]
pub struct Args {
    /// Directory holding the indicator files (overrides the config file)
    #[arg(short = 'd', long = "data-dir", value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// TOML configuration file
    ///
    /// Defaults to <config dir>/indicator-ingest/config.toml when present.
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Files loaded and skipped, row counters and dataset overview (default)
    Summary,
    /// List indicator labels and codes
    Catalog,
    /// Values of one indicator for one entity over time
    Series(SeriesArgs),
    /// KPI panel for one entity and month with MoM and YoY changes
    Panel(PanelArgs),
    /// Several indicators side by side, optionally rebased or as YoY change
    Compare(CompareArgs),
    /// Combine two indicators period by period
    Calc(CalcArgs),
    /// Write the normalized dataset to Parquet or CSV
    Export(ExportArgs),
}

/// Inclusive period bounds shared by time-based commands
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RangeArgs {
    /// First period to include (YYYY-MM or YYYYMM)
    #[arg(long, value_name = "PERIOD", value_parser = parse_period_arg)]
    pub from: Option<String>,

    /// Last period to include (YYYY-MM or YYYYMM)
    #[arg(long, value_name = "PERIOD", value_parser = parse_period_arg)]
    pub to: Option<String>,
}

impl RangeArgs {
    pub fn to_range(&self) -> PeriodRange {
        PeriodRange::new(self.from.clone(), self.to.clone())
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (&self.from, &self.to) {
            if from > to {
                return Err(IngestError::configuration(format!(
                    "--from {} is after --to {}",
                    from, to
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct SeriesArgs {
    /// Entity label, code or part of its name (defaults to the preferred entity)
    #[arg(short, long)]
    pub entity: Option<String>,

    /// Indicator label or code (defaults to the preferred indicator)
    #[arg(short, long)]
    pub indicator: Option<String>,

    #[command(flatten)]
    pub range: RangeArgs,
}

#[derive(Debug, Clone, clap::Args)]
pub struct PanelArgs {
    /// Entity label, code or part of its name
    #[arg(short, long)]
    pub entity: Option<String>,

    /// Month to report (defaults to the latest month with data)
    #[arg(short, long, value_name = "PERIOD", value_parser = parse_period_arg)]
    pub month: Option<String>,

    /// Indicator labels or codes, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct CompareArgs {
    /// Entity label, code or part of its name
    #[arg(short, long)]
    pub entity: Option<String>,

    /// Indicator labels or codes, comma separated
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub indicators: Vec<String>,

    /// Rebase every series so its first period is 100
    #[arg(long, conflicts_with = "yoy")]
    pub base100: bool,

    /// Show year-on-year percent change
    #[arg(long)]
    pub yoy: bool,

    #[command(flatten)]
    pub range: RangeArgs,
}

impl CompareArgs {
    pub fn transform(&self) -> Transform {
        if self.base100 {
            Transform::Base100
        } else if self.yoy {
            Transform::Yoy
        } else {
            Transform::Raw
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct CalcArgs {
    /// First operand: indicator label or code
    #[arg(long)]
    pub a: String,

    /// Second operand: indicator label or code
    #[arg(long)]
    pub b: String,

    /// Operation: add, sub, mul or div
    #[arg(long)]
    pub op: Operation,

    /// Entity label, code or part of its name
    #[arg(short, long)]
    pub entity: Option<String>,

    #[command(flatten)]
    pub range: RangeArgs,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ExportArgs {
    /// Output file
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Output format (defaults from the file extension)
    #[arg(short, long, value_enum)]
    pub format: Option<ExportFormat>,
}

impl ExportArgs {
    pub fn resolved_format(&self) -> ExportFormat {
        self.format
            .unwrap_or_else(|| ExportFormat::from_path(&self.output))
    }
}

impl Args {
    /// Subcommand to run; `summary` when none was given
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Summary)
    }

    /// Log level for the `indicator_ingest` target
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Config file (explicit or default location) with CLI overrides applied
    pub fn build_config(&self) -> Result<IngestConfig> {
        let mut config = IngestConfig::load(self.config.as_deref())?;
        if let Some(data_dir) = &self.data_dir {
            config = config.with_data_dir(data_dir.clone());
        }
        Ok(config)
    }

    /// Check argument combinations clap cannot express
    pub fn validate(&self) -> Result<()> {
        match &self.command {
            Some(Commands::Series(args)) => args.range.validate(),
            Some(Commands::Compare(args)) => args.range.validate(),
            Some(Commands::Calc(args)) => args.range.validate(),
            _ => Ok(()),
        }
    }
}

/// Accept `YYYY-MM` or `YYYYMM`, normalized to `YYYY-MM`
pub fn parse_period_arg(raw: &str) -> std::result::Result<String, String> {
    let compact = raw.trim().replace('-', "");
    if compact.len() != 6 {
        return Err(format!("invalid period '{}', expected YYYY-MM", raw));
    }
    parse_period(&compact)
        .map(period_key)
        .ok_or_else(|| format!("invalid period '{}', expected YYYY-MM", raw))
}
