//! Command implementations for the indicators CLI
//!
//! Every command loads the dataset once, resolves missing entity and
//! indicator arguments through the configured preferences, and prints a
//! human-readable view to stdout. Logs go to stderr.

use crate::analytics::{self, KpiRow, SeriesPoint};
use crate::cache::DatasetCache;
use crate::cli::args::{
    Args, CalcArgs, Commands, CompareArgs, ExportArgs, PanelArgs, SeriesArgs,
};
use crate::config::IngestConfig;
use crate::dataset::Dataset;
use crate::export::write_dataset;
use crate::models::{FileStatus, LoadReport};
use crate::processor::DatasetLoader;

use anyhow::{Context, Result, anyhow};
use colored::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Main command runner
pub fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;
    debug!("Arguments: {:?}", args);

    args.validate()?;
    let config = args
        .build_config()
        .context("Failed to load configuration")?;

    let loader = DatasetLoader::new(config.clone());
    let mut cache = DatasetCache::from_config(&config);
    let (dataset, report) = cache.get_or_load_with(&loader).with_context(|| {
        format!(
            "Failed to load indicator files from {}",
            config.data_dir.display()
        )
    })?;

    let command = args.get_command();
    if dataset.is_empty() && !matches!(command, Commands::Summary) {
        print_empty_notice(&config, &report);
        return Ok(());
    }

    match command {
        Commands::Summary => run_summary(&config, &dataset, &report),
        Commands::Catalog => run_catalog(&dataset),
        Commands::Series(series_args) => run_series(&config, &dataset, &series_args),
        Commands::Panel(panel_args) => run_panel(&config, &dataset, &panel_args),
        Commands::Compare(compare_args) => run_compare(&config, &dataset, &compare_args),
        Commands::Calc(calc_args) => run_calc(&config, &dataset, &calc_args),
        Commands::Export(export_args) => run_export(&dataset, &export_args),
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("indicator_ingest={}", args.get_log_level())));

    let result = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    result.map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

fn print_empty_notice(config: &IngestConfig, report: &LoadReport) {
    println!(
        "{} {}",
        "No indicator data found in".bright_yellow(),
        config.data_dir.display()
    );
    if report.files.is_empty() {
        println!(
            "  Place files with extensions {} in that directory or pass --data-dir.",
            config.extensions.join(", ")
        );
    } else {
        println!("  Run `indicators summary` to see why each file was skipped.");
    }
}

/// Entity label from an optional query, falling back to the preferred entity
fn resolve_entity(config: &IngestConfig, dataset: &Dataset, query: Option<&str>) -> Result<String> {
    match query {
        Some(query) => dataset
            .resolve_entity(query)
            .ok_or_else(|| anyhow!("No entity matches '{}'", query)),
        None => dataset
            .defaults(&config.preferences)
            .entity
            .ok_or_else(|| anyhow!("Dataset has no entities")),
    }
}

/// Indicator code from an optional label or code, falling back to the
/// preferred indicator
fn resolve_indicator(
    config: &IngestConfig,
    dataset: &Dataset,
    query: Option<&str>,
) -> Result<String> {
    match query {
        Some(query) => Ok(dataset.resolve_label(query)),
        None => dataset
            .defaults(&config.preferences)
            .indicator
            .map(|entry| entry.code)
            .ok_or_else(|| anyhow!("Dataset has no indicators")),
    }
}

/// Catalog label for a code, or the code itself
fn indicator_label(dataset: &Dataset, code: &str) -> String {
    dataset
        .catalog()
        .into_iter()
        .find(|entry| entry.code == code)
        .map(|entry| entry.label)
        .unwrap_or_else(|| code.to_string())
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "—".to_string(),
    }
}

fn format_pct(value: Option<f64>) -> ColoredString {
    match value {
        Some(v) if v > 0.0 => format!("{:+.2}%", v).bright_green(),
        Some(v) if v < 0.0 => format!("{:+.2}%", v).bright_red(),
        Some(v) => format!("{:.2}%", v).normal(),
        None => "—".dimmed(),
    }
}

fn run_summary(config: &IngestConfig, dataset: &Dataset, report: &LoadReport) -> Result<()> {
    println!("{}", "Indicator dataset summary".bright_green().bold());
    println!(
        "  {} {}",
        "Data directory:".bright_cyan(),
        config.data_dir.display()
    );

    println!(
        "\n{} {} loaded, {} skipped",
        "Files:".bright_cyan(),
        report.files_loaded().to_string().bright_white().bold(),
        report.files_skipped().to_string().bright_white().bold()
    );
    for outcome in &report.files {
        match &outcome.status {
            FileStatus::Loaded {
                rows,
                delimiter,
                encoding,
            } => println!(
                "  {} {} ({} rows, {} / {})",
                "✓".bright_green(),
                outcome.file_name,
                rows,
                delimiter,
                encoding
            ),
            FileStatus::Skipped(reason) => println!(
                "  {} {} ({})",
                "✗".bright_red(),
                outcome.file_name,
                reason.to_string().yellow()
            ),
        }
    }

    if dataset.is_empty() {
        println!();
        print_empty_notice(config, report);
        return Ok(());
    }

    let rows = &report.rows;
    println!("\n{}", "Rows:".bright_cyan());
    println!("  • Read: {}", rows.rows_read);
    println!("  • Dropped (invalid period): {}", rows.rows_dropped_period);
    println!("  • Missing values: {}", rows.values_missing);
    println!("  • Duplicates removed: {}", rows.duplicates_removed);

    let summary = dataset.summary();
    println!("\n{}", "Dataset:".bright_cyan());
    println!("  • Records: {}", summary.rows.to_string().bright_white().bold());
    println!("  • Entities: {}", summary.entities);
    println!("  • Indicators: {}", summary.indicators);
    if let (Some(first), Some(last)) = (&summary.first_period, &summary.last_period) {
        println!("  • Periods: {} to {}", first, last);
    }

    let defaults = dataset.defaults(&config.preferences);
    println!("\n{}", "Defaults:".bright_cyan());
    if let Some(entity) = defaults.entity {
        println!("  • Entity: {}", entity);
    }
    if let Some(indicator) = defaults.indicator {
        println!("  • Indicator: {} ({})", indicator.label, indicator.code);
    }

    info!("Summary reported in {}ms load time", report.processing_time_ms);
    Ok(())
}

fn run_catalog(dataset: &Dataset) -> Result<()> {
    let catalog = dataset.catalog();
    println!(
        "{} ({} indicators)",
        "Variable catalog".bright_green().bold(),
        catalog.len()
    );

    let width = catalog.iter().map(|e| e.code.len()).max().unwrap_or(0);
    for entry in catalog {
        println!("  {:<width$}  {}", entry.code.bright_cyan(), entry.label, width = width);
    }
    Ok(())
}

fn print_points(points: &[SeriesPoint]) {
    for point in points {
        println!("  {}  {:>14}", point.period_key, format_value(point.value));
    }
}

fn run_series(config: &IngestConfig, dataset: &Dataset, args: &SeriesArgs) -> Result<()> {
    let entity = resolve_entity(config, dataset, args.entity.as_deref())?;
    let code = resolve_indicator(config, dataset, args.indicator.as_deref())?;

    let points = analytics::series(dataset, &entity, &code, &args.range.to_range());

    println!("{}", entity.bright_green().bold());
    println!(
        "  {} {} ({})",
        "Indicator:".bright_cyan(),
        indicator_label(dataset, &code),
        code
    );

    if points.is_empty() {
        println!("  {}", "No data for this selection".bright_yellow());
        return Ok(());
    }
    print_points(&points);
    Ok(())
}

fn print_kpi_row(row: &KpiRow) {
    println!(
        "  {:<40} {:>14}  MoM {:>10}  YoY {:>10}",
        format!("{} ({})", row.indicator_label, row.indicator_code),
        format_value(row.value),
        format_pct(row.mom_pct),
        format_pct(row.yoy_pct)
    );
}

/// Latest month present anywhere in the dataset
fn default_panel_month(dataset: &Dataset) -> Result<String> {
    dataset
        .period_keys()
        .pop()
        .ok_or_else(|| anyhow!("Dataset has no periods"))
}

fn run_panel(config: &IngestConfig, dataset: &Dataset, args: &PanelArgs) -> Result<()> {
    let entity = resolve_entity(config, dataset, args.entity.as_deref())?;

    let month = match &args.month {
        Some(month) => month.clone(),
        None => default_panel_month(dataset)?,
    };

    let codes: Vec<String> = if args.indicators.is_empty() {
        analytics::panel_codes(dataset, &config.panel_indicator_codes, config.panel_limit)
    } else {
        args.indicators
            .iter()
            .map(|query| dataset.resolve_label(query))
            .collect()
    };

    let rows = analytics::panel(dataset, &entity, &month, &codes);

    println!("{}", entity.bright_green().bold());
    println!("  {} {}", "Month:".bright_cyan(), month);
    if rows.is_empty() {
        println!("  {}", "No data for the selected indicators".bright_yellow());
        return Ok(());
    }
    for row in &rows {
        print_kpi_row(row);
    }
    Ok(())
}

fn run_compare(config: &IngestConfig, dataset: &Dataset, args: &CompareArgs) -> Result<()> {
    let entity = resolve_entity(config, dataset, args.entity.as_deref())?;
    let range = args.range.to_range();
    let transform = args.transform();

    let codes: Vec<String> = args
        .indicators
        .iter()
        .map(|query| dataset.resolve_label(query))
        .collect();

    // period -> one value per compared code
    let mut table: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
    for (column, code) in codes.iter().enumerate() {
        let points = transform.apply(analytics::series(dataset, &entity, code, &range));
        for point in points {
            let row = table
                .entry(point.period_key)
                .or_insert_with(|| vec![None; codes.len()]);
            row[column] = point.value;
        }
    }

    println!("{}", entity.bright_green().bold());
    println!(
        "  {} {:?}",
        "Transform:".bright_cyan(),
        transform
    );
    if table.is_empty() {
        println!("  {}", "No data for this selection".bright_yellow());
        return Ok(());
    }

    let header: Vec<String> = codes.iter().map(|code| format!("{:>14}", code)).collect();
    println!("  {:<7}  {}", "Period".bright_cyan(), header.join(" ").bright_cyan());
    for (period, values) in &table {
        let cells: Vec<String> = values
            .iter()
            .map(|v| format!("{:>14}", format_value(*v)))
            .collect();
        println!("  {:<7}  {}", period, cells.join(" "));
    }
    Ok(())
}

fn run_calc(config: &IngestConfig, dataset: &Dataset, args: &CalcArgs) -> Result<()> {
    let entity = resolve_entity(config, dataset, args.entity.as_deref())?;
    let range = args.range.to_range();

    let code_a = dataset.resolve_label(&args.a);
    let code_b = dataset.resolve_label(&args.b);
    let a = analytics::series(dataset, &entity, &code_a, &range);
    let b = analytics::series(dataset, &entity, &code_b, &range);
    let result = analytics::calculate(&a, &b, args.op);

    println!("{}", entity.bright_green().bold());
    println!(
        "  {} {} {} {}",
        "Formula:".bright_cyan(),
        code_a,
        args.op.symbol(),
        code_b
    );
    if result.is_empty() {
        println!("  {}", "No data for this selection".bright_yellow());
        return Ok(());
    }
    print_points(&result);
    Ok(())
}

fn run_export(dataset: &Dataset, args: &ExportArgs) -> Result<()> {
    let format = args.resolved_format();
    let rows = write_dataset(dataset, &args.output, format)
        .with_context(|| format!("Failed to export to {}", args.output.display()))?;

    println!(
        "{} {} rows to {} ({:?})",
        "Wrote".bright_green(),
        rows.to_string().bright_white().bold(),
        args.output.display(),
        format
    );
    Ok(())
}
