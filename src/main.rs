// Entry point for the `likert-risk` command.
//
// Each subcommand loads the survey once, builds the schema index and then
// prints or exports what was asked for. Diagnostics go to stderr via
// tracing; tables and summaries go to stdout.
mod cli;

use clap::Parser;
use likert_risk_report::config::AnalysisConfig;
use likert_risk_report::error::{ReportError, Result};
use likert_risk_report::loader::{load_survey, SurveyTable};
use likert_risk_report::logging::{init_logging, LogConfig, LogFormat};
use likert_risk_report::schema::{SchemaIndex, VariableCatalog};
use likert_risk_report::types::{TimePeriod, LEVEL_LABELS};
use likert_risk_report::{output, reports, util};
use std::path::Path;

use crate::cli::{AnalyzeArgs, Cli, Command, IndexArgs, LogFormatArg, StatsArgs};

fn main() {
    let cli = Cli::parse();
    init_logging(&log_config_from_cli(&cli));

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Command::Index(args) => handle_index(args, &config),
        Command::Stats(args) => handle_stats(args, &config),
        Command::Analyze(args) => handle_analyze(args, &config),
    });
    if let Err(error) = result {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn log_config_from_cli(cli: &Cli) -> LogConfig {
    LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        use_env_filter: !cli.verbosity.is_present(),
        format: match cli.log_format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        },
        ..LogConfig::default()
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_path(path),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Load the survey and print the same short diagnostics for every command.
fn load(path: &Path, config: &AnalysisConfig) -> Result<(SurveyTable, SchemaIndex)> {
    let (table, load_report) = load_survey(path)?;
    println!(
        "Loaded survey... ({} respondents, {} columns)",
        util::format_int(table.row_count()),
        util::format_int(table.headers().len())
    );
    if load_report.short_rows + load_report.long_rows > 0 {
        println!(
            "Note: {} rows had a different number of cells than the header.",
            util::format_int(load_report.short_rows + load_report.long_rows)
        );
    }
    if !load_report.duplicate_headers.is_empty() {
        println!(
            "Note: {} duplicated column headers; each column is analysed on its own.",
            util::format_int(load_report.duplicate_headers.len())
        );
    }
    let index = SchemaIndex::from_config(table.headers(), config);
    Ok((table, index))
}

fn handle_index(args: &IndexArgs, config: &AnalysisConfig) -> Result<()> {
    let (_, index) = load(&args.input, config)?;
    let catalog = VariableCatalog::from_index(&index);
    println!();
    let counts = reports::generate_index_counts(&index);
    output::preview_table_rows(&counts, counts.len());
    println!(
        "{} variables, {} metadata columns, {} survey columns without a period.\n",
        util::format_int(catalog.len()),
        util::format_int(index.metadata_columns().count()),
        util::format_int(index.unassigned().count())
    );

    let findings: Vec<_> = reports::generate_audit(&index, &catalog)
        .into_iter()
        .filter(|row| row.kind != "metadata")
        .collect();
    if !findings.is_empty() {
        output::preview_table_rows(&findings, findings.len());
    }
    Ok(())
}

fn handle_stats(args: &StatsArgs, config: &AnalysisConfig) -> Result<()> {
    let (table, index) = load(&args.input, config)?;
    let catalog = VariableCatalog::from_index(&index);
    let entry = catalog
        .find(&args.code)
        .ok_or_else(|| ReportError::UnknownVariable {
            code: args.code.to_string(),
        })?;
    let wanted = args.period.map(TimePeriod::from);

    println!("\n{} {} ({})", entry.code, entry.description, entry.dimension.label());
    if let Some(period) = wanted.filter(|p| !entry.asked_in(*p)) {
        println!("\n[{}] (not asked in this period)", period.label());
        return Ok(());
    }
    for (period, header, stats) in reports::variable_profile(&table, entry, config)? {
        if wanted.is_some_and(|w| w != period) {
            continue;
        }
        println!("\n[{}] {}", period.label(), header);
        let Some(stats) = stats else {
            println!("  (no valid answers)");
            continue;
        };
        for (idx, label) in LEVEL_LABELS.iter().enumerate() {
            println!(
                "  {} {:<12} {:>5} ({}%)",
                idx + 1,
                label,
                util::format_int(stats.absolute[idx]),
                util::format_number(stats.relative[idx] * 100.0, 1)
            );
        }
        println!(
            "  n={} median={} mode={} IQR={} high={}% low={}% consensus={}",
            util::format_int(stats.total),
            util::format_number(stats.median, 1),
            stats.mode,
            util::format_number(stats.iqr, 2),
            util::format_number(stats.percent_risk_high, 1),
            util::format_number(stats.percent_risk_low, 1),
            if stats.consensus_high { "yes" } else { "no" }
        );
        println!("  {}", stats.risk_level(&config.thresholds).label());
    }
    Ok(())
}

/// Generate every report, write it under the output directory and print a
/// Markdown preview of each.
fn handle_analyze(args: &AnalyzeArgs, config: &AnalysisConfig) -> Result<()> {
    let (table, index) = load(&args.input, config)?;
    let catalog = VariableCatalog::from_index(&index);
    let dir = &args.output_dir;
    output::ensure_dir(dir)?;

    println!("Generating reports...\n");
    let results = reports::analyze_variables(&table, &index, config)?;

    let variable_rows = reports::generate_variable_report(&results);
    let file1 = dir.join("variable_stats.csv");
    output::write_csv(&file1, &variable_rows)?;
    println!("Report 1: Variable Statistics\n");
    output::preview_table_rows(&variable_rows, args.preview_rows);
    println!("(Full table exported to {})\n", file1.display());

    let dimension_rows = reports::generate_dimension_summary(&results, config);
    let file2 = dir.join("dimension_summary.csv");
    output::write_csv(&file2, &dimension_rows)?;
    println!("Report 2: Dimension Summary by Period\n");
    output::preview_table_rows(&dimension_rows, args.preview_rows);
    println!("(Full table exported to {})\n", file2.display());

    let trend_rows = reports::generate_trend_report(&table, &catalog, config)?;
    let file3 = dir.join("temporal_trends.csv");
    output::write_csv(&file3, &trend_rows)?;
    println!("Report 3: Temporal Trends\n");
    output::preview_table_rows(&trend_rows, args.preview_rows);
    println!("(Full table exported to {})\n", file3.display());

    let appendix_rows = reports::generate_appendix(&catalog);
    let file4 = dir.join("variable_appendix.csv");
    output::write_csv(&file4, &appendix_rows)?;
    println!(
        "Appendix: {} variables (exported to {})",
        util::format_int(appendix_rows.len()),
        file4.display()
    );

    let audit_rows = reports::generate_audit(&index, &catalog);
    let file5 = dir.join("schema_audit.csv");
    output::write_csv(&file5, &audit_rows)?;
    println!(
        "Schema audit: {} findings (exported to {})\n",
        util::format_int(audit_rows.len()),
        file5.display()
    );

    let summary = reports::generate_summary(&table, &index, &catalog, &results);
    output::write_json(&dir.join("summary.json"), &summary)?;
    println!("Summary Stats (summary.json):");
    println!(
        "{{\"total_respondents\": {}, \"total_critical_risks\": {}, \"excluded_headers\": {}}}\n",
        util::format_int(summary.total_respondents),
        util::format_int(summary.total_critical_risks),
        util::format_int(summary.excluded_headers)
    );
    Ok(())
}
