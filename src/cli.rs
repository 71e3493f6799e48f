//! Command-line arguments for `likert-risk`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use likert_risk_report::types::{TimePeriod, VariableCode};

#[derive(Parser)]
#[command(
    name = "likert-risk",
    version,
    about = "Risk-perception statistics for Likert-scale port surveys",
    long_about = "Map survey columns to risk dimensions and time horizons, compute\n\
                  ordinal statistics per variable and export CSV/JSON reports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// JSON file overriding prefixes, period phrases or risk thresholds.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show how the survey columns map to dimensions and periods.
    Index(IndexArgs),

    /// Print the statistics of one variable.
    Stats(StatsArgs),

    /// Compute every report and write it to disk.
    Analyze(AnalyzeArgs),
}

#[derive(Parser)]
pub struct IndexArgs {
    /// Survey CSV export.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,
}

#[derive(Parser)]
pub struct StatsArgs {
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Variable code, e.g. `4.1`.
    #[arg(long = "code", value_name = "CODE")]
    pub code: VariableCode,

    /// Restrict output to one period.
    #[arg(long = "period", value_enum)]
    pub period: Option<PeriodArg>,
}

#[derive(Parser)]
pub struct AnalyzeArgs {
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Directory for report files (created if missing).
    #[arg(long = "output-dir", value_name = "DIR", default_value = "reports")]
    pub output_dir: PathBuf,

    /// Rows shown per report preview.
    #[arg(long = "preview-rows", default_value_t = 3)]
    pub preview_rows: usize,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PeriodArg {
    Immediate,
    ShortTerm,
    LongTerm,
}

impl From<PeriodArg> for TimePeriod {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Immediate => TimePeriod::Immediate2025,
            PeriodArg::ShortTerm => TimePeriod::ShortTerm2026To2027,
            PeriodArg::LongTerm => TimePeriod::LongTerm2035,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_stats_with_period() {
        let cli = Cli::try_parse_from([
            "likert-risk",
            "stats",
            "survey.csv",
            "--code",
            "4.1",
            "--period",
            "long-term",
        ])
        .unwrap();
        let Command::Stats(args) = cli.command else {
            panic!("expected stats");
        };
        assert_eq!(args.code.as_str(), "4.1");
        assert_eq!(
            args.period.map(TimePeriod::from),
            Some(TimePeriod::LongTerm2035)
        );
    }

    #[test]
    fn rejects_malformed_code() {
        assert!(Cli::try_parse_from(["likert-risk", "stats", "s.csv", "--code", "x"]).is_err());
    }
}
