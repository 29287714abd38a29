//! Deposit Average CLI
//!
//! Evaluates one account from flags, or a CSV batch file.
//! Defaults come from DEPOSIT_HIT_MODE, DEPOSIT_TIER, DEPOSIT_OUTPUT; flags win.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use deposit_average::{
    account::load_batch,
    engine::calendar,
    evaluate_batch, evaluate_single,
    report::render,
    AccountInput, HitMode, OutputFormat, ReportConfig, Tier,
};
use log::{info, warn};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(
    name = "deposit-average",
    version,
    about = "Check an average daily balance against its required tier"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a single account
    Single(SingleArgs),
    /// Evaluate every row of a CSV file
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct SingleArgs {
    /// Average daily balance so far this year
    #[arg(long = "avg", allow_negative_numbers = true)]
    avg_to_date: Option<f64>,

    /// Balance held at the statistics date
    #[arg(long = "balance", allow_negative_numbers = true)]
    current_balance: Option<f64>,

    /// Date the average was taken (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    stats_date: Option<NaiveDate>,

    /// Date to project compliance at (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    target_date: Option<NaiveDate>,

    /// basic | mid | <threshold>
    #[arg(long)]
    tier: Option<Tier>,

    /// point | year
    #[arg(long)]
    mode: Option<HitMode>,

    /// text | json
    #[arg(long)]
    format: Option<OutputFormat>,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// CSV file to evaluate
    file: PathBuf,

    /// point | year
    #[arg(long)]
    mode: Option<HitMode>,

    /// Tier for rows with an empty level column
    #[arg(long)]
    tier: Option<Tier>,

    /// text | json | html
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_date_arg(text: &str) -> Result<NaiveDate, String> {
    calendar::parse_date(text).ok_or_else(|| format!("expected YYYY-MM-DD, got {:?}", text))
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let env_config = ReportConfig::from_env();

    match cli.command {
        Command::Single(args) => run_single(args, env_config),
        Command::Batch(args) => run_batch(args, env_config),
    }
}

fn run_single(args: SingleArgs, env_config: ReportConfig) -> Result<()> {
    let input = AccountInput {
        avg_to_date: args.avg_to_date,
        current_balance: args.current_balance,
        stats_date: args.stats_date,
        target_date: args.target_date,
        tier: args.tier.unwrap_or(env_config.default_tier),
        hit_mode: args.mode.unwrap_or(env_config.hit_mode),
    };
    let format = single_format(args.format, env_config.format)?;

    let report = evaluate_single(&input);
    match format {
        OutputFormat::Json => {
            println!("{}", render::render_single_json(&report).context("Failed to encode report")?)
        }
        OutputFormat::Text | OutputFormat::Html => print!("{}", render::render_single_text(&report)),
    }
    Ok(())
}

/// Output format for `single`, which has no HTML table
///
/// An explicit `--format html` is an error; an html default from
/// DEPOSIT_OUTPUT falls back to text.
fn single_format(flag: Option<OutputFormat>, env_default: OutputFormat) -> Result<OutputFormat> {
    match (flag, env_default) {
        (Some(OutputFormat::Html), _) => {
            bail!("html output is only available for batch files; use --format text or json")
        }
        (Some(format), _) => Ok(format),
        (None, OutputFormat::Html) => {
            warn!("DEPOSIT_OUTPUT=html does not apply to single records, printing text");
            Ok(OutputFormat::Text)
        }
        (None, format) => Ok(format),
    }
}

fn run_batch(args: BatchArgs, env_config: ReportConfig) -> Result<()> {
    let start = Instant::now();
    let config = ReportConfig {
        hit_mode: args.mode.unwrap_or(env_config.hit_mode),
        default_tier: args.tier.unwrap_or(env_config.default_tier),
        format: args.format.unwrap_or(env_config.format),
    };

    let batch = load_batch(&args.file)
        .with_context(|| format!("Failed to load batch file {}", args.file.display()))?;
    info!("Loaded {} rows from {} in {:?}", batch.len(), args.file.display(), start.elapsed());

    let report = evaluate_batch(&batch, &config);

    let rendered = match config.format {
        OutputFormat::Text => render::render_batch_text(&report),
        OutputFormat::Html => render::render_html(&report),
        OutputFormat::Json => render::render_batch_json(&report).context("Failed to encode report")?,
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            let summary = report.summary();
            println!(
                "Wrote {} rows ({} incomplete) to {}",
                summary.total,
                summary.incomplete,
                path.display()
            );
        }
        None => print!("{}", rendered),
    }

    info!("Total time: {:?}", start.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_args(argv: &[&str]) -> SingleArgs {
        let cli = Cli::try_parse_from(argv.iter().copied()).unwrap();
        match cli.command {
            Command::Single(args) => args,
            Command::Batch(_) => panic!("expected the single subcommand"),
        }
    }

    #[test]
    fn test_negative_amounts_parse_as_values() {
        let args = single_args(&[
            "deposit-average",
            "single",
            "--avg",
            "-250.5",
            "--balance",
            "-500",
            "--stats-date",
            "2025-04-10",
        ]);
        assert_eq!(args.avg_to_date, Some(-250.5));
        assert_eq!(args.current_balance, Some(-500.0));
        assert_eq!(args.stats_date, NaiveDate::from_ymd_opt(2025, 4, 10));
    }

    #[test]
    fn test_single_rejects_html_flag() {
        let args = single_args(&["deposit-average", "single", "--format", "html"]);
        assert!(single_format(args.format, OutputFormat::Text).is_err());
    }

    #[test]
    fn test_single_format_defaults() {
        assert_eq!(single_format(None, OutputFormat::Html).unwrap(), OutputFormat::Text);
        assert_eq!(single_format(None, OutputFormat::Json).unwrap(), OutputFormat::Json);
        assert_eq!(
            single_format(Some(OutputFormat::Json), OutputFormat::Html).unwrap(),
            OutputFormat::Json
        );
    }
}
