//! Market forensics CLI
//!
//! Runs the anomaly scan over CSV exports and prints the analysis as JSON.
//!
//! Usage: market-forensics scan --input AAPL.csv --ticker AAPL --sensitivity 60

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use market_forensics::analysis::Analyzer;
use market_forensics::data::{CsvSource, ScanMode};
use market_forensics::utils::{load_config, Config};

#[derive(Parser)]
#[command(name = "market-forensics")]
#[command(about = "Flag anomalous trading behavior in price/volume series")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a series for anomalies
    Scan {
        #[command(flatten)]
        target: ScanArgs,

        /// Scan mode: live, deep, explain
        #[arg(short, long, default_value = "live")]
        mode: ScanMode,
    },

    /// Scan with the forensic narrative attached
    Explain {
        #[command(flatten)]
        target: ScanArgs,
    },

    /// Generate sample configuration file
    Config {
        /// Output path
        #[arg(short, long, default_value = "config.toml")]
        output: String,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// CSV file, or a directory holding <TICKER>.csv files
    #[arg(short, long)]
    input: PathBuf,

    /// Ticker symbol
    #[arg(short, long)]
    ticker: String,

    /// Sensitivity 0-100 (defaults to the configured value)
    #[arg(short, long)]
    sensitivity: Option<i32>,

    /// Header rows in the CSV (provider exports often carry several)
    #[arg(long, default_value_t = 1)]
    header_rows: usize,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Scan { target, mode } => run_scan(&config, &target, mode)?,
        Commands::Explain { target } => run_scan(&config, &target, ScanMode::Explain)?,
        Commands::Config { output } => generate_config(&output)?,
    }

    Ok(())
}

fn run_scan(config: &Config, args: &ScanArgs, mode: ScanMode) -> Result<()> {
    let source = if args.input.is_dir() {
        CsvSource::directory(&args.input)
    } else {
        CsvSource::file(&args.input)
    }
    .with_header_rows(args.header_rows);

    let analyzer = Analyzer::from_config(config);
    let result = analyzer
        .scan(&source, &args.ticker, mode, args.sensitivity)
        .with_context(|| format!("{} scan failed for {}", mode, args.ticker))?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", json);

    Ok(())
}

fn generate_config(output: &str) -> Result<()> {
    Config::create_sample_config(output)?;
    info!("Sample configuration written to {}", output);
    Ok(())
}
