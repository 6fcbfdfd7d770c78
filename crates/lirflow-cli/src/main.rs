use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use colored::*;
use lirflow::{AnalysisKind, Driver, DriverConfig, OutputFormat, ReportConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lirflow")]
#[command(about = "lirflow - dominance and reaching-definitions analysis for LIR programs")]
#[command(version = "0.1.0")]
struct Cli {
    /// LIR file to analyse.
    input: PathBuf,

    /// Accepted for compatibility; not read.
    secondary: PathBuf,

    /// Function to analyse; defaults to `test`.
    function: Option<String>,

    #[arg(short, long, value_enum, default_value = "rdef")]
    analysis: Analysis,

    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Also print points and blocks with empty results.
    #[arg(long)]
    include_empty: bool,

    /// Repeat for more log output on stderr.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Analysis {
    Rdef,
    Dom,
    Dominators,
    Constants,
}

impl From<Analysis> for AnalysisKind {
    fn from(analysis: Analysis) -> Self {
        match analysis {
            Analysis::Rdef => AnalysisKind::Rdef,
            Analysis::Dom => AnalysisKind::Dom,
            Analysis::Dominators => AnalysisKind::Dominators,
            Analysis::Constants => AnalysisKind::Constants,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", Cli::command().render_usage());
            return ExitCode::FAILURE;
        }
    };

    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".bright_red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = DriverConfig::default()
        .with_function(cli.function.unwrap_or_default())
        .with_analyses(vec![cli.analysis.into()])
        .with_report(ReportConfig {
            format: cli.format.into(),
            include_empty: cli.include_empty,
        });

    if cli.verbose > 0 {
        eprintln!("{}", " lirflow".bright_blue().bold());
        eprintln!("{}", "=".repeat(50).bright_blue());
        eprintln!(" Input: {}", cli.input.display());
        eprintln!(" Function: {}", config.function);
        eprintln!(" Analysis: {}", config.analyses[0]);
        eprintln!();
    }
    tracing::debug!(secondary = %cli.secondary.display(), "ignoring secondary path");

    let output = Driver::new(config).run_file(&cli.input)?;
    print!("{}", output);
    Ok(())
}
