mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::schedule::{ScheduleArgs, ValidateSegmentsArgs};
use commands::simulation::SimulateArgs;

/// KPR mortgage schedules with decimal precision
#[derive(Parser)]
#[command(
    name = "kpr",
    version,
    about = "KPR mortgage amortization schedules and simulations",
    long_about = "Builds instalment schedules for KPR mortgages quoted as a sequence of \
                  fixed-rate segments. Each segment is amortized as a fresh annuity on the \
                  balance carried into it. Supports explicit segments, price/down-payment \
                  simulations and segment validation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log computation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an amortization schedule from explicit rate segments
    Schedule(ScheduleArgs),
    /// Simulate a KPR from property price, down payment and tenor
    Simulate(SimulateArgs),
    /// Check that rate segments are contiguous and cover the tenor
    ValidateSegments(ValidateSegmentsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Simulate(args) => commands::simulation::run_simulate(args),
        Commands::ValidateSegments(args) => commands::schedule::run_validate_segments(args),
        Commands::Version => {
            println!("kpr {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
