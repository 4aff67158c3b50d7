mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::payoff::{ScheduleArgs, SimulateArgs};

/// Loan payoff (EMI) simulation
#[derive(Parser)]
#[command(
    name = "payoff",
    version,
    about = "Loan payoff (EMI) simulation",
    long_about = "Simulates paying off a loan with a fixed monthly instalment (EMI). \
                  Interest is capitalised monthly before each payment; the final \
                  month pays only what is left. Reports the number of months, the \
                  total paid and the total interest, or the full schedule."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true, env = "PAYOFF_LOG_LEVEL")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Months, total paid and total interest for a fixed-EMI loan
    Simulate(SimulateArgs),
    /// Month-by-month payoff schedule
    Schedule(ScheduleArgs),
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

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::payoff::run_simulate(args),
        Commands::Schedule(args) => commands::payoff::run_schedule(args),
        Commands::Version => {
            println!("payoff {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
