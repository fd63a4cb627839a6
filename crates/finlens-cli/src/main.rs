mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::anomaly::OutliersArgs;
use commands::insights::{AnalyzeArgs, SignalsArgs};
use commands::ratios::{DeriveArgs, PeersArgs};
use commands::valuation::{HealthArgs, ValuateArgs};

/// Financial statement analysis and valuation
#[derive(Parser)]
#[command(
    name = "finlens",
    version,
    about = "Financial statement analysis and valuation",
    long_about = "Derives ratios from periodic statements, benchmarks against peers, \
                  flags outliers, generates weighted insight signals and runs a \
                  two-stage DCF valuation with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Analysis settings file (JSON, or YAML by extension)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive margins, growth, TTM, ROIC and working-capital ratios
    Derive(DeriveArgs),
    /// Aggregate peer statistics (mean, population std, median)
    Peers(PeersArgs),
    /// Flag outliers with a z-score threshold and an isolation-forest ensemble
    Outliers(OutliersArgs),
    /// Evaluate signal rules and synthesize an insight
    Signals(SignalsArgs),
    /// Full entity analysis: ratios, peers, signals, outliers, trend screen
    Analyze(AnalyzeArgs),
    /// DCF valuation with multiples cross-check and sensitivity grid
    Valuate(ValuateArgs),
    /// Eight-check financial-health score
    Health(HealthArgs),
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

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if std::env::var("FINLENS_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let config = input::load_config(cli.config.as_deref())?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Derive(args) => commands::ratios::run_derive(args, config),
        Commands::Peers(args) => commands::ratios::run_peers(args),
        Commands::Outliers(args) => commands::anomaly::run_outliers(args, config),
        Commands::Signals(args) => commands::insights::run_signals(args),
        Commands::Analyze(args) => commands::insights::run_analyze(args, config),
        Commands::Valuate(args) => commands::valuation::run_valuate(args),
        Commands::Health(args) => commands::valuation::run_health(args, config),
        Commands::Version => Ok(serde_json::json!({
            "name": "finlens",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let format = cli.output.clone();

    match run(cli) {
        Ok(value) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
