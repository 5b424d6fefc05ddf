//! dpi - fuzzy productivity simulator
//!
//! Command-line interface: serve the HTTP API, run one calculation, or
//! inspect the loaded model.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use fuzzy_dpi::config::{DpiConfig, LogLevel};
use fuzzy_dpi::logging::init_tracing;
use fuzzy_dpi::model::Registry;
use fuzzy_dpi::server::run_server;
use fuzzy_dpi::simulation::{DailyInput, DpiCalculator, Simulator};

#[derive(Parser)]
#[command(name = "dpi")]
#[command(author = "Fuzzy DPI Authors")]
#[command(version)]
#[command(about = "Fuzzy productivity simulator - Mamdani inference for the daily productivity index", long_about = None)]
struct Cli {
    /// Configuration file (skips the search path)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Model definition file (.toml or .json) instead of the built-in model
    #[arg(long, global = true, value_name = "FILE")]
    model: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Calculate one day's productivity index
    Calculate {
        /// Hours of focused work
        #[arg(long)]
        focus_time: f64,

        /// Number of distractions
        #[arg(long)]
        distractions: f64,

        /// Hours slept
        #[arg(long)]
        sleep_hours: f64,

        /// Sleep quality rating (0-10)
        #[arg(long)]
        sleep_quality: f64,

        /// Workload rating (1-10)
        #[arg(long)]
        workload: f64,

        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },

    /// Print variable and rule definitions as JSON
    Metadata {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Load and validate the model, then print a summary
    Check,

    /// Print a commented default configuration file
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Config = cli.command {
        print!("{}", DpiConfig::default_config_content());
        return Ok(());
    }

    let mut config = DpiConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(model) = cli.model {
        config.model.path = Some(model);
    }
    if cli.verbose {
        config.general.log_level = LogLevel::Verbose;
    } else if cli.quiet {
        config.general.log_level = LogLevel::Quiet;
    }

    init_tracing(config.general.log_level);

    let calculator = build_calculator(&config)?;

    match cli.command {
        Command::Serve { host, port } => {
            let mut server = config.server.clone();
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            runtime.block_on(run_server(calculator, server))?;
        }

        Command::Calculate {
            focus_time,
            distractions,
            sleep_hours,
            sleep_quality,
            workload,
            pretty,
        } => {
            let input = DailyInput::new(focus_time, distractions, sleep_hours, sleep_quality, workload);
            let report = calculator
                .calculate(&input)?
                .dated(chrono::Local::now().date_naive());
            println!("{}", to_json(&report, pretty)?);
        }

        Command::Metadata { pretty } => {
            println!("{}", to_json(&calculator.metadata(), pretty)?);
        }

        Command::Check => print_summary(&calculator, &config),

        // printed before configuration is loaded
        Command::Config => {}
    }

    Ok(())
}

fn build_calculator(config: &DpiConfig) -> Result<DpiCalculator> {
    let path = config.model.path.as_deref();
    let registry = Registry::load(path).with_context(|| match path {
        Some(p) => format!("Failed to load model {}", p.display()),
        None => "Failed to load built-in model".to_string(),
    })?;

    info!(
        model = registry.name(),
        defuzzification = %config.engine.defuzzification,
        implication = %config.engine.implication,
        resolution = config.engine.resolution,
        "engine ready"
    );

    let simulator = Simulator::new(registry.into(), config.engine_settings())?;
    Ok(DpiCalculator::new(simulator)?)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("Failed to serialize result")
}

fn print_summary(calculator: &DpiCalculator, config: &DpiConfig) {
    let registry = calculator.registry();
    let source = config
        .model
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());

    println!("Model '{}' OK ({})", registry.name(), source);
    println!();
    println!("Inputs:");
    for var in registry.inputs() {
        print_variable(var);
    }
    println!("Outputs:");
    for var in registry.outputs() {
        print_variable(var);
    }
    println!();
    println!("Rules: {}", registry.rules().len());
    println!(
        "Engine: {} defuzzification, {} implication, resolution {}",
        config.engine.defuzzification, config.engine.implication, config.engine.resolution
    );
}

fn print_variable(var: &fuzzy_dpi::fuzzy::LinguisticVariable) {
    let terms: Vec<&str> = var.sets().iter().map(|s| s.term()).collect();
    println!(
        "  {:<14} [{}, {}]  {}",
        var.name(),
        var.universe().min(),
        var.universe().max(),
        terms.join(", ")
    );
}
