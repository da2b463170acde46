use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use super::{Calculator, evaluate, run_http_server};
use crate::core::EngineConfig;

#[derive(Parser, Debug)]
#[command(
    name = "wealthcalc",
    version,
    about = "Financial planning calculators: SIP, SWP, retirement, goals and risk profiling"
)]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "WEALTHCALC_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct EngineArgs {
    #[arg(long, env = "WEALTHCALC_SOLVER_TOLERANCE", global = true)]
    solver_tolerance: Option<f64>,
    #[arg(long, env = "WEALTHCALC_SOLVER_MAX_ITERATIONS", global = true)]
    solver_max_iterations: Option<u32>,
    #[arg(long, env = "WEALTHCALC_SWP_MAX_MONTHS", global = true)]
    swp_max_months: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the calculators over HTTP
    Serve {
        #[arg(long, env = "WEALTHCALC_HOST", default_value = "0.0.0.0")]
        host: IpAddr,
        #[arg(short, long, env = "WEALTHCALC_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Evaluate one calculator against a JSON payload and print the result
    Calc {
        #[arg(value_enum)]
        calculator: Calculator,
        /// Payload file; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn build_engine_config(args: &EngineArgs) -> Result<EngineConfig, String> {
    let defaults = EngineConfig::default();
    let config = EngineConfig {
        solver_tolerance: args.solver_tolerance.unwrap_or(defaults.solver_tolerance),
        solver_max_iterations: args
            .solver_max_iterations
            .unwrap_or(defaults.solver_max_iterations),
        swp_max_months: args.swp_max_months.unwrap_or(defaults.swp_max_months),
        ..defaults
    };
    config.validate()?;
    Ok(config)
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_payload(input: Option<&PathBuf>) -> Result<serde_json::Value, String> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("cannot read stdin: {e}"))?;
            buf
        }
    };
    serde_json::from_str(&raw).map_err(|e| format!("Invalid JSON payload: {e}"))
}

/// Entry point for the binary; returns the process exit code.
pub async fn run(cli: Cli) -> i32 {
    init_tracing(&cli.log_level);

    let config = match build_engine_config(&cli.engine) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("Configuration error: {msg}");
            return 2;
        }
    };
    tracing::debug!(?config, "engine configuration loaded");

    match cli.command {
        Command::Serve { host, port } => {
            let addr = SocketAddr::new(host, port);
            if let Err(e) = run_http_server(addr, config).await {
                eprintln!("Server error: {e}");
                return 1;
            }
            0
        }
        Command::Calc { calculator, input } => {
            let result = read_payload(input.as_ref()).and_then(|payload| {
                evaluate(calculator, payload, &config).map_err(|e| e.to_string())
            });
            match result.and_then(|value| {
                serde_json::to_string_pretty(&value).map_err(|e| e.to_string())
            }) {
                Ok(json) => {
                    println!("{json}");
                    0
                }
                Err(msg) => {
                    eprintln!("{msg}");
                    1
                }
            }
        }
    }
}
