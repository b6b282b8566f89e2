mod error;
mod mcp;
mod project_root;
mod protocol;
mod resolver;
mod runner;
mod schema;
mod server;
mod tools;

use crate::mcp::Bridge;
use crate::resolver::ExecutableResolver;
use crate::server::{DEFAULT_WORKERS, serve};
use crate::tools::ToolRegistry;
use clap::{Parser, ValueEnum};
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// MCP server exposing karasu's formatter setup and project initialization.
#[derive(Debug, Parser)]
#[command(name = "karasu-mcp", version, about)]
struct Cli {
    /// Path to the karasu executable. Skips search-path and fallback lookup.
    #[arg(long, env = "KARASU_MCP_EXECUTABLE")]
    executable: Option<PathBuf>,

    /// Number of tool calls that may run karasu at the same time.
    #[arg(long, env = "KARASU_MCP_WORKERS", default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Verbosity level (-v, -vv, -vvv). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format on stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Plain,
    Json,
}

fn init_tracing(cli: &Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries protocol frames; logs must stay on stderr.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false);
    match cli.log_format {
        LogFormat::Plain => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_tracing(&cli) {
        eprintln!("Init error: {err}");
        return ExitCode::FAILURE;
    }

    let bridge = Bridge::new(ToolRegistry::new(), ExecutableResolver::new(cli.executable));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "karasu-mcp starting on stdio");

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    match serve(&mut reader, io::stdout(), &bridge, cli.workers) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "transport failed");
            ExitCode::FAILURE
        }
    }
}
