//! linerpc CLI
//!
//! Entry point for the `linerpc` command-line tool.
//!
//! - `linerpc serve`: serve the demo procedures on stdin/stdout
//! - `linerpc call <procedure>`: spawn a host, make one call, print the result
//!
//! Logs go to stderr; stdout carries protocol lines (serve) or the call
//! result (call).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use linerpc::demo::demo_registry;
use linerpc::{CallError, CallRequest, CliConfig, HostCommand, HostProcess, MalformedLinePolicy, RpcHost};
use serde_json::{Map, Value};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "linerpc")]
#[command(about = "Line-delimited JSON-RPC procedure host and caller", version)]
struct Cli {
    /// Path to config file (default: ~/.config/linerpc/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the demo procedures on stdin/stdout
    Serve {
        /// What to do with malformed request lines (fail, reply)
        #[arg(long)]
        malformed_lines: Option<MalformedLinePolicy>,

        /// Treat whitespace-only lines as malformed instead of skipping them
        #[arg(long)]
        keep_blank_lines: bool,
    },

    /// Call a procedure on a spawned host and print its result as JSON
    Call {
        /// Procedure name
        procedure: String,

        /// Positional arguments as a JSON array
        #[arg(long, default_value = "[]")]
        args: String,

        /// Named arguments as a JSON object
        #[arg(long, default_value = "{}")]
        kwargs: String,

        /// Host command to spawn (after --); defaults to the config file's
        /// [host] command, then `linerpc serve`
        #[arg(last = true)]
        host: Vec<String>,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = match CliConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Serve {
            malformed_lines,
            keep_blank_lines,
        } => run_serve(&config, malformed_lines, keep_blank_lines),
        Commands::Call {
            procedure,
            args,
            kwargs,
            host,
        } => run_call(&config, procedure, &args, &kwargs, &host),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("linerpc=info,linerpc_host=info,warn"));

    // stdout is reserved for protocol lines
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .init();
}

fn run_serve(
    config: &CliConfig,
    malformed_lines: Option<MalformedLinePolicy>,
    keep_blank_lines: bool,
) -> ExitCode {
    let skip_blank_lines = if keep_blank_lines { Some(false) } else { None };
    let host_config = config.host_config(malformed_lines, skip_blank_lines);

    let host = RpcHost::with_config(demo_registry(), host_config);
    info!(
        procedures = ?host.registry().names(),
        malformed_lines = %host.config().malformed_lines,
        skip_blank_lines = host.config().skip_blank_lines,
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    match host.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Host terminated: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_call(config: &CliConfig, procedure: String, args: &str, kwargs: &str, host: &[String]) -> ExitCode {
    let args: Vec<Value> = match serde_json::from_str(args) {
        Ok(args) => args,
        Err(e) => {
            error!("--args must be a JSON array: {}", e);
            return ExitCode::from(2);
        }
    };
    let kwargs: Map<String, Value> = match serde_json::from_str(kwargs) {
        Ok(kwargs) => kwargs,
        Err(e) => {
            error!("--kwargs must be a JSON object: {}", e);
            return ExitCode::from(2);
        }
    };

    let fallback = match std::env::current_exe() {
        Ok(exe) => HostCommand::new(exe.to_string_lossy()).arg("serve"),
        Err(_) => HostCommand::new(env!("CARGO_PKG_NAME")).arg("serve"),
    };
    let command = config.host_command(host, fallback);

    let request = CallRequest {
        procedure,
        args,
        kwargs,
    };

    let outcome = HostProcess::spawn(&command).and_then(|mut process| {
        let result = process.caller().call(&request);
        process.shutdown()?;
        result
    });

    match outcome {
        Ok(result) => {
            println!("{}", result);
            ExitCode::SUCCESS
        }
        Err(CallError::Remote { message }) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Call failed: {}", e);
            ExitCode::from(2)
        }
    }
}
