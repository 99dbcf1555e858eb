//! qbridge command-line interface.
//!
//! Runs built-in circuits against a remote quantum provider when a credential
//! is available, falling back to the local simulator otherwise, and validates
//! the measured distribution.
//!
//! ```text
//! qbridge run --circuit bell --circuit ghz3 --report summary.json
//! qbridge backends
//! qbridge compile --circuit bell --target heron
//! qbridge auth status
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::GlobalOpts;
use commands::run::RunOpts;
use commands::{auth, backends, compile, run, version};

/// qbridge - remote quantum backends with local simulation fallback
#[derive(Parser, Debug)]
#[command(name = "qbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML configuration file
    #[arg(long, env = "QBRIDGE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Provider API endpoint
    #[arg(long, env = "QBRIDGE_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Access token; overrides the environment and config file
    #[arg(long, global = true)]
    token: Option<String>,

    /// IBM Cloud instance CRN; the token is then an IBM Cloud API key
    #[arg(long, env = "IBM_SERVICE_CRN", global = true)]
    service_crn: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run circuits remotely, or locally when no backend is available
    Run {
        /// Built-in circuit (bell, ghz<N>); repeatable
        #[arg(short, long = "circuit", default_value = "bell")]
        circuits: Vec<String>,

        /// Number of shots
        #[arg(short, long)]
        shots: Option<u32>,

        /// Per-execution timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Skip credential lookup and remote discovery
        #[arg(long)]
        local_only: bool,

        /// Simulator seed
        #[arg(long)]
        seed: Option<u64>,

        /// Write the session summary as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List the local simulator and the provider's backends
    Backends,

    /// Compile a built-in circuit and print it as OpenQASM 3
    Compile {
        /// Built-in circuit (bell, ghz<N>)
        #[arg(short, long, default_value = "bell")]
        circuit: String,

        /// Target: sim, ibm, heron, eagle, or a provider backend name
        #[arg(short, long, default_value = "sim")]
        target: String,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect credentials
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
enum AuthAction {
    /// Show which credential source would be used
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let global = GlobalOpts {
        config: cli.config,
        endpoint: cli.endpoint,
        token: cli.token,
        service_crn: cli.service_crn,
    };

    let result = match cli.command {
        Commands::Run {
            circuits,
            shots,
            timeout_ms,
            local_only,
            seed,
            report,
        } => {
            let opts = RunOpts {
                circuits,
                shots,
                timeout_ms,
                local_only,
                seed,
                report,
            };
            run::execute(&global, &opts).await
        }

        Commands::Backends => backends::execute(&global).await,

        Commands::Compile {
            circuit,
            target,
            output,
        } => compile::execute(&global, &circuit, &target, output.as_ref()).await,

        Commands::Auth { action } => match action {
            AuthAction::Status => auth::execute_status(&global),
        },

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
