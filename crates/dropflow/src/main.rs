mod commands;
mod exit;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "dropflow")]
#[command(about = "Start, stop and watch a DigitalOcean game server", long_about = None)]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct OutputArgs {
    /// Print the outcome as one JSON document
    #[arg(long)]
    pub json: bool,
    /// Give up after this many seconds (overrides DROPFLOW_OPERATION_TIMEOUT)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the server, point DNS at it and launch the game
    Start(OutputArgs),
    /// Shut the game down and destroy the server
    Stop(OutputArgs),
    /// Show whether a server exists
    Status(OutputArgs),
    /// Block until the cloud API is reachable
    #[command(name = "wait-online")]
    WaitOnline {
        /// Give up after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Run the push-button front panel
    Panel {
        /// BCM number of the button input
        #[arg(long, default_value_t = dropflow_panel::hardware::DEFAULT_BUTTON_PIN)]
        button_pin: u8,
        /// BCM number of the lightbox input
        #[arg(long, default_value_t = dropflow_panel::hardware::DEFAULT_LIGHT_PIN)]
        light_pin: u8,
    },
    /// Validate configuration and reachability
    Check,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries the summary or JSON document; logs go to stderr
    let directive = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive)),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(exit::code_for(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if matches!(cli.command, Commands::Version) {
        println!("dropflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    dotenv::dotenv().ok();
    let config = dropflow_config::Config::from_env()?;

    let cancel = CancellationToken::new();
    watch_ctrl_c(cancel.clone());

    match cli.command {
        Commands::Start(args) => commands::lifecycle::start(config, args, cancel).await,
        Commands::Stop(args) => commands::lifecycle::stop(config, args, cancel).await,
        Commands::Status(args) => commands::lifecycle::status(config, args, cancel).await,
        Commands::WaitOnline { timeout } => {
            commands::wait_online::handle(&config, timeout.map(Duration::from_secs), cancel).await
        }
        Commands::Panel {
            button_pin,
            light_pin,
        } => commands::panel::handle(config, button_pin, light_pin, cancel).await,
        Commands::Check => commands::check::handle(&config).await,
        Commands::Version => Ok(()),
    }
}

/// Cancel in-flight work on the first Ctrl-C.
fn watch_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, cancelling...".yellow());
            cancel.cancel();
        }
    });
}
