//! tailtray - Tailscale tray utility
//!
//! Polls `tailscale status`, reflects the connection in a tray model and
//! brings the tailnet up or down on request.

use clap::{Parser, Subcommand};
use tailtray_core::error::{InstanceError, TailtrayError};
use tailtray_core::{config::toml_config::load_config, init_logging};

mod cli;
mod tray;

#[derive(Parser)]
#[command(name = "tailtray")]
#[command(about = "Tray utility showing and toggling the Tailscale connection")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tray (default)
    Run {
        /// Pull the latest version with git before running
        #[arg(long)]
        auto_update: bool,
    },
    /// Bring the VPN up
    Up,
    /// Take the VPN down
    Down,
    /// Show VPN connection status
    Status {
        /// Print machine readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Open the Tailscale web interface
    Web,
    /// Install the desktop menu entry
    InstallDesktop,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let result = match load_config() {
        Ok(config) => match cli.command.unwrap_or(Commands::Run { auto_update: false }) {
            Commands::Run { auto_update } => cli::run::run_tray(config, auto_update).await,
            Commands::Up => cli::vpn::run_vpn_up(&config).await,
            Commands::Down => cli::vpn::run_vpn_down(&config).await,
            Commands::Status { json } => cli::vpn::run_vpn_status(&config, json).await,
            Commands::Web => cli::vpn::run_vpn_web(&config).await,
            Commands::InstallDesktop => cli::install::run_install_desktop(&config),
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let exit_code = match e {
                // Configuration errors (exit code 2)
                TailtrayError::Config(_) | TailtrayError::Toml(_) | TailtrayError::TomlSerialize(_) => 2,
                // Another live instance (exit code 1)
                TailtrayError::Instance(InstanceError::AlreadyRunning { .. }) => 1,
                TailtrayError::Instance(InstanceError::PidFile { .. }) => 1,
                // Runtime errors (exit code 1)
                TailtrayError::Process(_) | TailtrayError::Update(_) | TailtrayError::Io(_) => 1,
            };

            eprintln!("{}", e);
            std::process::exit(exit_code);
        }
    }
}
