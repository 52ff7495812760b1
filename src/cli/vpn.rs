//! One-shot VPN commands
//!
//! The same operations the tray offers, run once from the terminal.

use crate::cli::build_controller;
use colored::Colorize;
use std::sync::Arc;
use tailtray_core::config::TrayConfig;
use tailtray_core::error::TailtrayError;
use tailtray_core::process::SystemRunner;
use tailtray_core::vpn::{ConnectionEvent, ConnectionState, ToolLock, VpnController};
use tokio::sync::mpsc;

/// Controller plus the receiving end of its notifications
struct Session {
    controller: VpnController,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
}

impl Session {
    fn new(config: &TrayConfig) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let controller = build_controller(
            config,
            Arc::new(SystemRunner::new()),
            Arc::new(events_tx),
            ToolLock::new(),
        );
        Self { controller, events }
    }

    /// Final state after draining every notification
    fn final_state(&mut self) -> Option<ConnectionState> {
        let mut last = None;
        while let Ok(event) = self.events.try_recv() {
            last = Some(ConnectionState::from(event));
        }
        last
    }
}

fn print_state(state: ConnectionState) {
    let label = match state {
        ConnectionState::Connected => state.to_string().green(),
        ConnectionState::Connecting => state.to_string().yellow(),
        ConnectionState::Disconnected => state.to_string().red(),
    };
    println!("VPN status: {}", label);
}

/// Run the VPN up command
pub async fn run_vpn_up(config: &TrayConfig) -> Result<i32, TailtrayError> {
    let mut session = Session::new(config);
    println!("Bringing {} up...", config.tool);

    let connected = session.controller.bring_up().await;
    if let Some(state) = session.final_state() {
        print_state(state);
    }

    Ok(if connected { 0 } else { 1 })
}

/// Run the VPN down command
pub async fn run_vpn_down(config: &TrayConfig) -> Result<i32, TailtrayError> {
    let mut session = Session::new(config);
    session.controller.take_down().await;
    if let Some(state) = session.final_state() {
        print_state(state);
    }
    Ok(0)
}

/// Run the VPN status command
pub async fn run_vpn_status(config: &TrayConfig, json: bool) -> Result<i32, TailtrayError> {
    let session = Session::new(config);
    let state = if session.controller.is_up().await {
        ConnectionState::Connected
    } else {
        ConnectionState::Disconnected
    };

    if json {
        let status = serde_json::json!({
            "state": state.to_string(),
            "tool": config.tool,
        });
        println!("{}", status);
    } else {
        print_state(state);
    }
    Ok(0)
}

/// Run the VPN web command
pub async fn run_vpn_web(config: &TrayConfig) -> Result<i32, TailtrayError> {
    let session = Session::new(config);
    match session.controller.show_web().await {
        Some(url) => {
            println!("Opened {}", url.cyan());
            Ok(0)
        }
        None => {
            eprintln!("Unable to determine url to open for the web interface");
            Ok(1)
        }
    }
}
