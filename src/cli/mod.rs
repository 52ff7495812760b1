//! CLI command implementations
//!
//! This module contains the implementation of all CLI subcommands.

pub mod install;
pub mod run;
pub mod vpn;

use std::sync::Arc;
use tailtray_core::config::TrayConfig;
use tailtray_core::process::{CommandRunner, SystemOpener};
use tailtray_core::vpn::{
    ConnectionObserver, LoginUrlMatcher, ToolCommands, ToolLock, VpnController, WebUrlMatcher,
};

/// Wire a controller from configuration
pub fn build_controller(
    config: &TrayConfig,
    runner: Arc<dyn CommandRunner>,
    observer: Arc<dyn ConnectionObserver>,
    lock: ToolLock,
) -> VpnController {
    VpnController::new(
        runner,
        Arc::new(SystemOpener::new(config.opener.clone())),
        observer,
        lock,
        ToolCommands::from_config(config),
        Arc::new(LoginUrlMatcher::new(config.login_url_prefix.clone())),
        Arc::new(WebUrlMatcher::new()),
    )
}
