//! Tray presentation model
//!
//! Maps the connection state to what the tray shows. Icon paths resolve
//! against an explicit asset directory.

use std::path::PathBuf;
use tailtray_core::vpn::ConnectionState;

/// What the tray shows for one state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayView {
    pub icon: PathBuf,
    pub action_label: &'static str,
    pub action_enabled: bool,
    pub tooltip: String,
}

pub struct TrayPresenter {
    asset_dir: PathBuf,
}

impl TrayPresenter {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
        }
    }

    pub fn view(&self, state: ConnectionState) -> TrayView {
        let (icon, action_label, action_enabled) = match state {
            ConnectionState::Disconnected => ("disconnected.png", "Connect", true),
            ConnectionState::Connecting => ("connecting.png", "Connecting...", false),
            ConnectionState::Connected => ("connected.png", "Disconnect", true),
        };

        TrayView {
            icon: self.asset_dir.join(icon),
            action_label,
            action_enabled,
            tooltip: format!("Tailscale: {}", state),
        }
    }
}
