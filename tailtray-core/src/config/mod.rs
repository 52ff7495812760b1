//! Configuration module
//!
//! Handles loading and saving tray configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod toml_config;

/// Default login URL prefix emitted by `tailscale up`
pub const DEFAULT_LOGIN_URL_PREFIX: &str = "https://login.tailscale.com";

/// Environment variable enabling self-update
pub const AUTOUPDATE_ENV: &str = "TAILTRAY_AUTOUPDATE";

const PID_FILE_NAME: &str = "tailtray.pid";

/// Tray configuration structure
///
/// Every field has a default, so an absent or partial file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrayConfig {
    /// External VPN tool binary
    pub tool: String,

    /// Seconds between two status polls
    pub poll_interval_secs: u64,

    /// User passed as `--operator=`; `$USER` when unset, disabled when empty
    pub operator: Option<String>,

    /// Append `--accept-routes` when bringing the VPN up
    pub accept_routes: bool,

    /// Lines starting with this prefix are opened during `up`
    pub login_url_prefix: String,

    /// Platform URL/file opener
    pub opener: String,

    /// Single-instance PID file
    pub pid_file: Option<PathBuf>,

    /// Directory holding tray icons and the desktop entry template
    pub asset_dir: Option<PathBuf>,

    /// Self-update settings
    pub update: UpdateConfig,
}

/// Git based self-update settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Enable self-update without the env flag or CLI switch
    pub enabled: bool,

    /// Git checkout to pull
    pub repo_dir: Option<PathBuf>,
}

impl TrayConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.tool.trim().is_empty() {
            return Err("Tool cannot be empty".to_string());
        }

        if self.opener.trim().is_empty() {
            return Err("Opener cannot be empty".to_string());
        }

        if self.poll_interval_secs < 1 || self.poll_interval_secs > 3600 {
            return Err(format!(
                "Poll interval must be between 1 and 3600 seconds, got {}",
                self.poll_interval_secs
            ));
        }

        match url::Url::parse(&self.login_url_prefix) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(format!(
                    "Login URL prefix must be http or https, got: {}",
                    url.scheme()
                ))
            }
            Err(e) => return Err(format!("Invalid login URL prefix: {}", e)),
        }

        Ok(())
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Resolve the operator user
    pub fn operator(&self) -> Option<String> {
        let user = match &self.operator {
            Some(user) => user.clone(),
            None => std::env::var("USER").unwrap_or_default(),
        };
        let user = user.trim();
        (!user.is_empty()).then(|| user.to_string())
    }

    /// Resolve the PID file path
    ///
    /// Uses XDG_RUNTIME_DIR if available, otherwise /tmp
    pub fn pid_file_path(&self) -> PathBuf {
        if let Some(path) = &self.pid_file {
            return path.clone();
        }
        match std::env::var("XDG_RUNTIME_DIR") {
            Ok(runtime_dir) if !runtime_dir.is_empty() => Path::new(&runtime_dir).join(PID_FILE_NAME),
            _ => Path::new("/tmp").join(PID_FILE_NAME),
        }
    }

    /// Resolve the asset directory
    ///
    /// Falls back to the directory of the running executable.
    pub fn asset_dir_path(&self) -> PathBuf {
        if let Some(dir) = &self.asset_dir {
            return dir.clone();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve the git checkout pulled by the self-update
    ///
    /// Defaults to the asset directory; git finds the enclosing checkout.
    pub fn update_repo_dir(&self) -> PathBuf {
        self.update
            .repo_dir
            .clone()
            .unwrap_or_else(|| self.asset_dir_path())
    }
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            tool: "tailscale".to_string(),
            poll_interval_secs: 5,
            operator: None,
            accept_routes: true,
            login_url_prefix: DEFAULT_LOGIN_URL_PREFIX.to_string(),
            opener: "xdg-open".to_string(),
            pid_file: None,
            asset_dir: None,
            update: UpdateConfig::default(),
        }
    }
}

/// Interpret an environment flag value
///
/// `1`, `yes`, `enabled` and `true` (any case) are on, everything else is off.
pub fn flag_enabled(value: Option<&str>) -> bool {
    value
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "yes" | "enabled" | "true"))
        .unwrap_or(false)
}

/// Whether self-update is requested through the environment
pub fn autoupdate_from_env() -> bool {
    flag_enabled(std::env::var(AUTOUPDATE_ENV).ok().as_deref())
}
