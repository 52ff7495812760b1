//! Desktop notifications

use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

/// Shows short messages to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Uses `notify-send` when it is on PATH, the log otherwise
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    notify_send: Option<PathBuf>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        let notify_send = which::which("notify-send").ok();
        if notify_send.is_none() {
            info!("notify-send not found, notifications go to the log");
        }
        Self { notify_send }
    }

    /// Log-only notifier
    pub fn log_only() -> Self {
        Self { notify_send: None }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!("{}: {}", title, body);

        let Some(program) = &self.notify_send else {
            return;
        };

        let spawned = Command::new(program)
            .args(["--app-name=tailtray", title, body])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    handle.spawn(async move {
                        let _ = child.wait().await;
                    });
                }
            }
            Err(e) => warn!("Failed to run notify-send: {}", e),
        }
    }
}
