//! Platform URL/file opener

use crate::error::ProcessError;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Opens URLs or paths with the desktop's default handler
pub trait UrlOpener: Send + Sync {
    fn open(&self, target: &str) -> Result<(), ProcessError>;
}

/// Launches the configured opener (e.g. `xdg-open`) without waiting for it
#[derive(Debug, Clone)]
pub struct SystemOpener {
    program: String,
}

impl SystemOpener {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl UrlOpener for SystemOpener {
    fn open(&self, target: &str) -> Result<(), ProcessError> {
        info!("Opening: {}", target);

        let mut child = Command::new(&self.program)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ProcessError::LaunchFailed {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        // Reap the opener in the background when a runtime is available
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let program = self.program.clone();
            handle.spawn(async move {
                match child.wait().await {
                    Ok(status) if status.success() => debug!("{} finished", program),
                    Ok(status) => warn!("{} exited with {}", program, status),
                    Err(e) => warn!("Failed to wait for {}: {}", program, e),
                }
            });
        }

        Ok(())
    }
}
