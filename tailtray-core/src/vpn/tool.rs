//! VPN tool command lines and the lock serializing them

use crate::config::TrayConfig;
use crate::error::ProcessError;
use crate::process::Invocation;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Builds the `tailscale` invocations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommands {
    tool: String,
    operator: Option<String>,
    accept_routes: bool,
}

impl ToolCommands {
    pub fn new(tool: impl Into<String>, operator: Option<String>, accept_routes: bool) -> Self {
        Self {
            tool: tool.into(),
            operator,
            accept_routes,
        }
    }

    pub fn from_config(config: &TrayConfig) -> Self {
        Self::new(config.tool.clone(), config.operator(), config.accept_routes)
    }

    /// `<tool> status`, quiet since it runs every poll
    pub fn status(&self) -> Result<Invocation, ProcessError> {
        Ok(Invocation::new([self.tool.as_str(), "status"])?.quiet())
    }

    /// `<tool> up [--operator=<user>] [--accept-routes]`
    pub fn up(&self) -> Result<Invocation, ProcessError> {
        let mut argv = vec![self.tool.clone(), "up".to_string()];
        if let Some(user) = &self.operator {
            argv.push(format!("--operator={}", user));
        }
        if self.accept_routes {
            argv.push("--accept-routes".to_string());
        }
        Invocation::new(argv)
    }

    /// `<tool> down`
    pub fn down(&self) -> Result<Invocation, ProcessError> {
        Invocation::new([self.tool.as_str(), "down"])
    }

    /// `<tool> web`
    pub fn web(&self) -> Result<Invocation, ProcessError> {
        Invocation::new([self.tool.as_str(), "web"])
    }
}

/// Serializes polls, bring-up and take-down against the external tool
#[derive(Debug, Clone, Default)]
pub struct ToolLock(Arc<Mutex<()>>);

impl ToolLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other command is running
    pub async fn acquire(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.0).lock_owned().await
    }

    /// Take the lock only if it is free
    pub fn try_acquire(&self) -> Option<OwnedMutexGuard<()>> {
        Arc::clone(&self.0).try_lock_owned().ok()
    }
}
