//! On-demand VPN operations
//!
//! Bring-up, take-down and the web interface, each a blocking call of the
//! external tool. Non-zero exit codes never propagate as errors: they are
//! turned into a disconnected notification or a log line.

use crate::process::{CommandRunner, UrlOpener};
use crate::vpn::{ConnectionObserver, ToolCommands, ToolLock, UrlMatcher, WebUrlScanner};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Drives the VPN tool on user request
pub struct VpnController {
    runner: Arc<dyn CommandRunner>,
    opener: Arc<dyn UrlOpener>,
    observer: Arc<dyn ConnectionObserver>,
    lock: ToolLock,
    commands: ToolCommands,
    login_matcher: Arc<dyn UrlMatcher>,
    web_matcher: Arc<dyn UrlMatcher>,
}

impl VpnController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        opener: Arc<dyn UrlOpener>,
        observer: Arc<dyn ConnectionObserver>,
        lock: ToolLock,
        commands: ToolCommands,
        login_matcher: Arc<dyn UrlMatcher>,
        web_matcher: Arc<dyn UrlMatcher>,
    ) -> Self {
        Self {
            runner,
            opener,
            observer,
            lock,
            commands,
            login_matcher,
            web_matcher,
        }
    }

    /// Report a bring-up as started without running anything
    ///
    /// Callers that do work of their own before [`bring_up`](Self::bring_up)
    /// use this so the connecting state is visible first.
    pub fn announce_connecting(&self) {
        self.observer.connecting();
    }

    /// Bring the VPN up
    ///
    /// Emits connecting before the tool starts, opens any login URL the tool
    /// prints, then emits connected on exit code 0 and disconnected otherwise.
    pub async fn bring_up(&self) -> bool {
        self.observer.connecting();

        let invocation = match self.commands.up() {
            Ok(invocation) => invocation,
            Err(e) => {
                error!("Invalid bring-up command: {}", e);
                self.observer.disconnected();
                return false;
            }
        };

        let _guard = self.lock.acquire().await;
        let mut open_login = |line: &str| {
            if let Some(found) = self.login_matcher.match_line(line) {
                info!("Opening link: {}", found.url);
                if let Err(e) = self.opener.open(&found.url) {
                    warn!("Failed to open login link: {}", e);
                }
            }
        };

        match self.runner.run_streaming(&invocation, &mut open_login).await {
            Ok(0) => {
                info!("VPN is up");
                self.observer.connected();
                true
            }
            Ok(code) => {
                warn!("{} exited with code {}", invocation, code);
                self.observer.disconnected();
                false
            }
            Err(e) => {
                error!("Failed to bring VPN up: {}", e);
                self.observer.disconnected();
                false
            }
        }
    }

    /// Take the VPN down; always ends disconnected
    pub async fn take_down(&self) {
        match self.commands.down() {
            Ok(invocation) => {
                let _guard = self.lock.acquire().await;
                match self.runner.run(&invocation).await {
                    Ok(result) if result.success() => info!("VPN is down"),
                    Ok(result) => warn!("{} exited with code {}", invocation, result.exit_code),
                    Err(e) => error!("Failed to take VPN down: {}", e),
                }
            }
            Err(e) => error!("Invalid take-down command: {}", e),
        }
        self.observer.disconnected();
    }

    /// Open the tool's web interface
    ///
    /// The primary URL is opened as soon as it is printed; the fallback only
    /// once the command exits without one. This does not take the tool lock
    /// since `web` may keep running.
    pub async fn show_web(&self) -> Option<String> {
        let invocation = match self.commands.web() {
            Ok(invocation) => invocation,
            Err(e) => {
                error!("Invalid web command: {}", e);
                return None;
            }
        };

        let mut scanner = WebUrlScanner::new(self.web_matcher.as_ref());
        let mut opened = None;
        let result = {
            let mut open_primary = |line: &str| {
                if let Some(url) = scanner.feed(line) {
                    self.open(&url);
                    opened = Some(url);
                }
            };
            self.runner.run_streaming(&invocation, &mut open_primary).await
        };

        if let Err(e) = result {
            warn!("Failed to run {}: {}", invocation, e);
        }

        if opened.is_some() {
            return opened;
        }

        match scanner.finish() {
            Some(url) => {
                self.open(&url);
                Some(url)
            }
            None => {
                warn!("Unable to determine url to open for the web interface");
                None
            }
        }
    }

    /// Whether `<tool> status` reports a logged-out node
    pub async fn is_logged_out(&self) -> bool {
        let Ok(invocation) = self.commands.status() else {
            return false;
        };
        let _guard = self.lock.acquire().await;
        match self.runner.run(&invocation).await {
            Ok(result) => result
                .lines
                .iter()
                .any(|line| line.to_lowercase().contains("logged out")),
            Err(e) => {
                warn!("Failed to check login state: {}", e);
                false
            }
        }
    }

    /// One-off status check; a launch failure counts as down
    pub async fn is_up(&self) -> bool {
        let Ok(invocation) = self.commands.status() else {
            return false;
        };
        let _guard = self.lock.acquire().await;
        match self.runner.run(&invocation).await {
            Ok(result) => result.success(),
            Err(e) => {
                warn!("Status check failed: {}", e);
                false
            }
        }
    }

    /// Open a URL or path, logging failures
    pub fn open(&self, target: &str) {
        if let Err(e) = self.opener.open(target) {
            warn!("Failed to open {}: {}", target, e);
        }
    }
}
