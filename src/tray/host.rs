//! Headless tray host
//!
//! Owns the tray view, renders it on every state change and dispatches menu
//! actions. Long operations run on their own tasks so the host keeps
//! following state updates while the tool works.

use crate::tray::presenter::TrayPresenter;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tailtray_core::notify::Notifier;
use tailtray_core::vpn::{ConnectionState, VpnController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const ABOUT_URL: &str = env!("CARGO_PKG_REPOSITORY");
const CHANGELOG_URL: &str = concat!(env!("CARGO_PKG_REPOSITORY"), "/commits");

/// Tray menu actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    ToggleConnection,
    ShowStatus,
    About,
    Changelog,
    Exit,
}

impl FromStr for TrayAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "connect" | "disconnect" | "toggle" => Ok(TrayAction::ToggleConnection),
            "status" | "web" | "click" => Ok(TrayAction::ShowStatus),
            "about" => Ok(TrayAction::About),
            "changelog" => Ok(TrayAction::Changelog),
            "exit" | "quit" => Ok(TrayAction::Exit),
            other => Err(format!("Unknown tray action: {}", other)),
        }
    }
}

pub struct TrayHost {
    controller: Arc<VpnController>,
    notifier: Arc<dyn Notifier>,
    presenter: TrayPresenter,
    state_rx: watch::Receiver<ConnectionState>,
    /// Set while a bring-up or take-down started from the tray runs
    toggle_in_flight: Arc<AtomicBool>,
}

impl TrayHost {
    pub fn new(
        controller: Arc<VpnController>,
        notifier: Arc<dyn Notifier>,
        presenter: TrayPresenter,
        state_rx: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self {
            controller,
            notifier,
            presenter,
            state_rx,
            toggle_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Render state changes and dispatch actions until shutdown
    ///
    /// A closed action source is not fatal; the host keeps rendering.
    pub async fn run(
        mut self,
        actions: mpsc::UnboundedReceiver<TrayAction>,
        shutdown: CancellationToken,
    ) {
        let mut actions = Some(actions);
        let initial = *self.state_rx.borrow_and_update();
        self.render(initial);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = self.state_rx.changed() => {
                    if changed.is_err() {
                        debug!("Connection tracker closed");
                        break;
                    }
                    let state = *self.state_rx.borrow_and_update();
                    self.render(state);
                }
                action = next_action(&mut actions) => match action {
                    Some(action) => self.handle(action, &shutdown),
                    None => {
                        debug!("Action source closed");
                        actions = None;
                    }
                },
            }
        }

        debug!("Tray host stopped");
    }

    fn render(&self, state: ConnectionState) {
        let view = self.presenter.view(state);
        info!(
            icon = %view.icon.display(),
            action = view.action_label,
            action_enabled = view.action_enabled,
            "{}",
            view.tooltip
        );
    }

    fn handle(&self, action: TrayAction, shutdown: &CancellationToken) {
        debug!("Tray action: {:?}", action);
        match action {
            TrayAction::ToggleConnection => self.toggle_connection(),
            TrayAction::ShowStatus => {
                let controller = Arc::clone(&self.controller);
                tokio::spawn(async move {
                    controller.show_web().await;
                });
            }
            TrayAction::About => self.controller.open(ABOUT_URL),
            TrayAction::Changelog => self.controller.open(CHANGELOG_URL),
            TrayAction::Exit => {
                info!("Exit requested");
                shutdown.cancel();
            }
        }
    }

    /// Start a bring-up or take-down depending on the current state
    ///
    /// At most one runs at a time; toggles arriving meanwhile are dropped.
    fn toggle_connection(&self) {
        let state = *self.state_rx.borrow();
        if state == ConnectionState::Connecting {
            debug!("Connection in progress, ignoring toggle");
            return;
        }
        if self.toggle_in_flight.swap(true, Ordering::AcqRel) {
            debug!("Toggle already in flight, ignoring");
            return;
        }

        let controller = Arc::clone(&self.controller);
        let in_flight = Arc::clone(&self.toggle_in_flight);
        match state {
            ConnectionState::Connected => {
                tokio::spawn(async move {
                    controller.take_down().await;
                    in_flight.store(false, Ordering::Release);
                });
            }
            _ => {
                controller.announce_connecting();
                let notifier = Arc::clone(&self.notifier);
                tokio::spawn(async move {
                    let mut message = "Bringing tailscale up...".to_string();
                    if controller.is_logged_out().await {
                        message.push_str("\nPlease wait for the login page to open in your browser");
                    }
                    notifier.notify("Connecting...", &message);
                    controller.bring_up().await;
                    in_flight.store(false, Ordering::Release);
                });
            }
        }
    }
}

async fn next_action(actions: &mut Option<mpsc::UnboundedReceiver<TrayAction>>) -> Option<TrayAction> {
    match actions {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Read actions from stdin, one per line
pub fn spawn_stdin_actions(shutdown: CancellationToken) -> mpsc::UnboundedReceiver<TrayAction> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => break,
                line = lines.next_line() => line,
            };

            match line {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match line.parse::<TrayAction>() {
                    Ok(action) => {
                        if tx.send(action).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("{}", e),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read actions from stdin: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tailtray_core::config::DEFAULT_LOGIN_URL_PREFIX;
    use tailtray_core::error::ProcessError;
    use tailtray_core::notify::DesktopNotifier;
    use tailtray_core::process::{CommandRunner, Invocation, UrlOpener};
    use tailtray_core::vpn::{
        ConnectionEvent, ConnectionObserver, ConnectionTracker, LoginUrlMatcher, ToolCommands, ToolLock,
        WebUrlMatcher,
    };

    /// Takes 100ms per command; `status` reports down, everything else succeeds
    #[derive(Default)]
    struct SlowRunner {
        calls: Mutex<Vec<String>>,
    }

    impl SlowRunner {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for SlowRunner {
        async fn run_streaming(
            &self,
            invocation: &Invocation,
            _on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
        ) -> Result<i32, ProcessError> {
            self.calls.lock().unwrap().push(invocation.to_string());
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(if invocation.args() == ["status"] { 1 } else { 0 })
        }
    }

    struct NoOpener;

    impl UrlOpener for NoOpener {
        fn open(&self, _target: &str) -> Result<(), ProcessError> {
            Ok(())
        }
    }

    struct Fixture {
        host: TrayHost,
        runner: Arc<SlowRunner>,
        events_tx: mpsc::UnboundedSender<ConnectionEvent>,
        state_rx: watch::Receiver<ConnectionState>,
        shutdown: CancellationToken,
    }

    fn fixture() -> Fixture {
        let (tracker, events_tx, state_rx) = ConnectionTracker::new();
        let shutdown = CancellationToken::new();
        tokio::spawn(tracker.run(shutdown.clone()));

        let runner = Arc::new(SlowRunner::default());
        let controller = VpnController::new(
            runner.clone(),
            Arc::new(NoOpener),
            Arc::new(events_tx.clone()),
            ToolLock::new(),
            ToolCommands::new("tailscale", None, false),
            Arc::new(LoginUrlMatcher::new(DEFAULT_LOGIN_URL_PREFIX)),
            Arc::new(WebUrlMatcher::new()),
        );
        let host = TrayHost::new(
            Arc::new(controller),
            Arc::new(DesktopNotifier::log_only()),
            TrayPresenter::new("/opt/tailtray"),
            state_rx.clone(),
        );

        Fixture {
            host,
            runner,
            events_tx,
            state_rx,
            shutdown,
        }
    }

    async fn wait_for(state_rx: &mut watch::Receiver<ConnectionState>, expected: ConnectionState) {
        tokio::time::timeout(Duration::from_secs(5), state_rx.wait_for(|state| *state == expected))
            .await
            .expect("state never reached")
            .unwrap();
    }

    #[tokio::test]
    async fn test_toggle_shows_connecting_before_any_command() {
        let mut f = fixture();

        f.host.handle(TrayAction::ToggleConnection, &f.shutdown);

        wait_for(&mut f.state_rx, ConnectionState::Connecting).await;
        assert!(f.runner.calls().len() <= 1);
        wait_for(&mut f.state_rx, ConnectionState::Connected).await;
        f.shutdown.cancel();
    }

    #[tokio::test]
    async fn test_double_toggle_brings_up_once() {
        let mut f = fixture();

        f.host.handle(TrayAction::ToggleConnection, &f.shutdown);
        tokio::time::sleep(Duration::from_millis(20)).await;
        f.host.handle(TrayAction::ToggleConnection, &f.shutdown);

        wait_for(&mut f.state_rx, ConnectionState::Connected).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(f.runner.calls(), vec!["tailscale status", "tailscale up"]);
        f.shutdown.cancel();
    }

    #[tokio::test]
    async fn test_toggle_while_connected_takes_down() {
        let mut f = fixture();
        f.events_tx.connected();
        wait_for(&mut f.state_rx, ConnectionState::Connected).await;

        f.host.handle(TrayAction::ToggleConnection, &f.shutdown);
        wait_for(&mut f.state_rx, ConnectionState::Disconnected).await;

        assert_eq!(f.runner.calls(), vec!["tailscale down"]);
        f.shutdown.cancel();
    }

    #[tokio::test]
    async fn test_toggle_while_connecting_is_ignored() {
        let mut f = fixture();
        f.events_tx.connecting();
        wait_for(&mut f.state_rx, ConnectionState::Connecting).await;

        f.host.handle(TrayAction::ToggleConnection, &f.shutdown);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(f.runner.calls().is_empty());
        f.shutdown.cancel();
    }

    #[tokio::test]
    async fn test_exit_action_cancels_shutdown() {
        let f = fixture();
        f.host.handle(TrayAction::Exit, &f.shutdown);
        assert!(f.shutdown.is_cancelled());
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!("connect".parse(), Ok(TrayAction::ToggleConnection));
        assert_eq!(" Disconnect ".parse(), Ok(TrayAction::ToggleConnection));
        assert_eq!("click".parse(), Ok(TrayAction::ShowStatus));
        assert_eq!("about".parse(), Ok(TrayAction::About));
        assert_eq!("changelog".parse(), Ok(TrayAction::Changelog));
        assert_eq!("QUIT".parse(), Ok(TrayAction::Exit));
        assert!("reboot".parse::<TrayAction>().is_err());
    }

    #[test]
    fn test_changelog_url_extends_repository() {
        assert!(CHANGELOG_URL.starts_with(ABOUT_URL));
        assert!(CHANGELOG_URL.ends_with("/commits"));
    }
}
