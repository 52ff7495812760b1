//! Background status polling
//!
//! Turns periodic `<tool> status` checks into edge-triggered connected /
//! disconnected notifications.

use crate::process::{CommandRunner, Invocation};
use crate::vpn::{ConnectionEvent, ConnectionObserver, ToolLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Reports an event on the first observation and on every change
#[derive(Debug, Default)]
pub struct EdgeDetector {
    last: Option<bool>,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, up: bool) -> Option<ConnectionEvent> {
        let changed = self.last != Some(up);
        self.last = Some(up);
        changed.then(|| ConnectionEvent::from_up(up))
    }
}

/// Polls the VPN status on a fixed interval
pub struct StatusPoller {
    runner: Arc<dyn CommandRunner>,
    observer: Arc<dyn ConnectionObserver>,
    lock: ToolLock,
    status: Invocation,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        observer: Arc<dyn ConnectionObserver>,
        lock: ToolLock,
        status: Invocation,
        interval: Duration,
    ) -> Self {
        Self {
            runner,
            observer,
            lock,
            status,
            interval,
        }
    }

    /// Run the poll loop on a background task
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Poll once immediately, then every interval until cancelled
    ///
    /// The first observation always produces a notification. Later ticks
    /// are skipped while another command holds the tool lock.
    #[tracing::instrument(skip_all, fields(interval = ?self.interval))]
    pub async fn run(self, cancel: CancellationToken) {
        let mut detector = EdgeDetector::new();

        let up = tokio::select! {
            _ = cancel.cancelled() => return,
            up = async {
                let _guard = self.lock.acquire().await;
                self.check().await
            } => up,
        };
        info!("Initial status: {}", if up { "up" } else { "down" });
        self.emit(detector.observe(up));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }

            let Some(_guard) = self.lock.try_acquire() else {
                debug!("Command in flight, skipping status poll");
                continue;
            };

            let up = tokio::select! {
                _ = cancel.cancelled() => break,
                up = self.check() => up,
            };
            self.emit(detector.observe(up));
        }

        debug!("Status poller stopped");
    }

    /// One status check; a launch failure counts as down
    async fn check(&self) -> bool {
        match self.runner.run(&self.status).await {
            Ok(result) => result.success(),
            Err(e) => {
                warn!("Status check failed: {}", e);
                false
            }
        }
    }

    fn emit(&self, event: Option<ConnectionEvent>) {
        if let Some(event) = event {
            info!("Status transition: {:?}", event);
            self.observer.notify(event);
        }
    }
}
