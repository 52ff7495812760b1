//! VPN connection state management
//!
//! Holds the tri-state connection value and owns its only writer: every
//! transition arrives over one channel and is published through a watch
//! channel for readers.

use crate::vpn::ConnectionEvent;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// VPN connection states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Bring-up in progress
    Connecting,

    /// Successfully connected
    Connected,

    /// Not connected
    #[default]
    Disconnected,
}

impl From<ConnectionEvent> for ConnectionState {
    fn from(event: ConnectionEvent) -> Self {
        match event {
            ConnectionEvent::Connecting => ConnectionState::Connecting,
            ConnectionEvent::Connected => ConnectionState::Connected,
            ConnectionEvent::Disconnected => ConnectionState::Disconnected,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Single writer of the connection state
pub struct ConnectionTracker {
    events_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    state_tx: watch::Sender<ConnectionState>,
}

impl ConnectionTracker {
    /// Create a tracker
    ///
    /// Returns the tracker, the sender every writer reports through, and a
    /// receiver for state updates.
    pub fn new() -> (
        Self,
        mpsc::UnboundedSender<ConnectionEvent>,
        watch::Receiver<ConnectionState>,
    ) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::default());

        (Self { events_rx, state_tx }, events_tx, state_rx)
    }

    /// Apply one event, returning whether the state changed
    fn apply(&self, event: ConnectionEvent) -> bool {
        let next = ConnectionState::from(event);
        self.state_tx.send_if_modified(|state| {
            if *state == next {
                debug!("Connection state unchanged: {}", next);
                return false;
            }
            info!("Connection state: {} -> {}", state, next);
            *state = next;
            true
        })
    }

    /// Consume events until cancelled or every sender is dropped
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = self.events_rx.recv() => event,
            };

            match event {
                Some(event) => {
                    self.apply(event);
                }
                None => break,
            }
        }
        debug!("Connection tracker stopped");
    }
}
