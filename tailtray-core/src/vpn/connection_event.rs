//! Connection transition events
//!
//! Defines the notifications emitted by the status poller and by the
//! bring-up/take-down operations, and the observer they are delivered to.

use tokio::sync::mpsc;
use tracing::warn;

/// Connection transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Bring-up started
    Connecting,

    /// The VPN became connected
    Connected,

    /// The VPN became disconnected
    Disconnected,
}

impl ConnectionEvent {
    /// Event matching a status observation
    pub fn from_up(up: bool) -> Self {
        if up {
            ConnectionEvent::Connected
        } else {
            ConnectionEvent::Disconnected
        }
    }
}

/// Receives connection transitions
///
/// Implementations must not block; they are called from the tasks running
/// the external tool.
pub trait ConnectionObserver: Send + Sync {
    fn notify(&self, event: ConnectionEvent);

    fn connecting(&self) {
        self.notify(ConnectionEvent::Connecting);
    }

    fn connected(&self) {
        self.notify(ConnectionEvent::Connected);
    }

    fn disconnected(&self) {
        self.notify(ConnectionEvent::Disconnected);
    }
}

/// Funnels every transition into one channel read by a single writer
impl ConnectionObserver for mpsc::UnboundedSender<ConnectionEvent> {
    fn notify(&self, event: ConnectionEvent) {
        if self.send(event).is_err() {
            warn!("Dropped {:?}, connection tracker is gone", event);
        }
    }
}
