//! VPN connection module
//!
//! Handles VPN tool integration and connection state management.

pub mod connection_event;
pub mod controller;
pub mod output_parser;
pub mod state;
pub mod status_poller;
pub mod tool;

// Public re-exports
pub use connection_event::{ConnectionEvent, ConnectionObserver};
pub use controller::VpnController;
pub use output_parser::{LoginUrlMatcher, MatchKind, UrlMatch, UrlMatcher, WebUrlMatcher, WebUrlScanner};
pub use state::{ConnectionState, ConnectionTracker};
pub use status_poller::{EdgeDetector, StatusPoller};
pub use tool::{ToolCommands, ToolLock};
