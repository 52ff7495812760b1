//! Core library for the tailtray utility
//!
//! This crate provides the external process runner, the VPN status poller
//! and controller, and the supporting configuration, single-instance and
//! self-update pieces.

pub mod error;

pub mod config;
pub mod desktop;
pub mod instance;
pub mod notify;
pub mod process;
pub mod update;
pub mod vpn;

/// Initialize logging infrastructure
///
/// Sets up tracing with systemd journal logging when running under systemd.
/// Otherwise logs to stderr with appropriate formatting.
pub fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    // Try to use systemd journal logging if available
    #[cfg(target_os = "linux")]
    {
        if std::env::var("JOURNAL_STREAM").is_ok() {
            let journal_layer = tracing_journald::layer()?;
            tracing_subscriber::registry()
                .with(journal_layer)
                .with(level)
                .try_init()?;
            return Ok(());
        }
    }

    // Fallback to stderr logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(level)
        .try_init()?;

    Ok(())
}
