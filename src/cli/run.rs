//! Tray mode
//!
//! Claims the single-instance PID file, then runs the status poller, the
//! connection tracker and the tray host until Ctrl-C, SIGTERM or the exit
//! action.

use crate::cli::build_controller;
use crate::tray::host::{spawn_stdin_actions, TrayHost};
use crate::tray::presenter::TrayPresenter;
use std::sync::Arc;
use tailtray_core::config::{autoupdate_from_env, TrayConfig};
use tailtray_core::desktop::install_if_necessary;
use tailtray_core::error::TailtrayError;
use tailtray_core::instance::InstanceGuard;
use tailtray_core::notify::{DesktopNotifier, Notifier};
use tailtray_core::process::{CommandRunner, SystemRunner};
use tailtray_core::update::{UpdateOutcome, Updater};
use tailtray_core::vpn::{ConnectionObserver, ConnectionTracker, StatusPoller, ToolCommands, ToolLock};
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Run the tray until shutdown
pub async fn run_tray(config: TrayConfig, auto_update: bool) -> Result<i32, TailtrayError> {
    let _instance = InstanceGuard::acquire(config.pid_file_path())?;

    let asset_dir = config.asset_dir_path();
    if let Err(e) = install_if_necessary(&asset_dir) {
        warn!("Desktop file installation failed: {}", e);
    }

    let shutdown = CancellationToken::new();
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::with_shutdown(shutdown.clone()));
    let notifier: Arc<dyn Notifier> = Arc::new(DesktopNotifier::new());
    let lock = ToolLock::new();

    let (tracker, events_tx, state_rx) = ConnectionTracker::new();
    let observer: Arc<dyn ConnectionObserver> = Arc::new(events_tx);
    let tracker_task = tokio::spawn(tracker.run(shutdown.clone()));

    let controller = Arc::new(build_controller(
        &config,
        Arc::clone(&runner),
        Arc::clone(&observer),
        lock.clone(),
    ));

    let poller = StatusPoller::new(
        Arc::clone(&runner),
        observer,
        lock,
        ToolCommands::from_config(&config).status()?,
        config.poll_interval(),
    );
    let poller_task = poller.spawn(shutdown.clone());

    if auto_update || autoupdate_from_env() || config.update.enabled {
        spawn_self_update(
            Updater::new(Arc::clone(&runner), Some(config.update_repo_dir())),
            Arc::clone(&notifier),
        );
    }

    let host = TrayHost::new(controller, notifier, TrayPresenter::new(asset_dir), state_rx);
    let actions = spawn_stdin_actions(shutdown.clone());
    let host_task = tokio::spawn(host.run(actions, shutdown.clone()));

    wait_for_shutdown(&shutdown).await?;
    shutdown.cancel();

    for task in [poller_task, tracker_task, host_task] {
        if let Err(e) = task.await {
            warn!("Background task failed: {}", e);
        }
    }

    info!("tailtray stopped");
    Ok(0)
}

/// Block until a termination signal arrives or the host requests exit
async fn wait_for_shutdown(shutdown: &CancellationToken) -> Result<(), TailtrayError> {
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = shutdown.cancelled() => debug!("Shutdown requested"),
        _ = terminate.recv() => info!("Received SIGTERM"),
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Received Ctrl-C");
        }
    }
    Ok(())
}

fn spawn_self_update(updater: Updater, notifier: Arc<dyn Notifier>) {
    tokio::spawn(async move {
        match updater.auto_update().await {
            Ok(UpdateOutcome::Updated { changelog }) => {
                debug!("Changelog:\n{}", changelog);
                notifier.notify(
                    "tailtray has been updated!",
                    "Please restart to run the latest version. You may view the changelog via the tray icon menu.",
                );
            }
            Ok(UpdateOutcome::UpToDate) => debug!("No update available"),
            Err(e) => info!("Self-update skipped: {}", e),
        }
    });
}
