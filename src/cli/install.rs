//! Desktop entry installation command

use tailtray_core::config::TrayConfig;
use tailtray_core::desktop::{install_if_necessary, InstallOutcome};
use tailtray_core::error::TailtrayError;

/// Run the install-desktop command
pub fn run_install_desktop(config: &TrayConfig) -> Result<i32, TailtrayError> {
    match install_if_necessary(&config.asset_dir_path())? {
        InstallOutcome::Installed(path) => {
            println!("✓ Installed desktop file at {}", path.display());
            Ok(0)
        }
        InstallOutcome::AlreadyPresent(path) => {
            println!("Desktop file already present at {}", path.display());
            Ok(0)
        }
        InstallOutcome::TemplateMissing(path) => {
            eprintln!("Desktop template not found at {}", path.display());
            Ok(1)
        }
        InstallOutcome::Unsupported => {
            eprintln!("Desktop entries are only supported on Linux");
            Ok(1)
        }
    }
}
