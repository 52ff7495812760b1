//! Desktop menu entry installation
//!
//! Copies the `tailtray.desktop` template from the asset directory into the
//! user's applications directory, pointing it at the install location.

use crate::error::TailtrayError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Template and installed file name
pub const DESKTOP_FILE_NAME: &str = "tailtray.desktop";

/// Replaced with the asset directory in the template
pub const INSTALL_PATH_PLACEHOLDER: &str = "$INSTALL_PATH$";

/// What the installer did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(PathBuf),
    AlreadyPresent(PathBuf),
    TemplateMissing(PathBuf),
    Unsupported,
}

/// `~/.local/share/applications`
pub fn default_applications_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("applications")
    })
}

/// Install the menu entry unless one exists; Linux only
pub fn install_if_necessary(asset_dir: &Path) -> Result<InstallOutcome, TailtrayError> {
    if !cfg!(target_os = "linux") {
        warn!("No menu shortcut will be created - only supported on linux for now");
        return Ok(InstallOutcome::Unsupported);
    }

    let Some(applications_dir) = default_applications_dir() else {
        warn!("HOME is not set, not installing a desktop file");
        return Ok(InstallOutcome::Unsupported);
    };

    install_desktop_entry(asset_dir, &applications_dir)
}

/// Install the menu entry into `applications_dir`
pub fn install_desktop_entry(
    asset_dir: &Path,
    applications_dir: &Path,
) -> Result<InstallOutcome, TailtrayError> {
    let target = applications_dir.join(DESKTOP_FILE_NAME);
    if target.is_file() {
        info!(".desktop file already found at: {:?}", target);
        return Ok(InstallOutcome::AlreadyPresent(target));
    }

    let source = asset_dir.join(DESKTOP_FILE_NAME);
    if !source.is_file() {
        warn!("Unable to install desktop file: not found at {:?}", source);
        return Ok(InstallOutcome::TemplateMissing(source));
    }

    let template = fs::read_to_string(&source)?;
    let rendered = render_template(&template, asset_dir);

    fs::create_dir_all(applications_dir)?;
    fs::write(&target, rendered)?;
    info!("Installed desktop file at: {:?}", target);

    Ok(InstallOutcome::Installed(target))
}

/// Substitute the install path on every line
pub fn render_template(template: &str, install_path: &Path) -> String {
    let install_path = install_path.to_string_lossy();
    template
        .lines()
        .map(|line| format!("{}\n", line.replace(INSTALL_PATH_PLACEHOLDER, &install_path)))
        .collect()
}
