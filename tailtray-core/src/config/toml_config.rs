//! TOML configuration file I/O
//!
//! Handles loading and saving tray configuration to/from TOML files
//! in the user's configuration directory.

use crate::config::TrayConfig;
use crate::error::{ConfigError, TailtrayError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "TAILTRAY_CONFIG_DIR";

/// Get the default configuration directory
///
/// Returns ~/.config/tailtray, or TAILTRAY_CONFIG_DIR if set
pub fn get_config_dir() -> Result<PathBuf, TailtrayError> {
    if let Ok(config_dir) = std::env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(config_dir));
    }

    let home = std::env::var("HOME").map_err(|_| {
        TailtrayError::Config(ConfigError::IoError {
            message: "HOME environment variable not set".to_string(),
        })
    })?;

    Ok(PathBuf::from(home).join(".config").join("tailtray"))
}

/// Get the default configuration file path
pub fn get_config_path() -> Result<PathBuf, TailtrayError> {
    let config_dir = get_config_dir()?;
    Ok(config_dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from the default TOML file
///
/// A missing file yields the defaults.
pub fn load_config() -> Result<TrayConfig, TailtrayError> {
    let config_path = get_config_path()?;
    if !config_path.exists() {
        debug!("No configuration at {:?}, using defaults", config_path);
        return Ok(TrayConfig::default());
    }
    load_config_from_path(&config_path)
}

/// Load configuration from a specific TOML file
pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<TrayConfig, TailtrayError> {
    let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TailtrayError::Config(ConfigError::LoadFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        }),
        _ => TailtrayError::Config(ConfigError::IoError {
            message: format!("Failed to read config file: {}", e),
        }),
    })?;

    let config: TrayConfig = toml::from_str(&contents).map_err(|e| {
        TailtrayError::Config(ConfigError::IoError {
            message: format!("Failed to parse TOML: {}", e),
        })
    })?;

    config
        .validate()
        .map_err(|e| TailtrayError::Config(ConfigError::ValidationError { message: e }))?;

    info!(
        "Loaded configuration: tool={}, poll_interval={}s, accept_routes={}",
        config.tool, config.poll_interval_secs, config.accept_routes
    );

    Ok(config)
}

/// Save configuration to a specific TOML file
pub fn save_config_to_path<P: AsRef<Path>>(config: &TrayConfig, path: P) -> Result<(), TailtrayError> {
    config
        .validate()
        .map_err(|e| TailtrayError::Config(ConfigError::ValidationError { message: e }))?;

    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            TailtrayError::Config(ConfigError::IoError {
                message: format!("Failed to create config directory: {}", e),
            })
        })?;
    }

    let contents = toml::to_string_pretty(config)?;

    std::fs::write(&path, contents).map_err(|_e| {
        TailtrayError::Config(ConfigError::SaveFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        })
    })?;

    info!("Saved configuration to {:?}", path.as_ref());
    Ok(())
}
