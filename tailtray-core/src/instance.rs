//! Single-instance guard
//!
//! A PID file records the running instance. A live PID in the file means
//! another instance owns the tray; a missing, garbled or dead PID is
//! replaced with ours.

use crate::error::InstanceError;
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info, warn};

/// Holds the PID file for the lifetime of the process
#[derive(Debug)]
pub struct InstanceGuard {
    pid_file: PathBuf,
    pid: i32,
}

impl InstanceGuard {
    /// Claim the PID file, failing if another live instance holds it
    pub fn acquire(pid_file: impl Into<PathBuf>) -> Result<Self, InstanceError> {
        let pid_file = pid_file.into();
        let own_pid = process::id() as i32;
        debug!("Own PID: {}", own_pid);

        match read_pid(&pid_file)? {
            Some(existing) if existing != own_pid && is_process_alive(existing) => {
                info!("PID file {:?} held by live process {}", pid_file, existing);
                return Err(InstanceError::AlreadyRunning { pid: existing });
            }
            Some(existing) => debug!("Stale PID {} in {:?}", existing, pid_file),
            None => debug!("No usable PID file at {:?}", pid_file),
        }

        write_pid(&pid_file, own_pid)?;
        info!("Wrote PID file {:?} with PID {}", pid_file, own_pid);

        Ok(Self {
            pid_file,
            pid: own_pid,
        })
    }

    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        // Only remove the file if it still names us
        if let Ok(Some(pid)) = read_pid(&self.pid_file) {
            if pid == self.pid {
                let _ = fs::remove_file(&self.pid_file);
            }
        }
    }
}

/// Probe a PID with signal 0
///
/// EPERM means the process exists under another user.
pub fn is_process_alive(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

fn read_pid(path: &Path) -> Result<Option<i32>, InstanceError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(InstanceError::PidFile {
                path: path.to_string_lossy().to_string(),
                reason: e.to_string(),
            })
        }
    };

    match content.trim().parse::<i32>() {
        Ok(pid) => Ok(Some(pid)),
        Err(_) => {
            warn!("Ignoring invalid PID file content: {:?}", content.trim());
            Ok(None)
        }
    }
}

fn write_pid(path: &Path, pid: i32) -> Result<(), InstanceError> {
    let pid_file_error = |e: std::io::Error| InstanceError::PidFile {
        path: path.to_string_lossy().to_string(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(pid_file_error)?;
    }
    fs::write(path, pid.to_string()).map_err(pid_file_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_process_alive() {
        assert!(is_process_alive(process::id() as i32));
        assert!(!is_process_alive(99999999));
        assert!(!is_process_alive(0));
        assert!(!is_process_alive(-1));
    }

    #[test]
    fn test_drop_removes_own_pid_file() {
        let temp_dir = tempdir().unwrap();
        let pid_file = temp_dir.path().join("tailtray.pid");

        let guard = InstanceGuard::acquire(&pid_file).unwrap();
        assert!(pid_file.exists());
        drop(guard);
        assert!(!pid_file.exists());
    }

    #[test]
    fn test_drop_keeps_foreign_pid_file() {
        let temp_dir = tempdir().unwrap();
        let pid_file = temp_dir.path().join("tailtray.pid");

        let guard = InstanceGuard::acquire(&pid_file).unwrap();
        fs::write(&pid_file, "12345").unwrap();
        drop(guard);
        assert_eq!(fs::read_to_string(&pid_file).unwrap(), "12345");
    }
}
