//! Line-streaming subprocess runner
//!
//! Runs an external command with stdout and stderr merged into a single
//! pipe and hands each line to the caller as soon as it is read.

use crate::error::ProcessError;
use crate::process::{Invocation, InvocationResult};
use async_trait::async_trait;
use std::os::fd::OwnedFd;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::unix::pipe;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Runs external commands
///
/// Implementations must deliver lines in the order the process produced
/// them and only return the exit code once every line was delivered.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `invocation`, passing every output line to `on_line`
    ///
    /// Returns the exit code. A non-zero code is not an error.
    async fn run_streaming(
        &self,
        invocation: &Invocation,
        on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
    ) -> Result<i32, ProcessError>;

    /// Run `invocation` and collect its output lines
    async fn run(&self, invocation: &Invocation) -> Result<InvocationResult, ProcessError> {
        let mut lines = Vec::new();
        let mut collect = |line: &str| lines.push(line.to_string());
        let exit_code = self.run_streaming(invocation, &mut collect).await?;
        Ok(InvocationResult { lines, exit_code })
    }
}

/// Runs commands as real child processes
///
/// Cancelling the shutdown token kills any in-flight child and makes the
/// pending call return [`ProcessError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    shutdown: CancellationToken,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner bound to a shutdown token
    pub fn with_shutdown(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }

    /// Spawn the child with both output streams writing into one pipe
    fn spawn_merged(invocation: &Invocation) -> Result<(tokio::process::Child, pipe::Receiver), ProcessError> {
        let program = invocation.program();
        let launch_failed = |e: std::io::Error| ProcessError::LaunchFailed {
            program: program.to_string(),
            reason: e.to_string(),
        };

        let (reader, writer) = std::io::pipe().map_err(launch_failed)?;
        let stderr_writer = writer.try_clone().map_err(launch_failed)?;

        let mut command = Command::new(program);
        command
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr_writer)
            .kill_on_drop(true);
        if let Some(dir) = invocation.current_dir() {
            command.current_dir(dir);
        }

        let spawned = command.spawn();
        // The write ends held by `command` must be closed or EOF never arrives.
        drop(command);
        let child = spawned.map_err(launch_failed)?;

        let receiver = pipe::Receiver::from_owned_fd(OwnedFd::from(reader)).map_err(|e| {
            ProcessError::OutputFailed {
                program: program.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok((child, receiver))
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run_streaming(
        &self,
        invocation: &Invocation,
        on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
    ) -> Result<i32, ProcessError> {
        let program = invocation.program().to_string();
        if invocation.echoes() {
            info!("Running sub-process: {}", invocation);
        } else {
            debug!("Running sub-process: {}", invocation);
        }

        let (mut child, receiver) = Self::spawn_merged(invocation)?;
        debug!(program = %program, pid = ?child.id(), "Sub-process spawned");

        let mut reader = BufReader::new(receiver);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    let _ = child.start_kill();
                    return Err(ProcessError::Cancelled { program });
                }
                read = reader.read_until(b'\n', &mut buf) => read,
            };

            match read {
                Ok(0) => break,
                Ok(_) => {
                    let line = decode_line(&buf);
                    if invocation.echoes() {
                        info!(program = %program, "{}", line);
                    }
                    on_line(&line);
                }
                Err(e) => {
                    return Err(ProcessError::OutputFailed {
                        program,
                        reason: e.to_string(),
                    })
                }
            }
        }

        let status = tokio::select! {
            _ = self.shutdown.cancelled() => {
                let _ = child.start_kill();
                return Err(ProcessError::Cancelled { program });
            }
            status = child.wait() => status.map_err(|e| ProcessError::WaitFailed {
                program: program.clone(),
                reason: e.to_string(),
            })?,
        };

        let code = exit_code(status);
        debug!(program = %program, exit_code = code, "Sub-process exited");
        Ok(code)
    }
}

/// Strip the line terminator and decode lossily
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|signal| -signal))
        .unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_line_strips_terminators() {
        assert_eq!(decode_line(b"hello\n"), "hello");
        assert_eq!(decode_line(b"hello\r\n"), "hello");
        assert_eq!(decode_line(b"partial"), "partial");
        assert_eq!(decode_line(b"  padded  \n"), "  padded  ");
        assert_eq!(decode_line(b"\n"), "");
    }

    #[test]
    fn test_decode_line_is_lossy() {
        assert_eq!(decode_line(b"bad \xff byte\n"), "bad \u{fffd} byte");
    }

    #[test]
    fn test_exit_code_from_signal() {
        // Raw wait status 9 means killed by SIGKILL
        let status = ExitStatus::from_raw(9);
        assert_eq!(exit_code(status), -9);

        // Raw wait status 3 << 8 means exited with code 3
        let status = ExitStatus::from_raw(3 << 8);
        assert_eq!(exit_code(status), 3);
    }
}
