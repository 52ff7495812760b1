//! Command invocations and their results

use crate::error::ProcessError;
use std::fmt;
use std::path::{Path, PathBuf};

/// An argv-style external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    echo: bool,
}

impl Invocation {
    /// Build an invocation from an argument list
    ///
    /// The first element is the program; the list must not be empty.
    pub fn new<I, S>(argv: I) -> Result<Self, ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let program = argv.next().ok_or(ProcessError::EmptyCommand)?;
        if program.trim().is_empty() {
            return Err(ProcessError::EmptyCommand);
        }

        Ok(Self {
            program,
            args: argv.collect(),
            current_dir: None,
            echo: true,
        })
    }

    /// Run the command from `dir` instead of the current directory
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Do not echo output lines to the log
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Whether output lines are echoed to the log
    pub fn echoes(&self) -> bool {
        self.echo
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Output and exit status of a finished invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// Merged stdout/stderr lines in arrival order, terminators stripped
    pub lines: Vec<String>,

    /// Exit code; a signal-terminated process reports the negated signal number
    pub exit_code: i32,
}

impl InvocationResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_argv_is_rejected() {
        assert_eq!(Invocation::new(Vec::<String>::new()), Err(ProcessError::EmptyCommand));
        assert_eq!(Invocation::new([""]), Err(ProcessError::EmptyCommand));
    }

    #[test]
    fn test_program_and_args() {
        let invocation = Invocation::new(["tailscale", "up", "--accept-routes"]).unwrap();
        assert_eq!(invocation.program(), "tailscale");
        assert_eq!(invocation.args(), ["up", "--accept-routes"]);
        assert!(invocation.echoes());
        assert_eq!(invocation.current_dir(), None);
        assert_eq!(invocation.to_string(), "tailscale up --accept-routes");
    }

    #[test]
    fn test_builders() {
        let invocation = Invocation::new(["git", "pull"]).unwrap().in_dir("/srv/repo").quiet();
        assert!(!invocation.echoes());
        assert_eq!(invocation.current_dir(), Some(Path::new("/srv/repo")));
    }
}
