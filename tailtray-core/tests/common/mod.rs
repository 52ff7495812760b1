//! Test doubles for the external tool and the URL opener

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use tailtray_core::error::ProcessError;
use tailtray_core::process::{CommandRunner, Invocation, UrlOpener};
use tokio_util::sync::CancellationToken;

/// Scripted outcome of one invocation
#[derive(Debug, Clone)]
pub enum Reply {
    Exit { lines: Vec<String>, code: i32 },
    LaunchFailure,
}

impl Reply {
    pub fn exit(code: i32) -> Self {
        Reply::Exit {
            lines: Vec::new(),
            code,
        }
    }

    pub fn lines(code: i32, lines: &[&str]) -> Self {
        Reply::Exit {
            lines: lines.iter().map(|line| line.to_string()).collect(),
            code,
        }
    }
}

/// A recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub command: String,
    pub dir: Option<PathBuf>,
}

/// Answers invocations from a script instead of running processes
#[derive(Default)]
pub struct ScriptedRunner {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Option<Reply>,
    calls: Mutex<Vec<Call>>,
    drained: Option<CancellationToken>,
}

impl ScriptedRunner {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Reply used once the script is exhausted
    pub fn with_fallback(mut self, reply: Reply) -> Self {
        self.fallback = Some(reply);
        self
    }

    /// Cancel `token` when the last scripted reply is handed out
    pub fn cancel_when_drained(mut self, token: CancellationToken) -> Self {
        self.drained = Some(token);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run_streaming(
        &self,
        invocation: &Invocation,
        on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
    ) -> Result<i32, ProcessError> {
        self.calls.lock().unwrap().push(Call {
            command: invocation.to_string(),
            dir: invocation.current_dir().map(PathBuf::from),
        });

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            let reply = replies.pop_front();
            if reply.is_some() && replies.is_empty() {
                if let Some(token) = &self.drained {
                    token.cancel();
                }
            }
            reply.or_else(|| self.fallback.clone())
        };

        match reply {
            Some(Reply::Exit { lines, code }) => {
                for line in &lines {
                    on_line(line);
                }
                Ok(code)
            }
            Some(Reply::LaunchFailure) | None => Err(ProcessError::LaunchFailed {
                program: invocation.program().to_string(),
                reason: "No such file or directory (os error 2)".to_string(),
            }),
        }
    }
}

/// Remembers every URL it was asked to open
#[derive(Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl RecordingOpener {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl UrlOpener for RecordingOpener {
    fn open(&self, target: &str) -> Result<(), ProcessError> {
        self.opened.lock().unwrap().push(target.to_string());
        Ok(())
    }
}
