//! Subprocess execution for the gatherers.
//!
//! Commands are run with piped output and a hard timeout. Pipes are drained on
//! reader threads so a chatty command cannot block on a full buffer while we
//! wait for it to exit.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Default per-command timeout (slow git operations on large repos)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Why a command did not produce usable output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("command not found: {0}")]
    NotFound(String),
    #[error("command timed out after {after_ms}ms: {program}")]
    TimedOut { program: String, after_ms: u64 },
    #[error("{program} exited with {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("failed to run {program}: {message}")]
    Io { program: String, message: String },
}

/// Something that can run an external program and hand back its stdout.
///
/// Gatherers only depend on this trait, so tests can script git and tracker
/// output without touching the system.
pub trait CommandRunner {
    /// Run `program` with `args`, returning stdout without trailing whitespace.
    /// Leading whitespace is kept: porcelain status columns depend on it.
    fn run(&self, program: &str, args: &[&str]) -> Result<String, CommandError>;

    /// Directory commands run in
    fn working_dir(&self) -> &Path;
}

/// Runs real processes in a fixed working directory
#[derive(Debug, Clone)]
pub struct SystemRunner {
    working_dir: PathBuf,
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, CommandError> {
        debug!(program, args = ?args, dir = %self.working_dir.display(), "Running command");

        let io_err = |e: io::Error| CommandError::Io {
            program: program.to_string(),
            message: e.to_string(),
        };

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    CommandError::NotFound(program.to_string())
                } else {
                    io_err(e)
                }
            })?;

        let stdout_reader = child.stdout.take().map(drain);
        let stderr_reader = child.stderr.take().map(drain);

        let status = match child.wait_timeout(self.timeout).map_err(io_err)? {
            Some(status) => status,
            None => {
                // Kill before joining readers, otherwise they wait on an open pipe
                let _ = child.kill();
                let _ = child.wait();
                warn!(program, args = ?args, "Command timed out");
                return Err(CommandError::TimedOut {
                    program: program.to_string(),
                    after_ms: self.timeout.as_millis() as u64,
                });
            }
        };

        let stdout = join(stdout_reader);
        let stderr = join(stderr_reader);

        if !status.success() {
            debug!(program, args = ?args, stderr = %stderr.trim(), "Command failed");
            return Err(CommandError::Failed {
                program: program.to_string(),
                code: status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(stdout.trim_end().to_string())
    }

    fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
