//! External command execution with streamed output
//!
//! stdout and stderr are drained concurrently while the child is awaited, so a
//! command that writes a lot of output never blocks on a full pipe.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {}", .code.map(|c| format!("exit code {}", c)).unwrap_or_else(|| "a signal".to_string()))]
    Failed { program: String, code: Option<i32> },

    #[error("'{program}' timed out after {seconds} seconds")]
    TimedOut { program: String, seconds: u64 },

    #[error("failed to read output of '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Which pipe a line of output came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => write!(f, "stdout"),
            Stream::Stderr => write!(f, "stderr"),
        }
    }
}

/// A fully substituted command ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    /// Build a spec from an argv list. Returns None for an empty list.
    pub fn from_argv(argv: &[String], cwd: &Path) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Command line as shown to the user
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Run a command, handing every output line to `on_line`.
///
/// Returns once the process has exited and both pipes are closed. A non-zero
/// exit status is an error. When the spec carries a timeout the child is
/// killed after it elapses.
pub async fn run_streaming<F>(spec: &CommandSpec, on_line: F) -> Result<(), CommandError>
where
    F: Fn(Stream, &str) + Sync,
{
    tracing::debug!(command = %spec.display(), cwd = %spec.cwd.display(), "spawning command");

    let mut child = TokioCommand::new(&spec.program)
        .args(&spec.args)
        .current_dir(&spec.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CommandError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let on_line = &on_line;

    let run = async {
        let (out, err, status) = tokio::join!(
            drain_lines(stdout, Stream::Stdout, on_line),
            drain_lines(stderr, Stream::Stderr, on_line),
            child.wait(),
        );
        out.and(err)
            .and(status)
            .map_err(|source| CommandError::Io {
                program: spec.program.clone(),
                source,
            })
    };

    let status = match spec.timeout {
        None => run.await?,
        Some(limit) => {
            let outcome = timeout(limit, run).await;
            match outcome {
                Ok(result) => result?,
                Err(_) => {
                    let _ = child.kill().await;
                    return Err(CommandError::TimedOut {
                        program: spec.program.clone(),
                        seconds: limit.as_secs(),
                    });
                }
            }
        }
    };

    tracing::debug!(command = %spec.display(), status = %status, "command exited");

    if status.success() {
        Ok(())
    } else {
        Err(CommandError::Failed {
            program: spec.program.clone(),
            code: status.code(),
        })
    }
}

/// Check whether a command exits successfully, discarding its output
pub async fn succeeds(program: &str, args: &[&str]) -> bool {
    TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

async fn drain_lines<R, F>(reader: Option<R>, stream: Stream, on_line: &F) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    F: Fn(Stream, &str) + Sync,
{
    let Some(reader) = reader else {
        return Ok(());
    };
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        on_line(stream, line.trim_end_matches(['\n', '\r']));
    }
}
