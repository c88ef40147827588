//! Named, timed pipeline steps and the logger that reports them

use crate::runtime::process::{self, CommandError, CommandSpec, Stream};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Complete,
    Warning,
    Error,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Complete => "complete",
            StepStatus::Warning => "warning",
            StepStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// Execution record for one unit of pipeline work
#[derive(Debug, Clone)]
pub struct Step {
    name: String,
    status: StepStatus,
    started_at: DateTime<Utc>,
    started: Instant,
    duration: Option<Duration>,
    error: Option<String>,
}

impl Step {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Pending,
            started_at: Utc::now(),
            started: Instant::now(),
            duration: None,
            error: None,
        }
    }

    /// Mark the step running and reset its clock
    pub fn begin(&mut self) {
        self.status = StepStatus::Running;
        self.started_at = Utc::now();
        self.started = Instant::now();
    }

    /// Record the terminal status. The first call wins.
    pub fn finish(&mut self, status: StepStatus, error: Option<String>) {
        if self.is_finished() {
            return;
        }
        self.status = status;
        self.error = error;
        self.duration = Some(self.started.elapsed());
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            StepStatus::Complete | StepStatus::Warning | StepStatus::Error
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Result of a soft-failure sub-step
#[derive(Debug)]
pub enum Outcome {
    Success,
    Warning(String),
    Fatal(Box<dyn std::error::Error + Send + Sync>),
}

impl Outcome {
    pub fn fatal(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Outcome::Fatal(Box::new(error))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Warning text for anything that did not succeed
    pub fn message(&self) -> Option<String> {
        match self {
            Outcome::Success => None,
            Outcome::Warning(reason) => Some(reason.clone()),
            Outcome::Fatal(error) => Some(error.to_string()),
        }
    }
}

/// Collaborator that reports step progress and runs external commands
#[async_trait]
pub trait StepLogger: Send + Sync {
    fn start_step(&self, name: &str) -> Step;

    fn complete_step(&self, step: &mut Step);

    fn warning_step(&self, step: &mut Step, message: &str);

    fn error_step(&self, step: &mut Step, error: &str);

    /// One line of output from a command running under `step`
    fn log_line(&self, step: &Step, stream: Stream, line: &str);

    /// Run a command, streaming its output through [`StepLogger::log_line`]
    async fn run_command(&self, step: &Step, command: &CommandSpec) -> Result<(), CommandError> {
        process::run_streaming(command, |stream, line| self.log_line(step, stream, line)).await
    }
}

/// Logger that prints step lines to stderr and mirrors them as tracing events
#[derive(Debug, Clone, Default)]
pub struct ConsoleStepLogger {
    verbose: bool,
    quiet: bool,
}

impl ConsoleStepLogger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
        }
    }

    /// Logger that only emits tracing events (used by tests and embedding callers)
    pub fn quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
        }
    }

    fn elapsed(step: &Step) -> String {
        let secs = step.duration().unwrap_or_default().as_secs_f64();
        format!("({:.1}s)", secs)
    }
}

#[async_trait]
impl StepLogger for ConsoleStepLogger {
    fn start_step(&self, name: &str) -> Step {
        let mut step = Step::new(name);
        step.begin();
        tracing::info!(step = name, "step started");
        if !self.quiet {
            eprintln!("{} {}", "->".blue(), name.bold());
        }
        step
    }

    fn complete_step(&self, step: &mut Step) {
        step.finish(StepStatus::Complete, None);
        tracing::info!(step = step.name(), duration = ?step.duration(), "step complete");
        if !self.quiet {
            eprintln!(
                "   {} {} {}",
                "done".green(),
                step.name(),
                Self::elapsed(step).dimmed()
            );
        }
    }

    fn warning_step(&self, step: &mut Step, message: &str) {
        step.finish(StepStatus::Warning, Some(message.to_string()));
        tracing::warn!(step = step.name(), reason = message, "step finished with warning");
        if !self.quiet {
            eprintln!("   {} {}", "Warning:".yellow(), message);
        }
    }

    fn error_step(&self, step: &mut Step, error: &str) {
        step.finish(StepStatus::Error, Some(error.to_string()));
        tracing::error!(step = step.name(), error, "step failed");
        if !self.quiet {
            eprintln!("   {} {}", "Error:".red(), error);
        }
    }

    fn log_line(&self, step: &Step, stream: Stream, line: &str) {
        tracing::debug!(step = step.name(), %stream, "{}", line);
        if self.verbose && !self.quiet {
            match stream {
                Stream::Stdout => eprintln!("     {}", line.dimmed()),
                Stream::Stderr => eprintln!("     {}", line.yellow()),
            }
        }
    }
}
