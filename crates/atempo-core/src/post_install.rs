//! Framework post-install steps with soft failure
//!
//! Three sub-steps run in order: environment file setup, starting local
//! services, and framework setup commands. Each yields an [`Outcome`]; a
//! failure is recorded as a warning and the next sub-step still runs. The
//! orchestrator itself never fails.

use crate::compose::{find_compose_file, ComposeGenerator};
use crate::config::Options;
use crate::framework::FrameworkProfile;
use crate::runtime::{CommandSpec, DockerProbe};
use crate::steps::{Outcome, Step, StepLogger};
use crate::templates::copier::ROOT_CONFIG_FILE;
use crate::templates::metadata::Metadata;
use crate::templates::substitute::{substitute, substitute_str, Variables};
use std::path::Path;

/// The ordered post-install sub-steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostInstallStep {
    EnvSetup,
    StartServices,
    FrameworkSetup,
}

impl PostInstallStep {
    pub const ALL: [PostInstallStep; 3] = [
        PostInstallStep::EnvSetup,
        PostInstallStep::StartServices,
        PostInstallStep::FrameworkSetup,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PostInstallStep::EnvSetup => "Preparing environment file",
            PostInstallStep::StartServices => "Starting services",
            PostInstallStep::FrameworkSetup => "Running framework setup",
        }
    }
}

/// Outcomes of every post-install sub-step, in execution order
#[derive(Debug, Default)]
pub struct PostInstallReport {
    pub outcomes: Vec<(String, Outcome)>,
    /// One finished step per sub-step
    pub steps: Vec<Step>,
}

impl PostInstallReport {
    fn record(&mut self, name: impl Into<String>, outcome: Outcome) {
        self.outcomes.push((name.into(), outcome));
    }

    /// `(sub-step, message)` for everything that did not succeed
    pub fn warnings(&self) -> Vec<(String, String)> {
        self.outcomes
            .iter()
            .filter_map(|(name, outcome)| outcome.message().map(|m| (name.clone(), m)))
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|(_, o)| o.is_success())
    }
}

/// Key assigned by an env line, and whether the line is commented out
fn env_key(line: &str) -> Option<(&str, bool)> {
    let trimmed = line.trim_start();
    let commented = trimmed.starts_with('#');
    let assignment = trimmed.trim_start_matches('#').trim_start();
    let (key, _) = assignment.split_once('=')?;
    let key = key.trim();
    (!key.is_empty()).then_some((key, commented))
}

/// Rewrite `KEY=value` lines of an env file.
///
/// Every live assignment of a key is replaced. A commented-out `# KEY=` line
/// is uncommented only when the key has no live assignment, and only the
/// first such line. Keys that appear nowhere are appended.
pub fn rewrite_env(contents: &str, overrides: &[(String, String)]) -> String {
    let position = |key: &str| overrides.iter().position(|(name, _)| name == key);

    // A key with a live assignment never uncomments or appends
    let mut applied = vec![false; overrides.len()];
    for (key, commented) in contents.lines().filter_map(env_key) {
        if let (Some(i), false) = (position(key), commented) {
            applied[i] = true;
        }
    }

    let mut lines: Vec<String> = contents
        .lines()
        .map(|line| {
            let Some((key, commented)) = env_key(line) else {
                return line.to_string();
            };
            match position(key) {
                Some(i) if !commented => format!("{}={}", overrides[i].0, overrides[i].1),
                Some(i) if !applied[i] => {
                    applied[i] = true;
                    format!("{}={}", overrides[i].0, overrides[i].1)
                }
                _ => line.to_string(),
            }
        })
        .collect();

    for (i, (key, value)) in overrides.iter().enumerate() {
        if !applied[i] {
            lines.push(format!("{}={}", key, value));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Runs the post-install sub-steps for one project
pub struct PostInstall<'a> {
    pub profile: Option<&'static dyn FrameworkProfile>,
    pub metadata: &'a Metadata,
    pub project_dir: &'a Path,
    pub vars: &'a Variables,
    pub logger: &'a dyn StepLogger,
    pub compose: &'a dyn ComposeGenerator,
    pub docker: &'a dyn DockerProbe,
    pub options: &'a Options,
}

impl PostInstall<'_> {
    pub async fn run(&self) -> PostInstallReport {
        let mut report = PostInstallReport::default();

        for sub_step in PostInstallStep::ALL {
            let mut step = self.logger.start_step(sub_step.label());
            match sub_step {
                PostInstallStep::EnvSetup => {
                    let outcome = self.env_setup().await;
                    self.finish(&mut step, &outcome);
                    report.record(sub_step.label(), outcome);
                }
                PostInstallStep::StartServices => {
                    let outcome = self.start_services(&step).await;
                    self.finish(&mut step, &outcome);
                    report.record(sub_step.label(), outcome);
                }
                PostInstallStep::FrameworkSetup => {
                    let outcomes = self.framework_setup(&step).await;
                    let failed = outcomes.iter().filter(|(_, o)| !o.is_success()).count();
                    if failed == 0 {
                        self.logger.complete_step(&mut step);
                    } else {
                        self.logger.warning_step(
                            &mut step,
                            &format!("{} of {} setup commands failed", failed, outcomes.len()),
                        );
                    }
                    for (name, outcome) in outcomes {
                        report.record(name, outcome);
                    }
                }
            }
            report.steps.push(step);
        }

        report
    }

    fn finish(&self, step: &mut Step, outcome: &Outcome) {
        match outcome.message() {
            None => self.logger.complete_step(step),
            Some(message) => self.logger.warning_step(step, &message),
        }
    }

    async fn env_setup(&self) -> Outcome {
        let env_path = self.project_dir.join(".env");
        let template = self.metadata.env_template();

        if !env_path.exists() {
            let template_path = self.project_dir.join(template);
            if !template_path.is_file() {
                return Outcome::Warning(format!("no .env or {} found; environment not configured", template));
            }
            if let Err(e) = tokio::fs::copy(&template_path, &env_path).await {
                return Outcome::fatal(e);
            }
        }

        let Some(profile) = self.profile else {
            return Outcome::Success;
        };
        let overrides: Vec<(String, String)> = profile
            .env_overrides()
            .iter()
            .map(|(k, v)| (k.to_string(), substitute_str(v, self.vars)))
            .collect();

        let contents = match tokio::fs::read_to_string(&env_path).await {
            Ok(contents) => contents,
            Err(e) => return Outcome::fatal(e),
        };
        match tokio::fs::write(&env_path, rewrite_env(&contents, &overrides)).await {
            Ok(()) => Outcome::Success,
            Err(e) => Outcome::fatal(e),
        }
    }

    async fn start_services(&self, step: &Step) -> Outcome {
        if !self.options.start_services {
            tracing::info!("service startup disabled");
            return Outcome::Success;
        }
        if let Some(problem) = self.docker.problem().await {
            tracing::debug!(%problem, "docker unavailable");
            return Outcome::Warning("Docker not available - start services manually".to_string());
        }

        let compose_file = match find_compose_file(self.project_dir) {
            Some(path) => path,
            None if self.project_dir.join(ROOT_CONFIG_FILE).is_file() => {
                match self.compose.generate_compose_file(self.project_dir) {
                    Ok(path) => path,
                    Err(e) => {
                        return Outcome::Warning(format!(
                            "could not generate compose file ({}) - start services manually",
                            e
                        ))
                    }
                }
            }
            None => {
                return Outcome::Warning("no compose file found - start services manually".to_string())
            }
        };

        let argv = vec![
            "docker".to_string(),
            "compose".to_string(),
            "-f".to_string(),
            compose_file.display().to_string(),
            "up".to_string(),
            "-d".to_string(),
        ];
        let Some(spec) = CommandSpec::from_argv(&argv, self.project_dir) else {
            return Outcome::Warning("empty compose command".to_string());
        };
        match self
            .logger
            .run_command(step, &spec.with_timeout(self.options.command_timeout))
            .await
        {
            Ok(()) => Outcome::Success,
            Err(e) => Outcome::Warning(format!(
                "could not start services ({}) - run `docker compose up -d` manually",
                e
            )),
        }
    }

    async fn framework_setup(&self, step: &Step) -> Vec<(String, Outcome)> {
        let commands = match &self.metadata.setup_commands {
            Some(commands) => commands.clone(),
            None => self.profile.map(|p| p.setup_commands()).unwrap_or_default(),
        };

        let mut outcomes = Vec::with_capacity(commands.len());
        for command in commands {
            let argv = substitute(&command, self.vars);
            let Some(spec) = CommandSpec::from_argv(&argv, self.project_dir) else {
                outcomes.push(("setup".to_string(), Outcome::Warning("empty setup command skipped".to_string())));
                continue;
            };
            let spec = spec.with_timeout(self.options.command_timeout);
            let name = spec.display();
            let outcome = match self.logger.run_command(step, &spec).await {
                Ok(()) => Outcome::Success,
                Err(e) => {
                    tracing::warn!(command = %name, error = %e, "setup command failed, continuing");
                    Outcome::Warning(e.to_string())
                }
            };
            outcomes.push((name, outcome));
        }
        outcomes
    }
}
