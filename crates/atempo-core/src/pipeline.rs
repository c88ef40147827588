//! The scaffold pipeline
//!
//! `run(framework, version)` drives the stages strictly in order:
//! resolve metadata, validate the version, run the installer, copy assets,
//! post-install, finalize. The first four abort the run on failure; the last
//! two only produce warnings.

use crate::compose::ComposeGenerator;
use crate::config::Options;
use crate::error::{InstallError, ScaffoldError, ScaffoldWarning};
use crate::finalize;
use crate::installer;
use crate::post_install::PostInstall;
use crate::registry::ProjectRegistry;
use crate::runtime::{DockerProbe, SystemDocker};
use crate::steps::{Step, StepLogger};
use crate::templates::copier::{self, CopySummary};
use crate::templates::metadata::Metadata;
use crate::templates::resolver::TemplateResolver;
use crate::templates::substitute::Variables;
use std::path::{Path, PathBuf};

/// Result of a successful run
#[derive(Debug)]
pub struct RunReport {
    pub project_name: String,
    pub project_dir: PathBuf,
    pub framework: String,
    pub version: String,
    pub copied: CopySummary,
    pub steps: Vec<Step>,
    pub warnings: Vec<ScaffoldWarning>,
}

/// One scaffold run and the collaborators it uses
pub struct Pipeline {
    options: Options,
    resolver: TemplateResolver,
    logger: Box<dyn StepLogger>,
    registry: Box<dyn ProjectRegistry>,
    compose: Box<dyn ComposeGenerator>,
    docker: Box<dyn DockerProbe>,
}

impl Pipeline {
    pub fn new(
        options: Options,
        logger: Box<dyn StepLogger>,
        registry: Box<dyn ProjectRegistry>,
        compose: Box<dyn ComposeGenerator>,
    ) -> Self {
        let resolver = options.resolver();
        Self {
            options,
            resolver,
            logger,
            registry,
            compose,
            docker: Box::new(SystemDocker),
        }
    }

    /// Replace the template resolver built from the options
    pub fn with_resolver(mut self, resolver: TemplateResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace how Docker availability is checked
    pub fn with_docker_probe(mut self, docker: Box<dyn DockerProbe>) -> Self {
        self.docker = docker;
        self
    }

    /// Scaffold a project. Consumes the pipeline: collaborators live for one run.
    pub async fn run(self, framework: &str, version: &str) -> Result<RunReport, ScaffoldError> {
        let framework = framework.trim().to_ascii_lowercase();
        let version = version.trim().to_string();
        let project_dir = self.options.project_dir();
        let project_name = self.options.project_name();
        let vars = Variables::new(&project_dir, &self.options.cwd, &project_name, &version);
        let mut steps = Vec::new();
        let mut warnings = Vec::new();

        tracing::info!(%framework, %version, project = %project_dir.display(), "scaffold started");

        let mut step = self.logger.start_step("Resolving templates");
        let metadata = self.stage(&mut step, Metadata::load(&self.resolver, &framework))?;
        steps.push(step);

        let mut step = self.logger.start_step("Validating version");
        let validated = crate::templates::version::validate(&framework, &version, &metadata.min_version)
            .map_err(ScaffoldError::from);
        self.stage(&mut step, validated)?;
        steps.push(step);

        let mut step = self.logger.start_step("Installing framework");
        let installed = self.install(&metadata, &project_dir, &vars, &step).await;
        self.stage(&mut step, installed)?;
        steps.push(step);

        let mut step = self.logger.start_step("Copying template assets");
        let copied = copier::copy_assets(&self.resolver, &framework, &project_dir, &vars)
            .await
            .map_err(ScaffoldError::from);
        let copied = self.stage(&mut step, copied)?;
        steps.push(step);

        if self.options.post_install {
            let report = PostInstall {
                profile: crate::framework::profile(&framework),
                metadata: &metadata,
                project_dir: &project_dir,
                vars: &vars,
                logger: self.logger.as_ref(),
                compose: self.compose.as_ref(),
                docker: self.docker.as_ref(),
                options: &self.options,
            }
            .run()
            .await;
            warnings.extend(
                report
                    .warnings()
                    .into_iter()
                    .map(|(step, message)| ScaffoldWarning::PostInstall { step, message }),
            );
            steps.extend(report.steps);
        } else {
            tracing::info!("post-install disabled");
        }

        let mut step = self.logger.start_step("Registering project");
        match finalize::finalize(
            &metadata,
            &project_dir,
            &vars,
            self.registry.as_ref(),
            self.compose.as_ref(),
        ) {
            Ok(()) => self.logger.complete_step(&mut step),
            Err(e) => {
                let message = e.to_string();
                self.logger.warning_step(&mut step, &message);
                warnings.push(ScaffoldWarning::Finalize { message });
            }
        }
        steps.push(step);

        tracing::info!(%framework, warnings = warnings.len(), "scaffold finished");

        Ok(RunReport {
            project_name,
            project_dir,
            framework,
            version,
            copied,
            steps,
            warnings,
        })
    }

    async fn install(
        &self,
        metadata: &Metadata,
        project_dir: &Path,
        vars: &Variables,
        step: &Step,
    ) -> Result<(), ScaffoldError> {
        tokio::fs::create_dir_all(project_dir)
            .await
            .map_err(|source| InstallError::ProjectDir {
                path: project_dir.to_path_buf(),
                source,
            })?;
        installer::run_installer(
            metadata,
            project_dir,
            vars,
            self.logger.as_ref(),
            step,
            &self.options,
            self.docker.as_ref(),
        )
        .await?;
        Ok(())
    }

    /// Close `step` according to a stage result
    fn stage<T>(&self, step: &mut Step, result: Result<T, ScaffoldError>) -> Result<T, ScaffoldError> {
        match &result {
            Ok(_) => self.logger.complete_step(step),
            Err(e) => self.logger.error_step(step, &e.to_string()),
        }
        result
    }
}
