//! Framework installer execution

use crate::config::Options;
use crate::error::InstallError;
use crate::runtime::{CommandSpec, DockerProbe};
use crate::steps::{Step, StepLogger};
use crate::templates::metadata::{InstallerKind, Metadata};
use crate::templates::substitute::{apply_framework_options, substitute, substitute_str, Variables};
use std::path::{Path, PathBuf};

/// Final installer argv: placeholders substituted, then the framework package pinned
pub fn build_command(metadata: &Metadata, vars: &Variables) -> Vec<String> {
    let substituted = substitute(&metadata.installer.command, vars);
    apply_framework_options(&substituted, &metadata.framework, &vars.version)
}

/// Directory the installer runs in: the substituted `work-dir` when it names an
/// existing directory, otherwise the project directory
pub fn working_dir(metadata: &Metadata, project_dir: &Path, vars: &Variables) -> PathBuf {
    let work_dir = substitute_str(&metadata.installer.work_dir, vars);
    if work_dir.trim().is_empty() {
        return project_dir.to_path_buf();
    }
    let candidate = project_dir.join(work_dir);
    if candidate.is_dir() {
        candidate
    } else {
        project_dir.to_path_buf()
    }
}

/// Whether the installer needs a reachable Docker daemon
pub fn requires_docker(metadata: &Metadata, argv: &[String]) -> bool {
    metadata.installer.kind == InstallerKind::Docker
        && argv.first().map(String::as_str) == Some("docker")
}

/// Build and run the framework installer inside the project directory
pub async fn run_installer(
    metadata: &Metadata,
    project_dir: &Path,
    vars: &Variables,
    logger: &dyn StepLogger,
    step: &Step,
    options: &Options,
    docker: &dyn DockerProbe,
) -> Result<(), InstallError> {
    let argv = build_command(metadata, vars);
    let cwd = working_dir(metadata, project_dir, vars);
    let spec = CommandSpec::from_argv(&argv, &cwd)
        .ok_or(InstallError::EmptyCommand)?
        .with_timeout(options.command_timeout);

    if options.check_docker && requires_docker(metadata, &argv) {
        if let Some(problem) = docker.problem().await {
            return Err(InstallError::DockerUnavailable(problem));
        }
    }

    tracing::info!(command = %spec.display(), cwd = %cwd.display(), "running installer");
    logger.run_command(step, &spec).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::SystemDocker;
    use crate::steps::ConsoleStepLogger;
    use crate::templates::metadata::Installer;
    use async_trait::async_trait;
    use tempfile::TempDir;

    fn metadata(kind: InstallerKind, command: &[&str]) -> Metadata {
        Metadata {
            name: "{{name}}".into(),
            framework: "laravel".into(),
            language: "php".into(),
            installer: Installer {
                kind,
                command: command.iter().map(|s| s.to_string()).collect(),
                work_dir: "{{project}}".into(),
            },
            working_dir: "/var/www/html".into(),
            min_version: "8.0".into(),
            setup_commands: None,
            env_file: None,
        }
    }

    fn vars(project: &Path) -> Variables {
        Variables::new(project, project.parent().unwrap_or(project), "blog", "11")
    }

    #[test]
    fn test_build_command_substitutes_then_pins() {
        let meta = metadata(
            InstallerKind::Docker,
            &["docker", "run", "-v", "{{project}}:/app", "composer", "create-project", "laravel/laravel", "."],
        );
        let argv = build_command(&meta, &vars(Path::new("/work/blog")));
        assert_eq!(argv[3], "/work/blog:/app");
        assert_eq!(argv[6], "laravel/laravel:^11.0");
        assert!(requires_docker(&meta, &argv));
    }

    #[test]
    fn test_requires_docker_only_for_docker_first_token() {
        let meta = metadata(InstallerKind::Docker, &["sh", "-c", "docker run x"]);
        assert!(!requires_docker(&meta, &build_command(&meta, &vars(Path::new("/p")))));
        let meta = metadata(InstallerKind::Composer, &["docker", "run"]);
        assert!(!requires_docker(&meta, &build_command(&meta, &vars(Path::new("/p")))));
    }

    #[test]
    fn test_working_dir_defaults_to_project() {
        let dir = TempDir::new().unwrap();
        let mut meta = metadata(InstallerKind::Shell, &["true"]);
        assert_eq!(working_dir(&meta, dir.path(), &vars(dir.path())), dir.path());

        meta.installer.work_dir = "backend".into();
        assert_eq!(working_dir(&meta, dir.path(), &vars(dir.path())), dir.path());
        std::fs::create_dir(dir.path().join("backend")).unwrap();
        assert_eq!(
            working_dir(&meta, dir.path(), &vars(dir.path())),
            dir.path().join("backend")
        );
    }

    #[tokio::test]
    async fn test_failing_installer_is_error() {
        let dir = TempDir::new().unwrap();
        let meta = metadata(InstallerKind::Shell, &["sh", "-c", "exit 2"]);
        let logger = ConsoleStepLogger::quiet();
        let step = logger.start_step("install");
        let err = run_installer(&meta, dir.path(), &vars(dir.path()), &logger, &step, &Options::new(dir.path()), &SystemDocker)
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::Command(_)));
        assert!(err.to_string().contains("exit code 2"), "{}", err);
    }

    #[tokio::test]
    async fn test_empty_installer_is_error() {
        let dir = TempDir::new().unwrap();
        let meta = metadata(InstallerKind::Shell, &[]);
        let logger = ConsoleStepLogger::quiet();
        let step = logger.start_step("install");
        let err = run_installer(&meta, dir.path(), &vars(dir.path()), &logger, &step, &Options::new(dir.path()), &SystemDocker)
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::EmptyCommand));
    }

    #[tokio::test]
    async fn test_installer_runs_in_project_dir() {
        let dir = TempDir::new().unwrap();
        let meta = metadata(InstallerKind::Shell, &["sh", "-c", "echo {{name}} > created.txt"]);
        let logger = ConsoleStepLogger::quiet();
        let step = logger.start_step("install");
        run_installer(&meta, dir.path(), &vars(dir.path()), &logger, &step, &Options::new(dir.path()), &SystemDocker)
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("created.txt")).unwrap().trim(),
            "blog"
        );
    }

    struct NoDaemon;

    #[async_trait]
    impl DockerProbe for NoDaemon {
        async fn problem(&self) -> Option<String> {
            Some("the Docker daemon is not running".to_string())
        }
    }

    #[tokio::test]
    async fn test_docker_installer_requires_daemon() {
        let dir = TempDir::new().unwrap();
        let meta = metadata(
            InstallerKind::Docker,
            &["docker", "run", "--rm", "composer:2", "create-project", "laravel/laravel", "."],
        );
        let logger = ConsoleStepLogger::quiet();
        let step = logger.start_step("install");
        let err = run_installer(&meta, dir.path(), &vars(dir.path()), &logger, &step, &Options::new(dir.path()), &NoDaemon)
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::DockerUnavailable(_)));
        assert!(err.to_string().contains("daemon is not running"), "{}", err);
    }

    #[tokio::test]
    async fn test_daemon_not_consulted_for_other_installers() {
        let dir = TempDir::new().unwrap();
        let meta = metadata(InstallerKind::Shell, &["sh", "-c", "touch ran"]);
        let logger = ConsoleStepLogger::quiet();
        let step = logger.start_step("install");
        run_installer(&meta, dir.path(), &vars(dir.path()), &logger, &step, &Options::new(dir.path()), &NoDaemon)
            .await
            .unwrap();
        assert!(dir.path().join("ran").is_file());
    }
}
