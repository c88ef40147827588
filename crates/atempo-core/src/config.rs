//! Run configuration

use crate::templates::resolver::TemplateResolver;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for one pipeline run
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory the command was invoked from (`{{cwd}}`)
    pub cwd: PathBuf,

    /// Explicit project name. The project is created in `<cwd>/<name>`;
    /// without a name it is created in `cwd` itself.
    pub project_name: Option<String>,

    /// Directory of the running executable, searched for template fallbacks
    pub executable_dir: Option<PathBuf>,

    /// Use only this `templates/frameworks` directory (development override)
    pub template_dir: Option<PathBuf>,

    /// Deadline for each external command. None waits indefinitely.
    pub command_timeout: Option<Duration>,

    /// Verify the Docker daemon before running a Docker-based installer
    pub check_docker: bool,

    /// Bring up compose services during post-install
    pub start_services: bool,

    /// Run the post-install stage at all
    pub post_install: bool,
}

impl Options {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            project_name: None,
            executable_dir: None,
            template_dir: None,
            command_timeout: None,
            check_docker: true,
            start_services: true,
            post_install: true,
        }
    }

    /// Options for the current process: working directory and executable location
    pub fn from_env() -> std::io::Result<Self> {
        let mut options = Self::new(std::env::current_dir()?);
        options.executable_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Ok(options)
    }

    /// Where the project is created
    pub fn project_dir(&self) -> PathBuf {
        match self.project_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => self.cwd.join(name),
            _ => self.cwd.clone(),
        }
    }

    /// Project name: the explicit name, else the project directory's base name
    pub fn project_name(&self) -> String {
        if let Some(name) = self.project_name.as_deref().map(str::trim) {
            if !name.is_empty() {
                return name.to_string();
            }
        }
        self.project_dir()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".to_string())
    }

    /// Template resolver for these options
    pub fn resolver(&self) -> TemplateResolver {
        match &self.template_dir {
            Some(dir) => TemplateResolver::from_dir(dir.clone()),
            None => TemplateResolver::with_defaults(self.executable_dir.as_deref(), &self.cwd),
        }
    }
}
