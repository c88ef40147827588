//! Compose file generation collaborator

use crate::error::ComposeError;
use crate::templates::copier::ROOT_CONFIG_FILE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Compose file names recognized in a project root, in preference order
pub const COMPOSE_FILES: [&str; 4] = [
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// Writes a Docker Compose file for a project
pub trait ComposeGenerator: Send + Sync {
    /// Generate the compose file and return its path
    fn generate_compose_file(&self, project_dir: &Path) -> Result<PathBuf, ComposeError>;
}

/// First existing compose file in the project root
pub fn find_compose_file(project_dir: &Path) -> Option<PathBuf> {
    COMPOSE_FILES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|path| path.is_file())
}

/// The project's `atempo.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub framework: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub services: Vec<ServiceSpec>,
}

/// A service declared in `atempo.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,

    #[serde(default)]
    pub image: Option<String>,

    /// Dockerfile path relative to the project root
    #[serde(default)]
    pub build: Option<String>,

    #[serde(default)]
    pub ports: Vec<String>,

    #[serde(default)]
    pub volumes: Vec<String>,

    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl ProjectConfig {
    pub fn load(project_dir: &Path) -> Result<Self, ComposeError> {
        let path = project_dir.join(ROOT_CONFIG_FILE);
        let contents = std::fs::read_to_string(&path).map_err(|source| ComposeError::Read {
            path: path.clone(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ComposeError::Parse { path, source })
    }
}

#[derive(Debug, Serialize)]
struct ComposeFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    services: BTreeMap<String, ComposeService>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    volumes: BTreeMap<String, serde_yaml::Mapping>,
}

#[derive(Debug, Serialize)]
struct ComposeBuild {
    context: String,
    dockerfile: String,
}

#[derive(Debug, Serialize)]
struct ComposeService {
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    build: Option<ComposeBuild>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    volumes: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    environment: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,
}

impl From<&ServiceSpec> for ComposeService {
    fn from(spec: &ServiceSpec) -> Self {
        Self {
            image: spec.image.clone(),
            build: spec.build.as_ref().map(|dockerfile| ComposeBuild {
                context: ".".to_string(),
                dockerfile: dockerfile.clone(),
            }),
            ports: spec.ports.clone(),
            volumes: spec.volumes.clone(),
            environment: spec.environment.clone(),
            depends_on: spec.depends_on.clone(),
        }
    }
}

/// Named volumes referenced by a service (`name:/path`, not a host path)
fn named_volumes(spec: &ServiceSpec) -> impl Iterator<Item = String> + '_ {
    spec.volumes.iter().filter_map(|volume| {
        let (source, _) = volume.split_once(':')?;
        let is_host_path = source.starts_with(['.', '/', '~', '$']);
        (!source.is_empty() && !is_host_path).then(|| source.to_string())
    })
}

/// Render compose YAML for a project config
pub fn render_compose(config: &ProjectConfig) -> Result<String, ComposeError> {
    if config.services.is_empty() {
        return Err(ComposeError::NoServices);
    }
    let file = ComposeFile {
        name: config.name.clone(),
        services: config
            .services
            .iter()
            .map(|s| (s.name.clone(), ComposeService::from(s)))
            .collect(),
        volumes: config
            .services
            .iter()
            .flat_map(named_volumes)
            .map(|name| (name, serde_yaml::Mapping::new()))
            .collect(),
    };
    Ok(serde_yaml::to_string(&file)?)
}

/// Builds `docker-compose.yml` from the services declared in `atempo.yaml`
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlComposeGenerator;

impl ComposeGenerator for YamlComposeGenerator {
    fn generate_compose_file(&self, project_dir: &Path) -> Result<PathBuf, ComposeError> {
        let config = ProjectConfig::load(project_dir)?;
        let yaml = render_compose(&config)?;
        let path = project_dir.join(COMPOSE_FILES[0]);
        std::fs::write(&path, yaml).map_err(|source| ComposeError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), services = config.services.len(), "generated compose file");
        Ok(path)
    }
}
