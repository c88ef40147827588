//! Project registry collaborator

use crate::error::RegistryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Records scaffolded projects
pub trait ProjectRegistry: Send + Sync {
    fn add_project(
        &self,
        name: &str,
        path: &Path,
        framework: &str,
        version: &str,
    ) -> Result<(), RegistryError>;
}

/// One registered project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub name: String,
    pub path: PathBuf,
    pub framework: String,
    pub version: String,
    pub updated_at: DateTime<Utc>,
}

/// Registry kept as a JSON array in a single file
#[derive(Debug, Clone)]
pub struct JsonFileRegistry {
    path: PathBuf,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.atempo/projects.json`
    pub fn default_location() -> Result<Self, RegistryError> {
        let home = home::home_dir().ok_or(RegistryError::NoHome)?;
        Ok(Self::new(home.join(".atempo").join("projects.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, oldest first. A missing file is an empty registry.
    pub fn load(&self) -> Result<Vec<ProjectRecord>, RegistryError> {
        let contents = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(RegistryError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice(&contents).map_err(|source| RegistryError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, records: &[ProjectRecord]) -> Result<(), RegistryError> {
        let io_err = |source: std::io::Error| RegistryError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_vec_pretty(records).map_err(|source| RegistryError::Parse {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(io_err)
    }
}

impl ProjectRegistry for JsonFileRegistry {
    fn add_project(
        &self,
        name: &str,
        path: &Path,
        framework: &str,
        version: &str,
    ) -> Result<(), RegistryError> {
        let mut records = self.load()?;
        let record = ProjectRecord {
            name: name.to_string(),
            path: path.to_path_buf(),
            framework: framework.to_string(),
            version: version.to_string(),
            updated_at: Utc::now(),
        };

        match records.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }

        tracing::debug!(name, registry = %self.path.display(), "registered project");
        self.save(&records)
    }
}

/// Stand-in used when there is no home directory to hold the registry.
/// Every add fails with [`RegistryError::NoHome`], which the pipeline reports
/// as a finalize warning instead of refusing to scaffold.
#[derive(Debug, Clone, Copy, Default)]
pub struct HomelessRegistry;

impl ProjectRegistry for HomelessRegistry {
    fn add_project(
        &self,
        _name: &str,
        _path: &Path,
        _framework: &str,
        _version: &str,
    ) -> Result<(), RegistryError> {
        Err(RegistryError::NoHome)
    }
}

/// Registry at the default location, or [`HomelessRegistry`] without a home directory
pub fn default_registry() -> Box<dyn ProjectRegistry> {
    match JsonFileRegistry::default_location() {
        Ok(registry) => Box::new(registry),
        Err(e) => {
            tracing::warn!(error = %e, "project registry unavailable");
            Box::new(HomelessRegistry)
        }
    }
}
