//! Error taxonomy for the scaffold pipeline
//!
//! Resolution, validation, install and required-copy failures abort a run and
//! surface as [`ScaffoldError`]. Post-install and finalize problems never abort;
//! they are collected as [`ScaffoldWarning`] values in the run report.

use crate::runtime::process::CommandError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("template '{path}' for framework '{framework}' not found (searched: {})", .searched.join(", "))]
    NotFound {
        framework: String,
        path: String,
        searched: Vec<String>,
    },

    #[error("invalid template path '{0}': must be relative and stay inside the framework directory")]
    InvalidPath(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("version must not be empty")]
    Empty,

    #[error("invalid version '{0}': expected dot-separated numbers such as 11 or 5.1")]
    Invalid(String),

    #[error("{framework} {version} is too old: below minimum supported version {floor}")]
    TooOld {
        framework: String,
        version: String,
        floor: u64,
    },

    #[error("{framework} {version} is not yet supported (latest supported major version is {ceiling})")]
    NotYetSupported {
        framework: String,
        version: String,
        ceiling: u64,
    },

    #[error("{framework} {version} is below minimum supported version {minimum}")]
    BelowMinimum {
        framework: String,
        version: String,
        minimum: String,
    },
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("installer command is empty")]
    EmptyCommand,

    #[error("Docker is required by the installer but is not available: {0}")]
    DockerUnavailable(String),

    #[error("failed to create project directory {}: {source}", .path.display())]
    ProjectDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("installer failed: {0}")]
    Command(#[from] CommandError),
}

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("required template asset '{path}' for '{framework}' could not be resolved")]
    MissingRequired {
        framework: String,
        path: String,
        #[source]
        source: ResolutionError,
    },

    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no home directory found; set ATEMPO_REGISTRY to choose a registry file")]
    NoHome,

    #[error("failed to access registry {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("registry {} is corrupt: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("project config declares no services")]
    NoServices,

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Serialize(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("could not register project: {0}")]
    Registry(#[from] RegistryError),

    #[error("could not generate compose file: {0}")]
    Compose(#[from] ComposeError),
}

/// A pipeline-aborting failure.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("invalid metadata for framework '{framework}': {source}")]
    Metadata {
        framework: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Copy(#[from] CopyError),
}

impl ScaffoldError {
    /// Name of the pipeline stage that produced this error
    pub fn stage(&self) -> &'static str {
        match self {
            ScaffoldError::Resolution(_) | ScaffoldError::Metadata { .. } => "resolve",
            ScaffoldError::Validation(_) => "validate",
            ScaffoldError::Install(_) => "install",
            ScaffoldError::Copy(_) => "copy",
        }
    }
}

/// A non-fatal problem recorded during a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaffoldWarning {
    PostInstall { step: String, message: String },
    Finalize { message: String },
}

impl fmt::Display for ScaffoldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaffoldWarning::PostInstall { step, message } => write!(f, "{}: {}", step, message),
            ScaffoldWarning::Finalize { message } => write!(f, "finalize: {}", message),
        }
    }
}
