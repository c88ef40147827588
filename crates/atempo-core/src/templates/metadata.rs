//! Framework metadata (`atempo.json`) types and loading

use super::resolver::TemplateResolver;
use crate::error::ScaffoldError;
use serde::{Deserialize, Serialize};

/// File name of the per-framework scaffold descriptor
pub const METADATA_FILE: &str = "atempo.json";

/// Installer classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallerKind {
    Composer,
    Docker,
    Shell,
    Pip,
    #[serde(other)]
    Other,
}

/// How the framework's project skeleton is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Installer {
    #[serde(rename = "type")]
    pub kind: InstallerKind,

    /// argv tokens, each possibly containing placeholders
    pub command: Vec<String>,

    /// Working directory for the installer (placeholders allowed)
    #[serde(default)]
    pub work_dir: String,
}

/// Per-framework scaffold descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    /// Project name template
    pub name: String,

    pub framework: String,

    #[serde(default)]
    pub language: String,

    pub installer: Installer,

    /// Project root inside the app container
    #[serde(default)]
    pub working_dir: String,

    /// Oldest version this template supports (empty = no floor)
    #[serde(default)]
    pub min_version: String,

    /// Overrides the framework's default setup commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_commands: Option<Vec<Vec<String>>>,

    /// Env template copied to `.env` (relative to the project root)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<String>,
}

impl Metadata {
    /// Parse a metadata document
    pub fn from_slice(framework: &str, bytes: &[u8]) -> Result<Self, ScaffoldError> {
        serde_json::from_slice(bytes).map_err(|source| ScaffoldError::Metadata {
            framework: framework.to_string(),
            source,
        })
    }

    /// Resolve and parse `atempo.json` for a framework
    pub fn load(resolver: &TemplateResolver, framework: &str) -> Result<Self, ScaffoldError> {
        let bytes = resolver.resolve(framework, METADATA_FILE)?;
        Self::from_slice(framework, &bytes)
    }

    /// Env template path relative to the project root
    pub fn env_template(&self) -> &str {
        self.env_file.as_deref().unwrap_or(".env.example")
    }
}
