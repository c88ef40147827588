//! Project registration and compose generation after a successful scaffold

use crate::compose::{find_compose_file, ComposeGenerator};
use crate::error::FinalizeError;
use crate::registry::ProjectRegistry;
use crate::templates::copier::ROOT_CONFIG_FILE;
use crate::templates::metadata::Metadata;
use crate::templates::substitute::{substitute_str, Variables};
use std::path::Path;

/// Name to register: the project directory's base name, else the templated metadata name
pub fn registry_name(metadata: &Metadata, project_dir: &Path, vars: &Variables) -> String {
    project_dir
        .file_name()
        .map(|n| n.to_string_lossy().trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| substitute_str(&metadata.name, vars))
}

/// Register the project and, if it has a root config but no compose file yet,
/// generate one
pub fn finalize(
    metadata: &Metadata,
    project_dir: &Path,
    vars: &Variables,
    registry: &dyn ProjectRegistry,
    compose: &dyn ComposeGenerator,
) -> Result<(), FinalizeError> {
    let name = registry_name(metadata, project_dir, vars);
    registry.add_project(&name, project_dir, &metadata.framework, &vars.version)?;

    if let Some(existing) = find_compose_file(project_dir) {
        tracing::debug!(path = %existing.display(), "compose file present, not regenerating");
    } else if project_dir.join(ROOT_CONFIG_FILE).is_file() {
        compose.generate_compose_file(project_dir)?;
    } else {
        tracing::debug!(project = %project_dir.display(), "no root config, skipping compose generation");
    }
    Ok(())
}
