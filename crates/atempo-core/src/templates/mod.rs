//! Template resolution, validation, substitution, and copying
//!
//! This module provides:
//! - Framework metadata types (`atempo.json`)
//! - Template resolution from the embedded bundle or directories on disk
//! - Requested version validation
//! - Placeholder substitution and framework-specific argv rewriting
//! - Asset copying into the new project

pub mod copier;
pub mod metadata;
pub mod resolver;
pub mod substitute;
pub mod version;

pub use copier::{copy_assets, copy_category, AssetCategory, CopySummary, ROOT_CONFIG_FILE};
pub use metadata::{Installer, InstallerKind, Metadata, METADATA_FILE};
pub use resolver::{EmbeddedSource, FilesystemSource, TemplateFile, TemplateResolver, TemplateSource};
pub use substitute::{apply_framework_options, substitute, substitute_str, Variables};
pub use version::{parse_version, validate};
