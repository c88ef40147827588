//! Template asset copying with placeholder substitution

use super::resolver::{TemplateFile, TemplateResolver};
use super::substitute::{substitute_str, Variables};
use crate::error::{CopyError, ResolutionError};
use std::fmt;
use std::path::Path;
use tokio::fs;

/// Name of the project config file copied to the project root
pub const ROOT_CONFIG_FILE: &str = "atempo.yaml";

/// A group of template assets copied into every new project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    /// `ai/`: context files for AI assistants
    AiContext,
    /// `infra/`: Dockerfiles, server config, env templates
    Infra,
    Readme,
    RootConfig,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 4] = [
        AssetCategory::AiContext,
        AssetCategory::Infra,
        AssetCategory::Readme,
        AssetCategory::RootConfig,
    ];

    /// Template path relative to the framework directory, and destination
    /// path relative to the project root
    pub fn path(&self) -> &'static str {
        match self {
            AssetCategory::AiContext => "ai",
            AssetCategory::Infra => "infra",
            AssetCategory::Readme => "README.md",
            AssetCategory::RootConfig => ROOT_CONFIG_FILE,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, AssetCategory::AiContext | AssetCategory::Infra)
    }

    /// A missing required category aborts the pipeline
    pub fn is_required(&self) -> bool {
        matches!(self, AssetCategory::RootConfig)
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dir() {
            write!(f, "{}/", self.path())
        } else {
            f.write_str(self.path())
        }
    }
}

/// What a copy run wrote and skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopySummary {
    /// Written files, relative to the project root
    pub copied: Vec<String>,
    /// Optional categories no source provided
    pub skipped: Vec<AssetCategory>,
}

/// Resolve one category into `(destination relative path, contents)` pairs.
/// `Ok(None)` means an optional category was not found.
pub fn resolve_category(
    resolver: &TemplateResolver,
    framework: &str,
    category: AssetCategory,
) -> Result<Option<Vec<TemplateFile>>, CopyError> {
    let resolved = if category.is_dir() {
        resolver.resolve_dir(framework, category.path()).map(|files| {
            files
                .into_iter()
                .map(|f| TemplateFile {
                    path: format!("{}/{}", category.path(), f.path),
                    contents: f.contents,
                })
                .collect()
        })
    } else {
        resolver
            .resolve(framework, category.path())
            .map(|contents| {
                vec![TemplateFile {
                    path: category.path().to_string(),
                    contents,
                }]
            })
    };

    match resolved {
        Ok(files) => Ok(Some(files)),
        Err(source @ ResolutionError::NotFound { .. }) if category.is_required() => {
            Err(CopyError::MissingRequired {
                framework: framework.to_string(),
                path: category.path().to_string(),
                source,
            })
        }
        Err(ResolutionError::NotFound { .. }) => {
            tracing::info!(framework, category = %category, "optional template assets not found, skipping");
            Ok(None)
        }
        Err(source) => Err(CopyError::MissingRequired {
            framework: framework.to_string(),
            path: category.path().to_string(),
            source,
        }),
    }
}

/// Copy a single category into the project. Returns the written paths, or
/// None when an optional category was skipped.
pub async fn copy_category(
    resolver: &TemplateResolver,
    framework: &str,
    category: AssetCategory,
    project_dir: &Path,
    vars: &Variables,
) -> Result<Option<Vec<String>>, CopyError> {
    let Some(files) = resolve_category(resolver, framework, category)? else {
        return Ok(None);
    };
    write_files(&files, project_dir, vars).await.map(Some)
}

/// Copy every asset category into the project directory.
///
/// All categories are resolved before anything is written, so a missing
/// required asset leaves the project directory untouched.
pub async fn copy_assets(
    resolver: &TemplateResolver,
    framework: &str,
    project_dir: &Path,
    vars: &Variables,
) -> Result<CopySummary, CopyError> {
    let mut resolved = Vec::new();
    let mut summary = CopySummary::default();

    for category in AssetCategory::ALL {
        match resolve_category(resolver, framework, category)? {
            Some(files) => resolved.push(files),
            None => summary.skipped.push(category),
        }
    }

    for files in &resolved {
        summary
            .copied
            .extend(write_files(files, project_dir, vars).await?);
    }

    Ok(summary)
}

async fn write_files(
    files: &[TemplateFile],
    project_dir: &Path,
    vars: &Variables,
) -> Result<Vec<String>, CopyError> {
    let mut written = Vec::with_capacity(files.len());

    for file in files {
        let target_path = project_dir.join(&file.path);
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| CopyError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        // Text files get placeholders substituted, binary files are copied verbatim
        let contents = match std::str::from_utf8(&file.contents) {
            Ok(text) => substitute_str(text, vars).into_bytes(),
            Err(_) => file.contents.clone(),
        };

        fs::write(&target_path, &contents)
            .await
            .map_err(|source| CopyError::Write {
                path: target_path.clone(),
                source,
            })?;
        set_file_mode(&target_path).await?;

        written.push(file.path.clone());
    }

    Ok(written)
}

#[cfg(unix)]
async fn set_file_mode(path: &Path) -> Result<(), CopyError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
        .await
        .map_err(|source| CopyError::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(not(unix))]
async fn set_file_mode(_path: &Path) -> Result<(), CopyError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        stdfs::create_dir_all(path.parent().unwrap()).unwrap();
        stdfs::write(path, contents).unwrap();
    }

    fn vars(project: &Path) -> Variables {
        Variables::new(project, project.parent().unwrap(), "shop", "11")
    }

    fn full_template(root: &Path) {
        write(root, "laravel/ai/context.md", b"# {{name}} on Laravel {{version}}");
        write(root, "laravel/ai/prompts/review.md", b"review {{name}}");
        write(root, "laravel/infra/docker/Dockerfile", b"FROM php:8.3");
        write(root, "laravel/infra/logo.bin", &[0xff, 0xfe, 0x00, 0x7b, 0x7b]);
        write(root, "laravel/README.md", b"# {{name}}");
        write(root, "laravel/atempo.yaml", b"name: {{name}}\n");
    }

    #[tokio::test]
    async fn test_copies_all_categories_with_relative_paths() {
        let templates = TempDir::new().unwrap();
        full_template(templates.path());
        let out = TempDir::new().unwrap();
        let project = out.path().join("shop");

        let resolver = TemplateResolver::from_dir(templates.path());
        let summary = copy_assets(&resolver, "laravel", &project, &vars(&project))
            .await
            .unwrap();

        assert!(summary.skipped.is_empty());
        for rel in [
            "ai/context.md",
            "ai/prompts/review.md",
            "infra/docker/Dockerfile",
            "infra/logo.bin",
            "README.md",
            "atempo.yaml",
        ] {
            assert!(project.join(rel).is_file(), "missing {}", rel);
            assert!(summary.copied.contains(&rel.to_string()));
        }
        assert_eq!(
            stdfs::read_to_string(project.join("ai/context.md")).unwrap(),
            "# shop on Laravel 11"
        );
        assert_eq!(
            stdfs::read(project.join("infra/logo.bin")).unwrap(),
            [0xff, 0xfe, 0x00, 0x7b, 0x7b]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_files_are_not_executable() {
        use std::os::unix::fs::PermissionsExt;

        let templates = TempDir::new().unwrap();
        full_template(templates.path());
        let out = TempDir::new().unwrap();
        let resolver = TemplateResolver::from_dir(templates.path());
        copy_assets(&resolver, "laravel", out.path(), &vars(&out.path().join("x")))
            .await
            .unwrap();

        let mode = stdfs::metadata(out.path().join("README.md"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[tokio::test]
    async fn test_optional_categories_skipped() {
        let templates = TempDir::new().unwrap();
        write(templates.path(), "django/atempo.yaml", b"name: x\n");
        let out = TempDir::new().unwrap();

        let resolver = TemplateResolver::from_dir(templates.path());
        let summary = copy_assets(&resolver, "django", out.path(), &vars(&out.path().join("x")))
            .await
            .unwrap();

        assert_eq!(summary.copied, ["atempo.yaml".to_string()]);
        assert_eq!(
            summary.skipped,
            [
                AssetCategory::AiContext,
                AssetCategory::Infra,
                AssetCategory::Readme
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_root_config_writes_nothing() {
        let templates = TempDir::new().unwrap();
        write(templates.path(), "django/ai/context.md", b"ctx");
        write(templates.path(), "django/README.md", b"readme");
        let out = TempDir::new().unwrap();

        let resolver = TemplateResolver::from_dir(templates.path());
        let err = copy_assets(&resolver, "django", out.path(), &vars(&out.path().join("x")))
            .await
            .unwrap_err();

        assert!(matches!(err, CopyError::MissingRequired { .. }));
        assert!(err.to_string().contains(ROOT_CONFIG_FILE));
        assert_eq!(stdfs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_copy_single_category() {
        let templates = TempDir::new().unwrap();
        full_template(templates.path());
        let out = TempDir::new().unwrap();
        let resolver = TemplateResolver::from_dir(templates.path());

        let written = copy_category(
            &resolver,
            "laravel",
            AssetCategory::AiContext,
            out.path(),
            &vars(&out.path().join("x")),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(written, ["ai/context.md", "ai/prompts/review.md"]);
        assert!(!out.path().join("infra").exists());

        let skipped = copy_category(
            &resolver,
            "symfony",
            AssetCategory::Readme,
            out.path(),
            &vars(&out.path().join("x")),
        )
        .await
        .unwrap();
        assert!(skipped.is_none());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(AssetCategory::AiContext.to_string(), "ai/");
        assert_eq!(AssetCategory::RootConfig.to_string(), "atempo.yaml");
    }
}
