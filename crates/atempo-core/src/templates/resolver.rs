//! Template resolution from the embedded bundle or template directories on disk
//!
//! The resolver is an ordered chain of [`TemplateSource`]s. A source answers
//! `None` (or an empty listing) on a miss and the next one is tried; the first
//! hit wins. The default chain is:
//! 1. templates embedded in the binary
//! 2. `<exe dir>/templates/frameworks`
//! 3. `<exe dir>/../templates/frameworks`
//! 4. `<cwd>/templates/frameworks`

use crate::error::ResolutionError;
use rust_embed::Embed;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Templates directory layout relative to a search root
pub const TEMPLATES_SUBDIR: &str = "templates/frameworks";

#[derive(Embed)]
#[folder = "$CARGO_MANIFEST_DIR/../../templates/frameworks/"]
struct BundledTemplates;

/// A file inside a resolved template directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Path relative to the requested directory, `/`-separated
    pub path: String,
    pub contents: Vec<u8>,
}

/// One place templates can come from
pub trait TemplateSource: Send + Sync {
    /// Human-readable location, used in error messages
    fn describe(&self) -> String;

    /// Read a single file, or None if this source does not have it
    fn read(&self, framework: &str, path: &str) -> Option<Vec<u8>>;

    /// Every file below a directory, sorted by path. Empty on a miss.
    fn read_dir(&self, framework: &str, dir: &str) -> Vec<TemplateFile>;

    /// Frameworks this source has a metadata file for
    fn frameworks(&self) -> Vec<String>;
}

/// Templates compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedSource;

impl TemplateSource for EmbeddedSource {
    fn describe(&self) -> String {
        "embedded templates".to_string()
    }

    fn read(&self, framework: &str, path: &str) -> Option<Vec<u8>> {
        BundledTemplates::get(&format!("{}/{}", framework, path)).map(|f| f.data.into_owned())
    }

    fn read_dir(&self, framework: &str, dir: &str) -> Vec<TemplateFile> {
        let prefix = format!("{}/{}/", framework, dir.trim_end_matches('/'));
        let mut files: Vec<TemplateFile> = BundledTemplates::iter()
            .filter_map(|name| {
                let relative = name.strip_prefix(&prefix)?.to_string();
                let file = BundledTemplates::get(&name)?;
                Some(TemplateFile {
                    path: relative,
                    contents: file.data.into_owned(),
                })
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    fn frameworks(&self) -> Vec<String> {
        BundledTemplates::iter()
            .filter_map(|name| {
                let (framework, rest) = name.split_once('/')?;
                (rest == super::metadata::METADATA_FILE).then(|| framework.to_string())
            })
            .collect()
    }
}

/// A `templates/frameworks` directory on disk
#[derive(Debug, Clone)]
pub struct FilesystemSource {
    root: PathBuf,
}

impl FilesystemSource {
    /// `root` is the directory holding one subdirectory per framework
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TemplateSource for FilesystemSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn read(&self, framework: &str, path: &str) -> Option<Vec<u8>> {
        let full = self.root.join(framework).join(path);
        match std::fs::read(&full) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::trace!(path = %full.display(), error = %e, "template miss");
                None
            }
        }
    }

    fn read_dir(&self, framework: &str, dir: &str) -> Vec<TemplateFile> {
        let base = self.root.join(framework).join(dir);
        if !base.is_dir() {
            return Vec::new();
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&base)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let Ok(relative) = entry.path().strip_prefix(&base) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            match std::fs::read(entry.path()) {
                Ok(contents) => files.push(TemplateFile {
                    path: relative,
                    contents,
                }),
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "skipping unreadable template file");
                }
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    fn frameworks(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };
        entries
            .filter_map(Result::ok)
            .filter(|e| e.path().join(super::metadata::METADATA_FILE).is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect()
    }
}

/// Ordered chain of template sources
pub struct TemplateResolver {
    sources: Vec<Box<dyn TemplateSource>>,
}

impl TemplateResolver {
    pub fn new(sources: Vec<Box<dyn TemplateSource>>) -> Self {
        Self { sources }
    }

    /// Embedded templates first, then the standard directories on disk
    pub fn with_defaults(exe_dir: Option<&Path>, cwd: &Path) -> Self {
        let mut sources: Vec<Box<dyn TemplateSource>> = vec![Box::new(EmbeddedSource)];
        for root in Self::filesystem_roots(exe_dir, cwd) {
            sources.push(Box::new(FilesystemSource::new(root)));
        }
        Self::new(sources)
    }

    /// Only the given `templates/frameworks` directory
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(vec![Box::new(FilesystemSource::new(dir))])
    }

    /// Filesystem fallback roots, in search order
    pub fn filesystem_roots(exe_dir: Option<&Path>, cwd: &Path) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        if let Some(exe_dir) = exe_dir {
            roots.push(exe_dir.join(TEMPLATES_SUBDIR));
            if let Some(parent) = exe_dir.parent() {
                roots.push(parent.join(TEMPLATES_SUBDIR));
            }
        }
        roots.push(cwd.join(TEMPLATES_SUBDIR));
        roots
    }

    pub fn sources(&self) -> impl Iterator<Item = &dyn TemplateSource> {
        self.sources.iter().map(|s| s.as_ref())
    }

    /// Read a template file from the first source that has it
    pub fn resolve(&self, framework: &str, path: &str) -> Result<Vec<u8>, ResolutionError> {
        check_relative(framework)?;
        check_relative(path)?;

        for source in &self.sources {
            if let Some(bytes) = source.read(framework, path) {
                tracing::debug!(framework, path, source = %source.describe(), "resolved template");
                return Ok(bytes);
            }
        }
        Err(self.not_found(framework, path))
    }

    /// List a template directory from the first source that has any file in it
    pub fn resolve_dir(&self, framework: &str, dir: &str) -> Result<Vec<TemplateFile>, ResolutionError> {
        check_relative(framework)?;
        check_relative(dir)?;

        for source in &self.sources {
            let files = source.read_dir(framework, dir);
            if !files.is_empty() {
                tracing::debug!(framework, dir, files = files.len(), source = %source.describe(), "resolved template directory");
                return Ok(files);
            }
        }
        Err(self.not_found(framework, dir))
    }

    /// Names of all frameworks any source knows about
    pub fn frameworks(&self) -> Vec<String> {
        self.sources
            .iter()
            .flat_map(|s| s.frameworks())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn not_found(&self, framework: &str, path: &str) -> ResolutionError {
        ResolutionError::NotFound {
            framework: framework.to_string(),
            path: path.to_string(),
            searched: self.sources.iter().map(|s| s.describe()).collect(),
        }
    }
}

fn check_relative(path: &str) -> Result<(), ResolutionError> {
    let p = Path::new(path);
    let escapes = path.is_empty()
        || p.is_absolute()
        || p
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        Err(ResolutionError::InvalidPath(path.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_first_source_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write(first.path(), "laravel/README.md", "first");
        write(second.path(), "laravel/README.md", "second");

        let resolver = TemplateResolver::new(vec![
            Box::new(FilesystemSource::new(first.path())),
            Box::new(FilesystemSource::new(second.path())),
        ]);
        for _ in 0..3 {
            assert_eq!(resolver.resolve("laravel", "README.md").unwrap(), b"first");
        }
    }

    #[test]
    fn test_falls_back_on_miss() {
        let empty = TempDir::new().unwrap();
        let fallback = TempDir::new().unwrap();
        write(fallback.path(), "django/atempo.json", "{}");

        let resolver = TemplateResolver::new(vec![
            Box::new(FilesystemSource::new(empty.path())),
            Box::new(FilesystemSource::new(fallback.path())),
        ]);
        assert_eq!(resolver.resolve("django", "atempo.json").unwrap(), b"{}");
    }

    #[test]
    fn test_not_found_names_framework_and_path() {
        let empty = TempDir::new().unwrap();
        let resolver = TemplateResolver::from_dir(empty.path());
        let err = resolver.resolve("phoenix", "atempo.json").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("phoenix"), "{}", msg);
        assert!(msg.contains("atempo.json"), "{}", msg);
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let resolver = TemplateResolver::new(Vec::new());
        for bad in ["../secret", "/etc/passwd", "ai/../../x", ""] {
            assert!(matches!(
                resolver.resolve("laravel", bad),
                Err(ResolutionError::InvalidPath(_))
            ));
        }
        assert!(matches!(
            resolver.resolve("..", "atempo.json"),
            Err(ResolutionError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_resolve_dir_lists_nested_files() {
        let root = TempDir::new().unwrap();
        write(root.path(), "laravel/infra/docker/Dockerfile", "FROM php");
        write(root.path(), "laravel/infra/nginx/default.conf", "server {}");
        write(root.path(), "laravel/infra/env.example", "APP=1");

        let resolver = TemplateResolver::from_dir(root.path());
        let files = resolver.resolve_dir("laravel", "infra").unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["docker/Dockerfile", "env.example", "nginx/default.conf"]);
    }

    #[test]
    fn test_resolve_dir_skips_empty_sources() {
        let empty = TempDir::new().unwrap();
        fs::create_dir_all(empty.path().join("laravel/ai")).unwrap();
        let full = TempDir::new().unwrap();
        write(full.path(), "laravel/ai/context.md", "ctx");

        let resolver = TemplateResolver::new(vec![
            Box::new(FilesystemSource::new(empty.path())),
            Box::new(FilesystemSource::new(full.path())),
        ]);
        let files = resolver.resolve_dir("laravel", "ai").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].contents, b"ctx");
    }

    #[test]
    fn test_filesystem_roots_order() {
        let roots = TemplateResolver::filesystem_roots(
            Some(Path::new("/opt/atempo/bin")),
            Path::new("/home/me/site"),
        );
        assert_eq!(
            roots,
            [
                PathBuf::from("/opt/atempo/bin/templates/frameworks"),
                PathBuf::from("/opt/atempo/templates/frameworks"),
                PathBuf::from("/home/me/site/templates/frameworks"),
            ]
        );
    }

    #[test]
    fn test_embedded_templates_bundle_known_frameworks() {
        let frameworks = EmbeddedSource.frameworks();
        assert!(frameworks.contains(&"laravel".to_string()));
        assert!(frameworks.contains(&"django".to_string()));
        assert!(EmbeddedSource.read("laravel", "atempo.json").is_some());
        assert!(!EmbeddedSource.read_dir("laravel", "ai").is_empty());
    }

    #[test]
    fn test_frameworks_union() {
        let root = TempDir::new().unwrap();
        write(root.path(), "symfony/atempo.json", "{}");
        write(root.path(), "notes/readme.txt", "");
        let resolver = TemplateResolver::from_dir(root.path());
        assert_eq!(resolver.frameworks(), ["symfony".to_string()]);
    }
}
