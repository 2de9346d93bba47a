use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ScanSettings;
use crate::types::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FileRole {
    /// Python source parsed into a syntax tree.
    Source,
    /// YAML configuration walked as a mapping tree.
    Config,
}

#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Forward-slash path below the repository root.
    pub relative_path: String,
    pub role: FileRole,
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub files: Vec<DiscoveredFile>,
    pub missing_roots: Vec<PathBuf>,
}

impl ScanResult {
    pub fn count(&self, role: FileRole) -> usize {
        self.files.iter().filter(|f| f.role == role).count()
    }
}

pub struct RepositoryScanner {
    settings: ScanSettings,
    excludes: GlobSet,
}

impl RepositoryScanner {
    pub fn new(settings: &ScanSettings) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &settings.exclude_patterns {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            settings: settings.clone(),
            excludes: builder.build()?,
        })
    }

    /// Source files first, then configuration files; each root in sorted order.
    pub fn scan(&self, repo_root: &Path) -> Result<ScanResult> {
        let mut result = ScanResult::default();

        self.scan_root(
            repo_root,
            &self.settings.source_root,
            &self.settings.source_extensions,
            FileRole::Source,
            &mut result,
        );
        self.scan_root(
            repo_root,
            &self.settings.config_root,
            &self.settings.config_extensions,
            FileRole::Config,
            &mut result,
        );

        info!(
            "Discovered {} source files and {} config files",
            result.count(FileRole::Source),
            result.count(FileRole::Config)
        );
        Ok(result)
    }

    fn scan_root(
        &self,
        repo_root: &Path,
        root: &Path,
        extensions: &[String],
        role: FileRole,
        result: &mut ScanResult,
    ) {
        let root_path = repo_root.join(root);
        if !root_path.is_dir() {
            warn!("Root {} does not exist, skipping", root_path.display());
            result.missing_roots.push(root_path);
            return;
        }

        let mut walker = WalkDir::new(&root_path)
            .follow_links(self.settings.follow_symlinks)
            .sort_by_file_name();
        if let Some(depth) = self.settings.max_depth {
            walker = walker.max_depth(depth);
        }

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root_path.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let has_extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|e| e == ext));
            if !has_extension {
                continue;
            }

            let Some(relative_path) = relative_slash_path(repo_root, path) else {
                continue;
            };
            if self.excludes.is_match(&relative_path) {
                debug!("Excluded {}", relative_path);
                continue;
            }

            result.files.push(DiscoveredFile {
                path: path.to_path_buf(),
                relative_path,
                role,
            });
        }
    }
}

/// Forward-slash path of `path` below `base`, independent of the platform separator.
pub fn relative_slash_path(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Forward-slash rendering of a configured root, for prefix checks.
pub fn root_prefix(root: &Path) -> String {
    root.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
