//! Schema directory discovery.
//!
//! Walks the schema root recursively, skipping hidden entries and symlinked
//! directories, and loads every other file as a [`SchemaFile`]. Paths are stored relative to the
//! repository root with `/` separators, since that is the form the version
//! control collaborator and the state store both key on.

use crate::error::{CoreError, CoreResult};
use crate::schema_file::SchemaFile;
use crate::traits::VersionControl;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// All schema files under one root, keyed by repository-relative path.
#[derive(Debug)]
pub struct SchemaDirectory {
    root: PathBuf,
    files: BTreeMap<String, SchemaFile>,
}

impl SchemaDirectory {
    /// Load `root`, computing paths relative to the repository root.
    pub fn load(root: &Path, vcs: &dyn VersionControl) -> CoreResult<Self> {
        let repository = vcs.repository_root()?;
        Self::load_relative_to(root, &repository)
    }

    /// Load `root`, computing paths relative to `base`.
    ///
    /// Any unreadable file, missing or unknown annotation, or malformed
    /// changeset aborts the whole load.
    pub fn load_relative_to(root: &Path, base: &Path) -> CoreResult<Self> {
        let root = canonicalize(root)?;
        let base = canonicalize(base)?;

        let prefix = root
            .strip_prefix(&base)
            .map_err(|_| CoreError::PathOutsideRepository {
                root: root.display().to_string(),
                repository: base.display().to_string(),
            })?
            .to_path_buf();

        let mut files = BTreeMap::new();
        read_directory(&root, &prefix, &mut files)?;
        log::debug!("Loaded {} schema files from {}", files.len(), root.display());

        Ok(Self { root, files })
    }

    /// Absolute, canonical schema root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a file by repository-relative path.
    pub fn get(&self, path: &str) -> Option<&SchemaFile> {
        self.files.get(path)
    }

    /// Files in lexicographic path order.
    pub fn files(&self) -> impl Iterator<Item = &SchemaFile> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn canonicalize(path: &Path) -> CoreResult<PathBuf> {
    std::fs::canonicalize(path).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })
}

/// Render a relative path with `/` separators.
fn to_key(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn read_directory(
    dir: &Path,
    relative: &Path,
    files: &mut BTreeMap<String, SchemaFile>,
) -> CoreResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut entries = entries
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        let relative_path = relative.join(&name);

        let file_type = entry.file_type().map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

        if file_type.is_dir() {
            read_directory(&path, &relative_path, files)?;
            continue;
        }

        // Symlinked directories may point back up the tree.
        if file_type.is_symlink() && path.is_dir() {
            log::warn!("Skipping symlinked directory {}", path.display());
            continue;
        }

        let content = std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

        let key = to_key(&relative_path);
        let file = SchemaFile::from_content(key.clone(), content)?;
        files.insert(key, file);
    }

    Ok(())
}

#[cfg(test)]
#[path = "directory_test.rs"]
mod tests;
