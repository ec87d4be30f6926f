//! File discovery.
//!
//! Backends need to know every file under an include directory so they can
//! declare them as job inputs. Discovery sits behind a trait so plans can be
//! built against a real checkout or against a fixed file list in tests.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ExecutionError, SimResult};
use crate::path::WorkPath;

/// Lists files known to the build.
pub trait Workspace: Send + Sync {
    /// Returns every regular file at or below `dir`, sorted by path.
    fn files_under(&self, dir: &WorkPath) -> SimResult<Vec<WorkPath>>;
}

/// Workspace backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    /// Creates a workspace rooted at `root`. Relative `WorkPath`s resolve against it.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a workspace path to a filesystem path.
    #[must_use]
    pub fn resolve(&self, path: &WorkPath) -> PathBuf {
        if path.is_absolute() {
            path.as_path().to_path_buf()
        } else {
            self.root.join(path.as_path())
        }
    }
}

impl Workspace for FsWorkspace {
    fn files_under(&self, dir: &WorkPath) -> SimResult<Vec<WorkPath>> {
        let mut found = BTreeSet::new();
        let start = self.resolve(dir);
        if start.is_file() {
            found.insert(dir.clone());
            return Ok(found.into_iter().collect());
        }

        let mut pending = vec![(start, dir.clone())];
        while let Some((fs_dir, work_dir)) = pending.pop() {
            let entries = fs::read_dir(&fs_dir).map_err(|e| ExecutionError::Discovery {
                path: work_dir.clone(),
                message: e.to_string(),
            })?;
            for entry in entries {
                let entry = entry.map_err(|e| ExecutionError::Discovery {
                    path: work_dir.clone(),
                    message: e.to_string(),
                })?;
                let name = entry.file_name().to_string_lossy().into_owned();
                let child = work_dir.join(&name);
                let file_type = entry.file_type().map_err(|e| ExecutionError::Discovery {
                    path: child.clone(),
                    message: e.to_string(),
                })?;
                if file_type.is_dir() {
                    pending.push((entry.path(), child));
                } else {
                    found.insert(child);
                }
            }
        }
        Ok(found.into_iter().collect())
    }
}

/// In-memory workspace with a fixed file list.
///
/// Intended for tests and for callers that already know their file set.
#[derive(Debug, Clone, Default)]
pub struct StaticWorkspace {
    files: BTreeSet<WorkPath>,
}

impl StaticWorkspace {
    /// Creates a workspace containing `files`.
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<WorkPath>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}

impl Workspace for StaticWorkspace {
    fn files_under(&self, dir: &WorkPath) -> SimResult<Vec<WorkPath>> {
        Ok(self
            .files
            .iter()
            .filter(|f| f.starts_with(dir))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure the trait is object-safe
    fn _assert_workspace_object_safe(_: &dyn Workspace) {}

    #[test]
    fn static_workspace_filters_by_directory() {
        let ws = StaticWorkspace::new(["inc/a.svh", "inc/sub/b.svh", "rtl/top.sv"]);
        let files = ws.files_under(&WorkPath::new("inc")).unwrap();
        assert_eq!(files, vec![WorkPath::new("inc/a.svh"), WorkPath::new("inc/sub/b.svh")]);
    }

    #[test]
    fn fs_workspace_walks_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("inc/sub")).unwrap();
        std::fs::write(dir.path().join("inc/a.svh"), "").unwrap();
        std::fs::write(dir.path().join("inc/sub/b.svh"), "").unwrap();

        let ws = FsWorkspace::new(dir.path());
        let files = ws.files_under(&WorkPath::new("inc")).unwrap();
        assert_eq!(files, vec![WorkPath::new("inc/a.svh"), WorkPath::new("inc/sub/b.svh")]);
    }

    #[test]
    fn fs_workspace_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let ws = FsWorkspace::new(dir.path());
        let err = ws.files_under(&WorkPath::new("nope")).unwrap_err();
        assert!(err.is_execution());
    }
}
