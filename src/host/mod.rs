//! Host ports used by the command handlers.
//!
//! - **FileSystem**: directory listing, metadata, file I/O, chmod, walk
//! - **Environment**: user and host names, clock, working directory
//!
//! `local` backs both with the real machine. `memory` is an in-memory
//! double for tests that can inject per-path failures.

pub mod local;
#[cfg(test)]
pub mod memory;

use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::core::mode::FileMode;
use crate::error::{Result, ShellError};

pub use local::{LocalEnv, LocalFs};

/// One name in a directory listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    /// True for directories and for symlinks pointing at one
    pub is_dir: bool,
}

/// Metadata of a path, without following a trailing symlink
#[derive(Clone, Debug)]
pub struct Metadata {
    pub mode: FileMode,
    pub size: u64,
    pub modified: SystemTime,
    pub is_dir: bool,
    pub is_symlink: bool,
}

pub trait FileSystem {
    fn list(&self, dir: &Path) -> Result<Vec<DirEntry>>;
    fn stat(&self, path: &Path) -> Result<Metadata>;
    /// Like `stat`, but follows a trailing symlink
    fn metadata(&self, path: &Path) -> Result<Metadata>;
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    #[allow(dead_code)]
    fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
    fn create_dir(&self, path: &Path) -> Result<()>;
    /// Create `path` empty, truncating it if it exists
    fn create_empty_file(&self, path: &Path) -> Result<()>;
    /// Remove a file, or a directory and everything under it
    fn remove(&self, path: &Path) -> Result<()>;
    /// Copy a file, or a directory tree. A directory `dst` receives the file by name.
    fn copy(&self, src: &Path, dst: &Path) -> Result<()>;
    /// Rename. A directory `dst` receives the source by name.
    fn move_path(&self, src: &Path, dst: &Path) -> Result<()>;
    fn chmod(&self, path: &Path, mode: FileMode) -> Result<()>;
    /// Every descendant of `dir`, depth first, not descending through symlinks
    fn walk(&self, dir: &Path) -> Walk<'_>;
}

pub trait Environment {
    fn current_user(&self) -> String;
    fn host_name(&self) -> String;
    fn now(&self) -> DateTime<Local>;
    fn working_directory(&self) -> PathBuf;
    /// Switch to `path`, which the caller has already resolved to an absolute path
    fn change_directory(&mut self, path: &Path) -> Result<()>;
    fn home_dir(&self) -> Option<PathBuf>;

    /// Resolve an operand against the working directory
    fn resolve(&self, operand: &str) -> PathBuf {
        let path = Path::new(operand);
        if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.working_directory().join(path))
        }
    }
}

/// Lexically fold `.` and `..` components
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// A directory the walk could not list
#[derive(Error, Debug)]
#[error("cannot read directory '{}': {source}", .dir.display())]
pub struct WalkError {
    pub dir: PathBuf,
    pub source: ShellError,
}

/// Iterative depth-first traversal over a [`FileSystem`]
///
/// Children are visited in name order. A path is yielded before its
/// children; a directory that cannot be listed is reported once as an
/// error and skipped. A child that vanished between listing and stat is
/// still yielded, so the consumer sees the failure on its own access.
pub struct Walk<'a> {
    fs: &'a dyn FileSystem,
    stack: Vec<PathBuf>,
    deferred: Option<WalkError>,
}

impl<'a> Walk<'a> {
    pub fn new(fs: &'a dyn FileSystem, root: &Path) -> Self {
        let mut walk = Self {
            fs,
            stack: Vec::new(),
            deferred: None,
        };
        if let Err(e) = walk.push_children(root) {
            walk.deferred = Some(e);
        }
        walk
    }

    fn push_children(&mut self, dir: &Path) -> std::result::Result<(), WalkError> {
        let mut entries = self.fs.list(dir).map_err(|source| WalkError {
            dir: dir.to_path_buf(),
            source,
        })?;
        entries.sort_by(|a, b| b.name.cmp(&a.name));
        self.stack
            .extend(entries.into_iter().map(|e| dir.join(e.name)));
        Ok(())
    }
}

impl Iterator for Walk<'_> {
    type Item = std::result::Result<PathBuf, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.deferred.take() {
            return Some(Err(err));
        }
        let path = self.stack.pop()?;
        match self.fs.stat(&path) {
            Ok(meta) if meta.is_dir && !meta.is_symlink => {
                if let Err(e) = self.push_children(&path) {
                    self.deferred = Some(e);
                }
            }
            Ok(_) | Err(_) => {}
        }
        Some(Ok(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemFs;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
    }

    fn tree() -> MemFs {
        MemFs::new()
            .with_dir("/d")
            .with_file("/d/a", "")
            .with_dir("/d/sub")
            .with_file("/d/sub/f2", "")
            .with_file("/d/z", "")
    }

    #[test]
    fn test_walk_reports_unlistable_dir_once() {
        let fs = tree();
        fs.deny_list("/d/sub");

        let mut paths = Vec::new();
        let mut failed = Vec::new();
        for entry in fs.walk(Path::new("/d")) {
            match entry {
                Ok(path) => paths.push(path),
                Err(e) => failed.push((e.dir, e.source.to_string())),
            }
        }
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/d/a"),
                PathBuf::from("/d/sub"),
                PathBuf::from("/d/z"),
            ]
        );
        assert_eq!(
            failed,
            vec![(PathBuf::from("/d/sub"), "Permission denied".to_string())]
        );
    }

    #[test]
    fn test_walk_unlistable_root() {
        let fs = tree();
        fs.deny_list("/d");
        let entries: Vec<_> = fs.walk(Path::new("/d")).collect();
        assert_eq!(entries.len(), 1);
        let err = entries.into_iter().next().unwrap().unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot read directory '/d': Permission denied"
        );
    }

    #[test]
    fn test_walk_yields_vanished_entries() {
        let fs = tree();
        fs.vanish("/d/sub");
        let paths: Vec<PathBuf> = fs.walk(Path::new("/d")).map(|p| p.unwrap()).collect();
        // Gone before stat, so it is not descended into
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/d/a"),
                PathBuf::from("/d/sub"),
                PathBuf::from("/d/z"),
            ]
        );
    }
}
