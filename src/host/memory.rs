//! In-memory host ports for tests

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

use chrono::{DateTime, Local, TimeZone};

use super::{normalize, DirEntry, Environment, FileSystem, Metadata, Walk};
use crate::core::mode::FileMode;
use crate::error::{Result, ShellError};

#[derive(Clone, Debug)]
enum Node {
    File(Vec<u8>),
    Dir,
    Symlink(PathBuf),
}

#[derive(Clone, Debug)]
struct Entry {
    node: Node,
    mode: FileMode,
}

/// A tree of files held in a map keyed by absolute path.
///
/// Clones share one tree, so a test can keep a handle after boxing a copy
/// into a dispatcher.
#[derive(Clone)]
pub struct MemFs {
    entries: Rc<RefCell<BTreeMap<PathBuf, Entry>>>,
    deny_chmod: Rc<RefCell<HashSet<PathBuf>>>,
    deny_list: Rc<RefCell<HashSet<PathBuf>>>,
    vanished: Rc<RefCell<HashSet<PathBuf>>>,
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemFs {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            PathBuf::from("/"),
            Entry {
                node: Node::Dir,
                mode: FileMode::new(FileMode::DIRECTORY | 0o755),
            },
        );
        Self {
            entries: Rc::new(RefCell::new(entries)),
            deny_chmod: Rc::new(RefCell::new(HashSet::new())),
            deny_list: Rc::new(RefCell::new(HashSet::new())),
            vanished: Rc::new(RefCell::new(HashSet::new())),
        }
    }

    pub fn with_dir(self, path: &str) -> Self {
        self.create_dir(Path::new(path)).unwrap();
        self
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.write(Path::new(path), content.as_bytes()).unwrap();
        self
    }

    pub fn with_symlink(self, path: &str, target: &str) -> Self {
        let path = normalize(Path::new(path));
        self.entries.borrow_mut().insert(
            path,
            Entry {
                node: Node::Symlink(PathBuf::from(target)),
                mode: FileMode::new(FileMode::SYMLINK | 0o777),
            },
        );
        self
    }

    /// Make every later chmod of `path` fail with PermissionDenied
    pub fn deny_chmod(&self, path: &str) {
        self.deny_chmod.borrow_mut().insert(normalize(Path::new(path)));
    }

    /// Make every later listing of `path` fail with PermissionDenied
    pub fn deny_list(&self, path: &str) {
        self.deny_list.borrow_mut().insert(normalize(Path::new(path)));
    }

    /// Keep `path` in its parent's listing but fail every access to it
    /// with NotFound, as if it was removed right after the listing
    pub fn vanish(&self, path: &str) {
        self.vanished.borrow_mut().insert(normalize(Path::new(path)));
    }

    pub fn mode(&self, path: &str) -> FileMode {
        self.entries.borrow()[&normalize(Path::new(path))].mode
    }

    pub fn exists(&self, path: &str) -> bool {
        self.entries.borrow().contains_key(&normalize(Path::new(path)))
    }

    pub fn contents(&self, path: &str) -> Option<String> {
        match &self.entries.borrow().get(&normalize(Path::new(path)))?.node {
            Node::File(data) => Some(String::from_utf8_lossy(data).into_owned()),
            _ => None,
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(
            self.entries.borrow().get(path).map(|e| &e.node),
            Some(Node::Dir)
        )
    }

    /// Follow symlinks at `path` (not intermediate components)
    fn resolve_link(&self, path: &Path) -> PathBuf {
        let mut current = path.to_path_buf();
        for _ in 0..8 {
            let next = match self.entries.borrow().get(&current).map(|e| &e.node) {
                Some(Node::Symlink(target)) => normalize(&current.parent().unwrap_or(Path::new("/")).join(target)),
                _ => return current,
            };
            current = next;
        }
        current
    }

    fn require_parent_dir(&self, path: &Path) -> Result<()> {
        let parent = path.parent().unwrap_or(Path::new("/"));
        match self.entries.borrow().get(parent).map(|e| &e.node) {
            Some(Node::Dir) => Ok(()),
            Some(_) => Err(ShellError::NotADirectory),
            None => Err(ShellError::NotFound),
        }
    }

    fn children(&self, dir: &Path) -> Vec<PathBuf> {
        self.entries
            .borrow()
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect()
    }

    fn subtree(&self, root: &Path) -> Vec<(PathBuf, Entry)> {
        self.entries
            .borrow()
            .iter()
            .filter(|(p, _)| p.starts_with(root))
            .map(|(p, e)| (p.clone(), e.clone()))
            .collect()
    }

    fn target_in(&self, src: &Path, dst: &Path) -> PathBuf {
        match src.file_name() {
            Some(name) if self.is_dir(&self.resolve_link(dst)) => dst.join(name),
            _ => dst.to_path_buf(),
        }
    }
}

impl FileSystem for MemFs {
    fn list(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let dir = self.resolve_link(&normalize(dir));
        if self.vanished.borrow().contains(&dir) {
            return Err(ShellError::NotFound);
        }
        if self.deny_list.borrow().contains(&dir) {
            return Err(ShellError::PermissionDenied);
        }
        match self.entries.borrow().get(&dir).map(|e| &e.node) {
            Some(Node::Dir) => {}
            Some(_) => return Err(ShellError::NotADirectory),
            None => return Err(ShellError::NotFound),
        }
        Ok(self
            .children(&dir)
            .into_iter()
            .map(|p| DirEntry {
                name: p.file_name().unwrap_or_default().to_string_lossy().into_owned(),
                is_dir: self.is_dir(&self.resolve_link(&p)),
            })
            .collect())
    }

    fn stat(&self, path: &Path) -> Result<Metadata> {
        let path = normalize(path);
        if self.vanished.borrow().contains(&path) {
            return Err(ShellError::NotFound);
        }
        let entries = self.entries.borrow();
        let entry = entries.get(&path).ok_or(ShellError::NotFound)?;
        let size = match &entry.node {
            Node::File(data) => data.len() as u64,
            Node::Dir => 4096,
            Node::Symlink(target) => target.as_os_str().len() as u64,
        };
        Ok(Metadata {
            mode: entry.mode,
            size,
            modified: SystemTime::UNIX_EPOCH,
            is_dir: matches!(entry.node, Node::Dir),
            is_symlink: matches!(entry.node, Node::Symlink(_)),
        })
    }

    fn metadata(&self, path: &Path) -> Result<Metadata> {
        self.stat(&self.resolve_link(&normalize(path)))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = self.resolve_link(&normalize(path));
        match self.entries.borrow().get(&path).map(|e| &e.node) {
            Some(Node::File(data)) => Ok(data.clone()),
            Some(_) => Err(ShellError::IsADirectory),
            None => Err(ShellError::NotFound),
        }
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = self.resolve_link(&normalize(path));
        self.require_parent_dir(&path)?;
        let mut entries = self.entries.borrow_mut();
        match entries.get_mut(&path) {
            Some(Entry { node: Node::File(content), .. }) => {
                *content = data.to_vec();
            }
            Some(_) => return Err(ShellError::IsADirectory),
            None => {
                entries.insert(
                    path,
                    Entry {
                        node: Node::File(data.to_vec()),
                        mode: FileMode::new(FileMode::REGULAR | 0o644),
                    },
                );
            }
        }
        Ok(())
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        let path = normalize(path);
        if self.entries.borrow().contains_key(&path) {
            return Err(ShellError::AlreadyExists);
        }
        self.require_parent_dir(&path)?;
        self.entries.borrow_mut().insert(
            path,
            Entry {
                node: Node::Dir,
                mode: FileMode::new(FileMode::DIRECTORY | 0o755),
            },
        );
        Ok(())
    }

    fn create_empty_file(&self, path: &Path) -> Result<()> {
        self.write(path, &[])
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let path = normalize(path);
        if !self.entries.borrow().contains_key(&path) {
            return Err(ShellError::NotFound);
        }
        self.entries
            .borrow_mut()
            .retain(|p, _| !p.starts_with(&path));
        Ok(())
    }

    fn copy(&self, src: &Path, dst: &Path) -> Result<()> {
        let src = self.resolve_link(&normalize(src));
        let dst = normalize(dst);
        if self.is_dir(&src) {
            if self.entries.borrow().contains_key(&dst) {
                return Err(ShellError::AlreadyExists);
            }
            self.require_parent_dir(&dst)?;
            let copied: Vec<_> = self
                .subtree(&src)
                .into_iter()
                .map(|(p, e)| (dst.join(p.strip_prefix(&src).unwrap_or(&p)), e))
                .collect();
            let mut entries = self.entries.borrow_mut();
            for (p, e) in copied {
                entries.insert(normalize(&p), e);
            }
            return Ok(());
        }
        let data = self.read(&src)?;
        self.write(&self.target_in(&src, &dst), &data)
    }

    fn move_path(&self, src: &Path, dst: &Path) -> Result<()> {
        let src = normalize(src);
        if !self.entries.borrow().contains_key(&src) {
            return Err(ShellError::NotFound);
        }
        let target = self.target_in(&src, &normalize(dst));
        self.require_parent_dir(&target)?;
        let moved: Vec<_> = self
            .subtree(&src)
            .into_iter()
            .map(|(p, e)| (target.join(p.strip_prefix(&src).unwrap_or(&p)), e))
            .collect();
        let mut entries = self.entries.borrow_mut();
        entries.retain(|p, _| !p.starts_with(&src));
        for (p, e) in moved {
            entries.insert(normalize(&p), e);
        }
        Ok(())
    }

    fn chmod(&self, path: &Path, mode: FileMode) -> Result<()> {
        let path = self.resolve_link(&normalize(path));
        if self.vanished.borrow().contains(&path) {
            return Err(ShellError::NotFound);
        }
        if self.deny_chmod.borrow().contains(&path) {
            return Err(ShellError::PermissionDenied);
        }
        let mut entries = self.entries.borrow_mut();
        let entry = entries.get_mut(&path).ok_or(ShellError::NotFound)?;
        entry.mode = entry.mode.with_permissions(mode.permissions());
        Ok(())
    }

    fn walk(&self, dir: &Path) -> Walk<'_> {
        Walk::new(self, &normalize(dir))
    }
}

/// Environment with fixed identity and clock
pub struct FixedEnv {
    pub cwd: PathBuf,
    pub home: PathBuf,
}

impl FixedEnv {
    pub fn new(cwd: &str) -> Self {
        Self {
            cwd: PathBuf::from(cwd),
            home: PathBuf::from("/home/tester"),
        }
    }
}

impl Environment for FixedEnv {
    fn current_user(&self) -> String {
        "tester".to_string()
    }

    fn host_name(&self) -> String {
        "testbox".to_string()
    }

    fn now(&self) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    fn working_directory(&self) -> PathBuf {
        self.cwd.clone()
    }

    fn change_directory(&mut self, path: &Path) -> Result<()> {
        self.cwd = normalize(path);
        Ok(())
    }

    fn home_dir(&self) -> Option<PathBuf> {
        Some(self.home.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_skips_symlinked_dirs() {
        let fs = MemFs::new()
            .with_dir("/d")
            .with_file("/d/f1", "")
            .with_dir("/d/sub")
            .with_file("/d/sub/f2", "")
            .with_dir("/elsewhere")
            .with_file("/elsewhere/x", "")
            .with_symlink("/d/link", "/elsewhere");

        let paths: Vec<PathBuf> = fs.walk(Path::new("/d")).map(|p| p.unwrap()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/d/f1"),
                PathBuf::from("/d/link"),
                PathBuf::from("/d/sub"),
                PathBuf::from("/d/sub/f2"),
            ]
        );
    }

    #[test]
    fn test_move_into_directory() {
        let fs = MemFs::new().with_dir("/a").with_file("/f", "x");
        fs.move_path(Path::new("/f"), Path::new("/a")).unwrap();
        assert!(!fs.exists("/f"));
        assert_eq!(fs.contents("/a/f").as_deref(), Some("x"));
    }
}
