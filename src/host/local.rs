//! Host ports backed by the real machine

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::debug;

use super::{DirEntry, Environment, FileSystem, Metadata, Walk};
use crate::core::mode::FileMode;
use crate::error::{Result, ShellError};

/// EXDEV: rename across filesystems
const CROSS_DEVICE: i32 = 18;

/// Filesystem port over `std::fs`
#[derive(Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }

    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<()> {
        fs::create_dir(dst)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            let from = entry.path();
            let to = dst.join(entry.file_name());
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.copy_tree(&from, &to)?;
            } else if file_type.is_symlink() {
                copy_symlink(&from, &to)?;
            } else {
                fs::copy(&from, &to)?;
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    let target = fs::read_link(from)?;
    std::os::unix::fs::symlink(target, to)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to)?;
    Ok(())
}

#[cfg(unix)]
fn mode_of(meta: &fs::Metadata) -> FileMode {
    use std::os::unix::fs::MetadataExt;
    FileMode::new(meta.mode())
}

#[cfg(not(unix))]
fn mode_of(meta: &fs::Metadata) -> FileMode {
    let file_type = if meta.is_dir() {
        FileMode::DIRECTORY
    } else if meta.file_type().is_symlink() {
        FileMode::SYMLINK
    } else {
        FileMode::REGULAR
    };
    let perms = match (meta.is_dir(), meta.permissions().readonly()) {
        (true, false) => 0o755,
        (true, true) => 0o555,
        (false, false) => 0o644,
        (false, true) => 0o444,
    };
    FileMode::new(file_type | perms)
}

fn metadata_from(meta: &fs::Metadata) -> Result<Metadata> {
    Ok(Metadata {
        mode: mode_of(meta),
        size: meta.len(),
        modified: meta.modified()?,
        is_dir: meta.is_dir(),
        is_symlink: meta.file_type().is_symlink(),
    })
}

/// Destination for cp/mv: an existing directory receives the source by name
fn target_in(src: &Path, dst: &Path) -> PathBuf {
    match src.file_name() {
        Some(name) if dst.is_dir() => dst.join(name),
        _ => dst.to_path_buf(),
    }
}

impl FileSystem for LocalFs {
    fn list(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.path().is_dir(),
            });
        }
        Ok(entries)
    }

    fn stat(&self, path: &Path) -> Result<Metadata> {
        metadata_from(&fs::symlink_metadata(path)?)
    }

    fn metadata(&self, path: &Path) -> Result<Metadata> {
        metadata_from(&fs::metadata(path)?)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        if path.is_dir() {
            return Err(ShellError::IsADirectory);
        }
        Ok(fs::read(path)?)
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        Ok(fs::write(path, data)?)
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        Ok(fs::create_dir(path)?)
    }

    fn create_empty_file(&self, path: &Path) -> Result<()> {
        if path.is_dir() {
            return Err(ShellError::IsADirectory);
        }
        fs::File::create(path)?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let meta = fs::symlink_metadata(path)?;
        if meta.is_dir() {
            fs::remove_dir_all(path)?;
        } else {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn copy(&self, src: &Path, dst: &Path) -> Result<()> {
        let meta = fs::metadata(src)?;
        if meta.is_dir() {
            if dst.exists() {
                return Err(ShellError::AlreadyExists);
            }
            return self.copy_tree(src, dst);
        }
        fs::copy(src, target_in(src, dst))?;
        Ok(())
    }

    fn move_path(&self, src: &Path, dst: &Path) -> Result<()> {
        fs::symlink_metadata(src)?;
        let target = target_in(src, dst);
        match fs::rename(src, &target) {
            Ok(()) => Ok(()),
            Err(e) if e.raw_os_error() == Some(CROSS_DEVICE) => {
                debug!("rename across devices, copying {:?} -> {:?}", src, target);
                self.copy(src, &target)?;
                self.remove(src)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(unix)]
    fn chmod(&self, path: &Path, mode: FileMode) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(mode.bits() & 0o7777);
        Ok(fs::set_permissions(path, perms)?)
    }

    #[cfg(not(unix))]
    fn chmod(&self, path: &Path, mode: FileMode) -> Result<()> {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_readonly(mode.permissions() & 0o200 == 0);
        Ok(fs::set_permissions(path, perms)?)
    }

    fn walk(&self, dir: &Path) -> Walk<'_> {
        Walk::new(self, dir)
    }
}

/// Environment port over the current process
pub struct LocalEnv {
    cwd: PathBuf,
}

impl LocalEnv {
    /// Start in `start`, falling back to the process working directory
    pub fn new(start: Option<PathBuf>) -> Self {
        let cwd = start
            .and_then(|p| fs::canonicalize(p).ok())
            .filter(|p| p.is_dir())
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"));
        Self { cwd }
    }
}

impl Environment for LocalEnv {
    fn current_user(&self) -> String {
        #[cfg(unix)]
        {
            use nix::unistd::{getuid, User};
            if let Ok(Some(user)) = User::from_uid(getuid()) {
                return user.name;
            }
        }
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    fn host_name(&self) -> String {
        #[cfg(unix)]
        {
            if let Ok(name) = nix::unistd::gethostname() {
                if let Ok(name) = name.into_string() {
                    return name;
                }
            }
        }
        std::env::var("HOSTNAME")
            .or_else(|_| std::env::var("COMPUTERNAME"))
            .unwrap_or_else(|_| "localhost".to_string())
    }

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn working_directory(&self) -> PathBuf {
        self.cwd.clone()
    }

    fn change_directory(&mut self, path: &Path) -> Result<()> {
        let resolved = fs::canonicalize(path)?;
        if !resolved.is_dir() {
            return Err(ShellError::NotADirectory);
        }
        // Probe readability so `cd` into a locked directory fails like a real shell
        fs::read_dir(&resolved)?;
        self.cwd = resolved;
        Ok(())
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}
