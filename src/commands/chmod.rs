//! chmod, with optional recursion

use std::path::{Path, PathBuf};

use tracing::warn;

use super::Ctx;
use crate::core::mode::ModeSpec;
use crate::error::{Result, ShellError};
use crate::host::FileSystem;

/// Apply `spec` to the current mode of `path`, following a trailing symlink
fn change_mode(fs: &dyn FileSystem, path: &Path, spec: &ModeSpec) -> Result<()> {
    let meta = fs.metadata(path)?;
    fs.chmod(path, spec.apply(meta.mode))
}

/// `path` under `root`, spelled relative to the operand the user typed
fn shown_path(operand: &str, root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(rest) if rest.as_os_str().is_empty() => PathBuf::from(operand),
        Ok(rest) => Path::new(operand).join(rest),
        Err(_) => path.to_path_buf(),
    }
}

fn describe(err: ShellError, shown: &Path) -> ShellError {
    if err.is_not_found() {
        err.context(format!("cannot access '{}'", shown.display()))
    } else {
        err.context(format!("changing permissions of '{}'", shown.display()))
    }
}

pub fn chmod(ctx: &mut Ctx<'_>, args: &[String]) -> Result<()> {
    let (recursive, rest) = match args.split_first() {
        Some((flag, rest)) if flag == "-R" => (true, rest),
        _ => (false, args),
    };
    let (spec_text, operands) = rest
        .split_first()
        .ok_or(ShellError::NoOperand("mode operand"))?;
    if operands.is_empty() {
        return Err(ShellError::NoOperand("file operand"));
    }
    // Reject a bad spec once, before touching anything
    let spec: ModeSpec = spec_text.parse()?;
    let fs = ctx.fs;

    for operand in operands {
        let root = ctx.env.resolve(operand);
        if let Err(e) = change_mode(fs, &root, &spec) {
            ctx.report(describe(e, Path::new(operand)));
            continue;
        }
        if !recursive {
            continue;
        }
        match fs.metadata(&root) {
            Ok(meta) if meta.is_dir => {}
            _ => continue,
        }

        for entry in fs.walk(&root) {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    let shown = shown_path(operand, &root, &e.dir);
                    ctx.report(
                        e.source
                            .context(format!("cannot read directory '{}'", shown.display())),
                    );
                    continue;
                }
            };
            let shown = shown_path(operand, &root, &path);
            match fs.stat(&path) {
                // Links met during the walk are left alone
                Ok(meta) if meta.is_symlink => continue,
                Ok(_) => {}
                Err(e) => {
                    ctx.report(describe(e, &shown));
                    continue;
                }
            }
            if let Err(e) = change_mode(fs, &path, &spec) {
                warn!("chmod -R: {} left unchanged", path.display());
                ctx.report(describe(e, &shown));
            }
        }
    }
    Ok(())
}
