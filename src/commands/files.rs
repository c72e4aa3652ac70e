//! Filesystem commands: ls, cd, pwd, mkdir, touch, rm, cp, mv, cat

use chrono::{DateTime, Local};

use super::Ctx;
use crate::core::mode::FileMode;
use crate::core::term::parser::{SGR_HIGHLIGHT, SGR_PRIMARY};
use crate::error::{Context, Result, ShellError};
use crate::host::DirEntry;

/// Wrap a directory name in highlight markers
fn paint_dir(name: &str) -> String {
    format!("\x1b[{}m{}\x1b[{}m", SGR_HIGHLIGHT, name, SGR_PRIMARY)
}

fn display_name(entry: &DirEntry) -> String {
    if entry.is_dir {
        paint_dir(&entry.name)
    } else {
        entry.name.clone()
    }
}

fn type_char(mode: FileMode) -> char {
    match mode.file_type() {
        FileMode::SYMLINK => 'l',
        FileMode::DIRECTORY => 'd',
        _ => '-',
    }
}

pub fn ls(ctx: &mut Ctx<'_>, args: &[String]) -> Result<()> {
    let mut long = false;
    let mut all = false;
    let mut operand = None;

    for arg in args {
        match arg.as_str() {
            "-l" => long = true,
            "-a" => all = true,
            "-la" | "-al" => {
                long = true;
                all = true;
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(ShellError::InvalidArgument(format!(
                    "invalid option '{}'",
                    flag
                )));
            }
            path => operand = Some(path),
        }
    }

    let dir = match operand {
        Some(path) => ctx.env.resolve(path),
        None => ctx.env.working_directory(),
    };
    let label = operand.unwrap_or(".");
    let mut entries = ctx
        .fs
        .list(&dir)
        .with_context(|| format!("cannot access '{}'", label))?;
    entries.retain(|e| all || !e.name.starts_with('.'));
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    if !long {
        let names: Vec<String> = entries.iter().map(display_name).collect();
        ctx.out.line(names.join(" "));
        return Ok(());
    }

    for entry in &entries {
        let meta = match ctx.fs.stat(&dir.join(&entry.name)) {
            Ok(meta) => meta,
            Err(e) => {
                ctx.report(e.context(format!("cannot access '{}'", entry.name)));
                continue;
            }
        };
        let modified: DateTime<Local> = meta.modified.into();
        ctx.out.line(format!(
            "{}{} {:>10} {} {}",
            type_char(meta.mode),
            meta.mode.permission_string(),
            meta.size,
            modified.format("%Y-%m-%d %H:%M"),
            display_name(entry),
        ));
    }
    Ok(())
}

pub fn cd(ctx: &mut Ctx<'_>, args: &[String]) -> Result<()> {
    let (target, label) = match args.first() {
        Some(arg) => (ctx.env.resolve(arg), arg.as_str()),
        None => match ctx.env.home_dir() {
            Some(home) => (home, "~"),
            None => return Err(ShellError::InvalidArgument("HOME not set".into())),
        },
    };

    let meta = ctx.fs.metadata(&target).context(label)?;
    if !meta.is_dir {
        return Err(ShellError::NotADirectory.context(label));
    }
    ctx.env.change_directory(&target).context(label)
}

pub fn pwd(ctx: &mut Ctx<'_>, _args: &[String]) -> Result<()> {
    let cwd = ctx.env.working_directory();
    ctx.out.line(cwd.display().to_string());
    Ok(())
}

pub fn mkdir(ctx: &mut Ctx<'_>, args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Err(ShellError::NoOperand("operand"));
    }
    for arg in args {
        let path = ctx.env.resolve(arg);
        if let Err(e) = ctx.fs.create_dir(&path) {
            ctx.report(e.context(format!("cannot create directory '{}'", arg)));
        }
    }
    Ok(())
}

pub fn touch(ctx: &mut Ctx<'_>, args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Err(ShellError::NoOperand("file operand"));
    }
    for arg in args {
        let path = ctx.env.resolve(arg);
        if let Err(e) = ctx.fs.create_empty_file(&path) {
            ctx.report(e.context(format!("cannot touch '{}'", arg)));
        }
    }
    Ok(())
}

pub fn rm(ctx: &mut Ctx<'_>, args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Err(ShellError::NoOperand("operand"));
    }
    for arg in args {
        let path = ctx.env.resolve(arg);
        if let Err(e) = ctx.fs.remove(&path) {
            ctx.report(e.context(format!("cannot remove '{}'", arg)));
        }
    }
    Ok(())
}

fn two_operands(args: &[String]) -> Result<(&str, &str)> {
    match args {
        [src, dst, ..] => Ok((src.as_str(), dst.as_str())),
        [src] => Err(ShellError::NoOperand("destination file operand")
            .context(format!("after '{}'", src))),
        [] => Err(ShellError::NoOperand("file operand")),
    }
}

pub fn cp(ctx: &mut Ctx<'_>, args: &[String]) -> Result<()> {
    let (src, dst) = two_operands(args)?;
    let from = ctx.env.resolve(src);
    let to = ctx.env.resolve(dst);
    ctx.fs.copy(&from, &to).map_err(|e| {
        if e.is_not_found() {
            e.context(format!("cannot stat '{}'", src))
        } else if matches!(e.kind(), ShellError::AlreadyExists) {
            ShellError::InvalidArgument(format!("'{}' already exists", dst))
        } else {
            e.context(format!("cannot copy '{}' to '{}'", src, dst))
        }
    })
}

pub fn mv(ctx: &mut Ctx<'_>, args: &[String]) -> Result<()> {
    let (src, dst) = two_operands(args)?;
    let from = ctx.env.resolve(src);
    let to = ctx.env.resolve(dst);
    ctx.fs.move_path(&from, &to).map_err(|e| {
        if e.is_not_found() {
            e.context(format!("cannot stat '{}'", src))
        } else {
            e.context(format!("cannot move '{}' to '{}'", src, dst))
        }
    })
}

pub fn cat(ctx: &mut Ctx<'_>, args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Err(ShellError::NoOperand("file operand"));
    }
    for arg in args {
        let path = ctx.env.resolve(arg);
        match ctx.fs.read(&path) {
            Ok(data) => {
                let mut text = String::from_utf8_lossy(&data).into_owned();
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                ctx.out.write(text);
            }
            Err(e) => ctx.report(e.context(arg.as_str())),
        }
    }
    Ok(())
}
