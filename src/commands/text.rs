//! Text commands: echo, head, tail, grep, wc

use regex::RegexBuilder;

use super::Ctx;
use crate::error::{Context, Result, ShellError};

const DEFAULT_LINES: usize = 10;

pub fn echo(ctx: &mut Ctx<'_>, args: &[String]) -> Result<()> {
    match args.split_first() {
        Some((flag, rest)) if flag == "-n" => ctx.out.write(rest.join(" ")),
        _ => ctx.out.line(args.join(" ")),
    }
    Ok(())
}

/// Parse leading `-n N` options; returns the count and the remaining args
fn line_count(args: &[String]) -> Result<(usize, &[String])> {
    let mut count = DEFAULT_LINES;
    let mut rest = args;
    while let [flag, value, tail @ ..] = rest {
        if flag != "-n" {
            break;
        }
        count = value
            .parse()
            .map_err(|_| ShellError::InvalidArgument("invalid number".into()))?;
        rest = tail;
    }
    Ok((count, rest))
}

fn read_text(ctx: &Ctx<'_>, operand: &str) -> Result<String> {
    let path = ctx.env.resolve(operand);
    let data = ctx.fs.read(&path).context(operand)?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

pub fn head(ctx: &mut Ctx<'_>, args: &[String]) -> Result<()> {
    let (count, rest) = line_count(args)?;
    let operand = rest.first().ok_or(ShellError::NoOperand("file operand"))?;
    let text = read_text(ctx, operand)?;
    for line in text.lines().take(count) {
        ctx.out.line(line);
    }
    Ok(())
}

pub fn tail(ctx: &mut Ctx<'_>, args: &[String]) -> Result<()> {
    let (count, rest) = line_count(args)?;
    let operand = rest.first().ok_or(ShellError::NoOperand("file operand"))?;
    let text = read_text(ctx, operand)?;
    let lines: Vec<&str> = text.lines().collect();
    for line in &lines[lines.len().saturating_sub(count)..] {
        ctx.out.line(line);
    }
    Ok(())
}

/// Last line of a regex error, which is the one naming the problem
fn pattern_error(err: regex::Error) -> ShellError {
    let message = err.to_string();
    let reason = message
        .lines()
        .last()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string();
    ShellError::InvalidArgument(format!("invalid pattern: {}", reason))
}

pub fn grep(ctx: &mut Ctx<'_>, args: &[String]) -> Result<()> {
    let mut ignore_case = false;
    let mut numbered = false;
    let mut rest = args;
    while let [flag, tail @ ..] = rest {
        match flag.as_str() {
            "-i" => ignore_case = true,
            "-n" => numbered = true,
            _ => break,
        }
        rest = tail;
    }
    let [pattern, operand, ..] = rest else {
        return Err(ShellError::NoOperand("pattern or file"));
    };

    let regex = RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()
        .map_err(pattern_error)?;
    let text = read_text(ctx, operand)?;
    for (idx, line) in text.lines().enumerate() {
        if !regex.is_match(line) {
            continue;
        }
        if numbered {
            ctx.out.line(format!("{}:{}", idx + 1, line));
        } else {
            ctx.out.line(line);
        }
    }
    Ok(())
}

#[derive(Default, Clone, Copy)]
struct Counts {
    lines: usize,
    words: usize,
    bytes: usize,
}

impl Counts {
    fn of(data: &[u8]) -> Self {
        let text = String::from_utf8_lossy(data);
        Self {
            lines: text.lines().count(),
            words: text.split_whitespace().count(),
            bytes: data.len(),
        }
    }

    fn add(&mut self, other: Counts) {
        self.lines += other.lines;
        self.words += other.words;
        self.bytes += other.bytes;
    }
}

#[derive(Clone, Copy)]
struct Columns {
    lines: bool,
    words: bool,
    bytes: bool,
}

impl Columns {
    fn row(&self, counts: Counts, label: &str) -> String {
        let mut parts = Vec::with_capacity(3);
        if self.lines {
            parts.push(counts.lines.to_string());
        }
        if self.words {
            parts.push(counts.words.to_string());
        }
        if self.bytes {
            parts.push(counts.bytes.to_string());
        }
        format!("{} {}", parts.join(" \t"), label)
    }
}

/// Regular files in the working directory, by name
fn regular_files(ctx: &Ctx<'_>) -> Result<Vec<String>> {
    let cwd = ctx.env.working_directory();
    let mut names: Vec<String> = ctx
        .fs
        .list(&cwd)?
        .into_iter()
        .filter(|e| !e.is_dir)
        .map(|e| e.name)
        .collect();
    names.sort();
    Ok(names)
}

pub fn wc(ctx: &mut Ctx<'_>, args: &[String]) -> Result<()> {
    let mut columns = Columns {
        lines: false,
        words: false,
        bytes: false,
    };
    let mut rest = args;
    while let [flag, tail @ ..] = rest {
        match flag.as_str() {
            "-l" => columns.lines = true,
            "-w" => columns.words = true,
            "-c" => columns.bytes = true,
            _ => break,
        }
        rest = tail;
    }
    if !(columns.lines || columns.words || columns.bytes) {
        columns = Columns {
            lines: true,
            words: true,
            bytes: true,
        };
    }

    let operands = if rest.is_empty() {
        regular_files(ctx)?
    } else {
        rest.to_vec()
    };

    let mut total = Counts::default();
    for operand in &operands {
        let path = ctx.env.resolve(operand);
        let data = match ctx.fs.read(&path) {
            Ok(data) => data,
            Err(e) => {
                ctx.report(e.context(operand.as_str()));
                continue;
            }
        };
        let counts = Counts::of(&data);
        total.add(counts);
        ctx.out.line(columns.row(counts, operand));
    }
    if operands.len() > 1 {
        ctx.out.line(columns.row(total, "total"));
    }
    Ok(())
}
