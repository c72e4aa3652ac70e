//! Command table and dispatcher.
//!
//! Every built-in is a row in [`COMMANDS`]: a name, a one-line usage
//! string, a summary for `help`, and a handler. The dispatcher owns the
//! host ports and hands each handler a [`Ctx`] to write its output into.
//!
//! ```text
//! Dispatcher::dispatch(name, args, control)
//! ├── unknown name        -> "<name>: command not found"
//! ├── ?, -h, --help first -> "Usage: <usage>"
//! └── handler(ctx, args)
//!     └── Err(e)          -> "<name>: <e>"
//! ```

mod chmod;
mod files;
mod system;
mod text;

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::error::{Result, ShellError};
use crate::host::{Environment, FileSystem};

/// Session operations a command may trigger
pub trait SessionControl {
    /// Empty the visible buffer
    fn clear(&mut self);
    /// Leave the session after the current command
    fn on_exit(&mut self);
}

/// Text a command produced, drained chunk by chunk by the session.
///
/// Chunks may carry SGR markers; the session decodes them on write.
#[derive(Debug, Default)]
pub struct Output {
    chunks: VecDeque<String>,
}

impl Output {
    /// Append `text` followed by a newline
    pub fn line(&mut self, text: impl AsRef<str>) {
        let mut chunk = String::with_capacity(text.as_ref().len() + 1);
        chunk.push_str(text.as_ref());
        chunk.push('\n');
        self.chunks.push_back(chunk);
    }

    /// Append `text` as is
    pub fn write(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.chunks.push_back(text);
        }
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl Iterator for Output {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.chunks.pop_front()
    }
}

/// What a handler gets to work with
pub struct Ctx<'a> {
    pub name: &'static str,
    pub fs: &'a dyn FileSystem,
    pub env: &'a mut dyn Environment,
    pub out: &'a mut Output,
    pub control: &'a mut dyn SessionControl,
}

impl Ctx<'_> {
    /// Print a diagnostic for one operand and carry on
    pub fn report(&mut self, err: ShellError) {
        warn!("{}: {}", self.name, err);
        self.out.line(format!("{}: {}", self.name, err));
    }
}

type Handler = fn(&mut Ctx<'_>, &[String]) -> Result<()>;

/// One built-in command
pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
    run: Handler,
}

pub const COMMANDS: &[Command] = &[
    Command {
        name: "ls",
        usage: "ls [-l] [-a|-la|-al] [dir]",
        summary: "List directory contents",
        run: files::ls,
    },
    Command {
        name: "cd",
        usage: "cd [dir]",
        summary: "Change directory (home if omitted)",
        run: files::cd,
    },
    Command {
        name: "pwd",
        usage: "pwd",
        summary: "Print working directory",
        run: files::pwd,
    },
    Command {
        name: "mkdir",
        usage: "mkdir <dir>...",
        summary: "Create directories",
        run: files::mkdir,
    },
    Command {
        name: "touch",
        usage: "touch <file>...",
        summary: "Create empty files (truncating existing ones)",
        run: files::touch,
    },
    Command {
        name: "rm",
        usage: "rm <path>...",
        summary: "Remove files or directories",
        run: files::rm,
    },
    Command {
        name: "cp",
        usage: "cp <src> <dst>",
        summary: "Copy a file or directory",
        run: files::cp,
    },
    Command {
        name: "mv",
        usage: "mv <src> <dst>",
        summary: "Move or rename",
        run: files::mv,
    },
    Command {
        name: "cat",
        usage: "cat <file>...",
        summary: "Print file contents",
        run: files::cat,
    },
    Command {
        name: "chmod",
        usage: "chmod [-R] <mode> <path>...",
        summary: "Change permissions (octal or symbolic)",
        run: chmod::chmod,
    },
    Command {
        name: "echo",
        usage: "echo [-n] [text...]",
        summary: "Print text",
        run: text::echo,
    },
    Command {
        name: "head",
        usage: "head [-n N] <file>",
        summary: "First N lines of a file (default 10)",
        run: text::head,
    },
    Command {
        name: "tail",
        usage: "tail [-n N] <file>",
        summary: "Last N lines of a file (default 10)",
        run: text::tail,
    },
    Command {
        name: "grep",
        usage: "grep [-i] [-n] <pattern> <file>",
        summary: "Print lines matching a regular expression",
        run: text::grep,
    },
    Command {
        name: "wc",
        usage: "wc [-l] [-w] [-c] [file...]",
        summary: "Count lines, words and bytes",
        run: text::wc,
    },
    Command {
        name: "date",
        usage: "date",
        summary: "Print the current date and time",
        run: system::date,
    },
    Command {
        name: "whoami",
        usage: "whoami",
        summary: "Print the current user",
        run: system::whoami,
    },
    Command {
        name: "hostname",
        usage: "hostname",
        summary: "Print the host name",
        run: system::hostname,
    },
    Command {
        name: "clear",
        usage: "clear",
        summary: "Clear the screen",
        run: system::clear,
    },
    Command {
        name: "help",
        usage: "help",
        summary: "Show this list",
        run: system::help,
    },
    Command {
        name: "exit",
        usage: "exit",
        summary: "Leave the shell",
        run: system::exit,
    },
];

pub fn lookup(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|c| c.name == name)
}

fn wants_help(arg: Option<&String>) -> bool {
    matches!(arg.map(String::as_str), Some("?" | "-h" | "--help"))
}

/// Routes parsed command lines to handlers over a pair of host ports
pub struct Dispatcher {
    fs: Box<dyn FileSystem>,
    env: Box<dyn Environment>,
    prompt_suffix: String,
}

impl Dispatcher {
    pub fn new(fs: Box<dyn FileSystem>, env: Box<dyn Environment>) -> Self {
        Self {
            fs,
            env,
            prompt_suffix: "$ ".to_string(),
        }
    }

    pub fn with_prompt_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.prompt_suffix = suffix.into();
        self
    }

    /// Prompt text for the current working directory
    pub fn prompt(&self) -> String {
        format!(
            "{}{}",
            self.env.working_directory().display(),
            self.prompt_suffix
        )
    }

    /// Run one command. An empty name is a no-op.
    pub fn dispatch(
        &mut self,
        name: &str,
        args: &[String],
        control: &mut dyn SessionControl,
    ) -> Output {
        let mut out = Output::default();
        if name.is_empty() {
            return out;
        }

        let Some(command) = lookup(name) else {
            debug!("unknown command {:?}", name);
            out.line(format!("{}: command not found", name));
            return out;
        };

        debug!("dispatch {} {:?}", command.name, args);
        if wants_help(args.first()) {
            out.line(format!("Usage: {}", command.usage));
            return out;
        }

        let mut ctx = Ctx {
            name: command.name,
            fs: self.fs.as_ref(),
            env: self.env.as_mut(),
            out: &mut out,
            control,
        };
        if let Err(e) = (command.run)(&mut ctx, args) {
            ctx.report(e);
        }
        out
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::host::memory::{FixedEnv, MemFs};

    /// Records control calls
    #[derive(Default)]
    pub struct Recorder {
        pub cleared: usize,
        pub exited: bool,
    }

    impl SessionControl for Recorder {
        fn clear(&mut self) {
            self.cleared += 1;
        }

        fn on_exit(&mut self) {
            self.exited = true;
        }
    }

    pub fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Run `line` and return everything it printed
    pub fn run(dispatcher: &mut Dispatcher, line: &str) -> String {
        let parsed = crate::core::line::parse(line);
        let mut recorder = Recorder::default();
        dispatcher
            .dispatch(&parsed.name, &parsed.args, &mut recorder)
            .collect()
    }

    pub fn dispatcher(fs: MemFs, cwd: &str) -> Dispatcher {
        Dispatcher::new(Box::new(fs), Box::new(FixedEnv::new(cwd)))
    }

    #[test]
    fn test_unknown_command() {
        let mut d = dispatcher(MemFs::new(), "/");
        assert_eq!(run(&mut d, "foo bar"), "foo: command not found\n");
    }

    #[test]
    fn test_empty_line_is_noop() {
        let mut d = dispatcher(MemFs::new(), "/");
        let mut recorder = Recorder::default();
        let out = d.dispatch("", &[], &mut recorder);
        assert!(out.is_empty());
    }

    #[test]
    fn test_help_short_circuit() {
        let fs = MemFs::new().with_file("/keep", "x");
        let mut d = dispatcher(fs, "/");
        for flag in ["?", "-h", "--help"] {
            let out = run(&mut d, &format!("rm {} keep", flag));
            assert_eq!(out, "Usage: rm <path>...\n");
        }
        assert_eq!(run(&mut d, "cat keep"), "x\n");
    }

    #[test]
    fn test_help_flag_not_first_is_an_operand() {
        let mut d = dispatcher(MemFs::new(), "/");
        assert_eq!(run(&mut d, "echo hi -h"), "hi -h\n");
    }

    #[test]
    fn test_every_command_has_usage() {
        let mut d = dispatcher(MemFs::new(), "/");
        for command in COMMANDS {
            let out = run(&mut d, &format!("{} --help", command.name));
            assert_eq!(out, format!("Usage: {}\n", command.usage));
        }
    }

    #[test]
    fn test_control_calls() {
        let mut d = dispatcher(MemFs::new(), "/");
        let mut recorder = Recorder::default();
        d.dispatch("clear", &[], &mut recorder).for_each(drop);
        d.dispatch("exit", &[], &mut recorder).for_each(drop);
        assert_eq!(recorder.cleared, 1);
        assert!(recorder.exited);
    }

    #[test]
    fn test_prompt_tracks_cwd() {
        let fs = MemFs::new().with_dir("/work");
        let mut d = dispatcher(fs, "/").with_prompt_suffix("> ");
        assert_eq!(d.prompt(), "/> ");
        run(&mut d, "cd work");
        assert_eq!(d.prompt(), "/work> ");
    }
}
