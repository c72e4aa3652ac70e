//! linsim - A Linux-like shell simulator
//!
//! linsim draws a single scrollable surface with a prompt, runs a fixed set
//! of built-in commands against the real filesystem and keeps everything
//! before the current prompt read-only.
//!
//! # Features
//!
//! - **Built-ins**: ls, cd, pwd, mkdir, touch, rm, cp, mv, cat, chmod,
//!   echo, head, tail, grep, wc, date, whoami, hostname, clear, help, exit
//! - **chmod**: octal and symbolic modes, `-R` with per-entry error isolation
//! - **Coloured listings**: directories drawn in the highlight colour
//! - **Color Schemes**: classic, amber, solarized-dark, mono
//!
//! # Quick Start
//!
//! ```text
//! linsim                 # Start in the configured directory (home by default)
//! linsim -d /tmp         # Start in /tmp
//! linsim --scheme amber  # Amber on black
//! ```
//!
//! # Keys
//!
//! | Key | Action |
//! |-----|--------|
//! | Enter | Run the input line |
//! | Home / End | Start / end of the input line |
//! | Ctrl+L | Clear the screen |
//! | PageUp / PageDown | Scroll |

mod commands;
mod config;
mod core;
mod error;
mod host;
mod ui;

use std::env;
use std::path::PathBuf;

use crossterm::event::{self, Event, KeyEventKind};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::commands::Dispatcher;
use crate::config::{ColorScheme, Config as LinsimConfig};
use crate::core::session::{EditAction, Session, SubmitOutcome};
use crate::host::{LocalEnv, LocalFs};
use crate::ui::{Action, KeyMapper, Renderer};

/// Command-line options
#[derive(Default)]
struct Args {
    /// Starting directory
    dir: Option<PathBuf>,
    /// Color scheme override
    scheme: Option<String>,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("linsim {}", VERSION);
}

fn print_help() {
    eprintln!("linsim {} - A Linux-like shell simulator", VERSION);
    eprintln!();
    eprintln!("Usage: linsim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -d, --dir <DIR>       Start in DIR instead of the configured directory");
    eprintln!("      --scheme <NAME>   Color scheme");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  Enter                 Run the input line");
    eprintln!("  Home / End            Start / end of the input line");
    eprintln!("  Ctrl+L                Clear the screen");
    eprintln!("  PageUp / PageDown     Scroll (Shift for larger steps)");
    eprintln!();
    eprintln!("Type 'help' at the prompt for the list of commands.");
    eprintln!();
    eprintln!("Configuration: ~/.linsim/config.toml");
    eprintln!();
    eprintln!("Color schemes: {}", ColorScheme::list().join(", "));
    eprintln!();
    eprintln!("Exit: Type 'exit' at the prompt");
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-d" | "--dir" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing directory argument".to_string());
                }
                parsed.dir = Some(PathBuf::from(&args[i]));
            }
            "--scheme" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing scheme argument".to_string());
                }
                parsed.scheme = Some(args[i].clone());
            }
            arg => {
                return Err(format!("Unknown argument: {}", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

/// Log to `~/.linsim/linsim.log`; RUST_LOG overrides the INFO default
fn init_logging() {
    let log_path = config::config_dir()
        .map(|dir| dir.join("linsim.log"))
        .unwrap_or_else(|| PathBuf::from("linsim.log"));

    // Open log file (append mode)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("linsim {} starting...", VERSION);

    let config = LinsimConfig::load();
    let scheme = match &args.scheme {
        Some(name) => ColorScheme::by_name(name),
        None => config.get_color_scheme(),
    };
    let start = args
        .dir
        .or_else(|| config.start_dir())
        .or_else(dirs::home_dir);
    info!("start dir {:?}, scheme {}", start, scheme.name);

    let env = LocalEnv::new(start);
    let mut dispatcher = Dispatcher::new(Box::new(LocalFs::new()), Box::new(env))
        .with_prompt_suffix(config.prompt.suffix.clone());
    let mut session = Session::new();
    session.render_prompt(&dispatcher.prompt());

    let mut renderer = Renderer::new(scheme);
    renderer.init()?;
    let result = run_main_loop(&mut session, &mut dispatcher, &mut renderer);
    renderer.cleanup()?;

    if let Err(e) = &result {
        error!("main loop failed: {:#}", e);
    }
    info!("linsim exiting");
    result
}

fn run_main_loop(
    session: &mut Session,
    dispatcher: &mut Dispatcher,
    renderer: &mut Renderer,
) -> anyhow::Result<()> {
    loop {
        renderer.render(session)?;

        let action = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => KeyMapper::map(&key),
            Event::Mouse(mouse) => KeyMapper::map_mouse(&mouse),
            Event::Paste(text) => Some(Action::Edit(EditAction::Insert(text))),
            // Next render picks up the new size
            Event::Resize(_, _) => None,
            _ => None,
        };
        let Some(action) = action else {
            continue;
        };

        match action {
            Action::Submit => {
                renderer.scroll_to_bottom();
                if session.submit(dispatcher) == SubmitOutcome::Exit {
                    info!("exit requested");
                    return Ok(());
                }
            }
            Action::Edit(edit) => {
                renderer.scroll_to_bottom();
                session.edit(edit);
            }
            Action::ClearScreen => {
                renderer.scroll_to_bottom();
                session.clear_screen(&dispatcher.prompt());
            }
            Action::ScrollUp(n) => renderer.scroll_up(n),
            Action::ScrollDown(n) => renderer.scroll_down(n),
            Action::Click { col, row } => {
                if let Some(pos) = renderer.position_at(col, row) {
                    session.edit(EditAction::Click(pos));
                }
            }
        }
    }
}
