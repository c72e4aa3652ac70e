//! Error types shared by the host ports and command handlers.
//!
//! Every failure a command can hit is one of a handful of kinds. Handlers
//! attach a context string (usually the operand) and the dispatcher prints
//! the result as a single `<command>: <context>: <reason>` line.

use std::io;

use thiserror::Error;

use crate::core::mode::ModeError;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("No such file or directory")]
    NotFound,

    #[error("File exists")]
    AlreadyExists,

    #[error("Not a directory")]
    NotADirectory,

    #[error("Is a directory")]
    IsADirectory,

    #[error("Permission denied")]
    PermissionDenied,

    /// Bad numeric argument, bad pattern, bad mode spec
    #[error("{0}")]
    InvalidArgument(String),

    /// A required operand was not given; the payload names it ("operand", "file operand")
    #[error("missing {0}")]
    NoOperand(&'static str),

    #[error("{0}")]
    Io(#[source] io::Error),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ShellError>,
    },
}

pub type Result<T> = std::result::Result<T, ShellError>;

impl ShellError {
    /// Innermost error kind, skipping any context wrappers
    pub fn kind(&self) -> &ShellError {
        match self {
            ShellError::Context { source, .. } => source.kind(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind(), ShellError::NotFound)
    }

    /// Wrap this error with a context string
    pub fn context(self, context: impl Into<String>) -> Self {
        ShellError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<io::Error> for ShellError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ShellError::NotFound,
            io::ErrorKind::AlreadyExists => ShellError::AlreadyExists,
            io::ErrorKind::PermissionDenied => ShellError::PermissionDenied,
            io::ErrorKind::InvalidInput => ShellError::InvalidArgument(err.to_string()),
            _ => match err.raw_os_error() {
                // ENOTDIR / EISDIR are not stable io::ErrorKind variants yet
                Some(20) => ShellError::NotADirectory,
                Some(21) => ShellError::IsADirectory,
                _ => ShellError::Io(err),
            },
        }
    }
}

impl From<ModeError> for ShellError {
    fn from(err: ModeError) -> Self {
        ShellError::InvalidArgument(err.to_string())
    }
}

/// Attach a context string to a failing result
pub trait Context<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: Into<ShellError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ShellError::Context {
            context: context.into(),
            source: Box::new(e.into()),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| ShellError::Context {
            context: f().into(),
            source: Box::new(e.into()),
        })
    }
}
