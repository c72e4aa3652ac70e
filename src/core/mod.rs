//! Core shell components.
//!
//! - **line**: splits a raw input line into a command name and arguments
//! - **mode**: permission bits and the chmod mode grammar
//! - **term**: SGR decoding and the styled text buffer
//! - **session**: input boundary, edit guard and the submit cycle
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── TextBuffer (styled runs, committed text + input line)
//! ├── SgrParser (command output -> styled runs)
//! └── Dispatcher (commands over host ports)
//! ```

pub mod line;
pub mod mode;
pub mod session;
pub mod term;
