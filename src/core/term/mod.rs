//! Styled output: SGR decoding and the text buffer it feeds.

pub mod buffer;
pub mod parser;

pub use buffer::{Style, TextBuffer};
pub use parser::SgrParser;
