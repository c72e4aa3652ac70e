//! Shell session
//!
//! Owns the visible buffer and the input boundary that separates committed
//! output from the line being edited. Every edit goes through [`Session::edit`],
//! which refuses to touch anything before the boundary.
//!
//! ```text
//!  AwaitingInput --submit--> Executing --output drained--> AwaitingInput
//!                                 |
//!                                 +--exit--> Exited
//! ```

use tracing::debug;

use super::line;
use super::term::{SgrParser, Style, TextBuffer};
use crate::commands::{Dispatcher, SessionControl};

/// Session lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    AwaitingInput,
    Executing,
    Exited,
}

/// An edit request from the input layer, before the boundary guard
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditAction {
    /// Delete the char before the cursor
    Backspace,
    /// Delete the char under the cursor
    Delete,
    /// Move to the start of the input line
    Home,
    End,
    Left,
    Right,
    /// Place the cursor at a buffer position
    Click(usize),
    Insert(String),
}

/// What the host should do after a submit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Continue,
    Exit,
}

pub struct Session {
    buffer: TextBuffer,
    /// Chars before this position are committed
    input_boundary: usize,
    cursor: usize,
    parser: SgrParser,
    state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            buffer: TextBuffer::new(),
            input_boundary: 0,
            cursor: 0,
            parser: SgrParser::new(),
            state: SessionState::AwaitingInput,
        }
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[allow(dead_code)]
    pub fn input_boundary(&self) -> usize {
        self.input_boundary
    }

    #[allow(dead_code)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The line being edited
    pub fn input(&self) -> String {
        self.buffer.text_from(self.input_boundary)
    }

    /// Append a prompt and open a new input line after it
    pub fn render_prompt(&mut self, prompt: &str) {
        self.buffer.push(prompt, Style::Primary);
        self.input_boundary = self.buffer.len();
        self.cursor = self.input_boundary;
        self.state = SessionState::AwaitingInput;
    }

    /// Append command output, decoding SGR markers
    pub fn write(&mut self, text: &str) {
        for run in self.parser.decode(text) {
            self.buffer.push_run(&run);
        }
        self.cursor = self.buffer.len();
    }

    /// Empty the screen and show a fresh prompt
    pub fn clear_screen(&mut self, prompt: &str) {
        SessionControl::clear(self);
        self.render_prompt(prompt);
    }

    /// Commit the input line and run it
    pub fn submit(&mut self, dispatcher: &mut Dispatcher) -> SubmitOutcome {
        if self.state != SessionState::AwaitingInput {
            return SubmitOutcome::Continue;
        }

        let raw = self.input();
        self.buffer.push("\n", Style::Primary);
        self.input_boundary = self.buffer.len();
        self.cursor = self.input_boundary;
        self.state = SessionState::Executing;

        let parsed = line::parse(&raw);
        debug!("submit {:?}", raw);
        let output = dispatcher.dispatch(&parsed.name, &parsed.args, self);
        for chunk in output {
            self.write(&chunk);
        }

        if self.state == SessionState::Exited {
            return SubmitOutcome::Exit;
        }
        self.render_prompt(&dispatcher.prompt());
        SubmitOutcome::Continue
    }

    /// Apply an edit, keeping the committed region intact
    pub fn edit(&mut self, action: EditAction) {
        if self.state != SessionState::AwaitingInput {
            return;
        }
        let len = self.buffer.len();

        match action {
            EditAction::Backspace => {
                self.recover_cursor();
                if self.cursor > self.input_boundary {
                    self.cursor -= 1;
                    self.buffer.remove(self.cursor);
                }
            }
            EditAction::Delete => {
                self.recover_cursor();
                if self.cursor < self.buffer.len() {
                    self.buffer.remove(self.cursor);
                }
            }
            EditAction::Home => self.cursor = self.input_boundary,
            EditAction::End => self.cursor = len,
            EditAction::Left => {
                self.recover_cursor();
                if self.cursor > self.input_boundary {
                    self.cursor -= 1;
                }
            }
            EditAction::Right => {
                self.recover_cursor();
                self.cursor = (self.cursor + 1).min(len);
            }
            EditAction::Click(pos) => {
                self.cursor = if pos < self.input_boundary {
                    len
                } else {
                    pos.min(len)
                };
            }
            EditAction::Insert(text) => {
                self.recover_cursor();
                let text: String = text
                    .chars()
                    .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
                    .collect();
                self.buffer.insert(self.cursor, &text, Style::Primary);
                self.cursor += text.chars().count();
            }
        }
    }

    /// A cursor in the committed region jumps to the end before a key acts
    fn recover_cursor(&mut self) {
        if self.cursor < self.input_boundary {
            self.cursor = self.buffer.len();
        }
    }
}

impl SessionControl for Session {
    fn clear(&mut self) {
        self.buffer.clear();
        self.input_boundary = 0;
        self.cursor = 0;
    }

    fn on_exit(&mut self) {
        self.state = SessionState::Exited;
    }
}
