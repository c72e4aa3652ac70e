//! SGR sequence parser
//!
//! Splits command output on `ESC [ <params> m` markers and tags each piece of
//! text with the style active at that point. The active style survives
//! between calls, so a marker at the end of one write colours the next.

use super::buffer::{Style, StyledRun};

/// SGR code selecting the primary foreground
pub const SGR_PRIMARY: u16 = 32;
/// SGR code selecting the highlight foreground
pub const SGR_HIGHLIGHT: u16 = 96;
/// SGR reset, which falls back to the primary style
pub const SGR_RESET: u16 = 0;

#[derive(Clone, Copy, Default, PartialEq)]
enum ParserState {
    #[default]
    Ground,
    Escape,
    CsiParam,
}

/// Decoder state machine
pub struct SgrParser {
    style: Style,
    state: ParserState,
    params: Vec<u16>,
    current_param: Option<u16>,
}

impl Default for SgrParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SgrParser {
    pub fn new() -> Self {
        Self {
            style: Style::Primary,
            state: ParserState::Ground,
            params: Vec::with_capacity(4),
            current_param: None,
        }
    }

    /// Style that the next decoded text will carry
    #[allow(dead_code)]
    pub fn style(&self) -> Style {
        self.style
    }

    /// Decode one write into styled runs.
    ///
    /// A marker that is not closed by `m` is not an error: the rest of the
    /// input, marker included, is emitted as text in the current style.
    /// A CSI ending in any other final byte (`ESC[2J`) counts as unclosed,
    /// so markers after it in the same write stay literal too.
    pub fn decode(&mut self, input: &str) -> Vec<StyledRun> {
        let mut runs = Vec::new();
        let mut text = String::new();
        let mut marker_start = 0;

        for (idx, ch) in input.char_indices() {
            match self.state {
                ParserState::Ground => {
                    if ch == '\x1b' {
                        self.state = ParserState::Escape;
                        marker_start = idx;
                    } else {
                        text.push(ch);
                    }
                }
                ParserState::Escape => {
                    if ch == '[' {
                        self.state = ParserState::CsiParam;
                        self.params.clear();
                        self.current_param = None;
                    } else {
                        // Lone ESC is plain text
                        text.push('\x1b');
                        if ch == '\x1b' {
                            marker_start = idx;
                        } else {
                            text.push(ch);
                            self.state = ParserState::Ground;
                        }
                    }
                }
                ParserState::CsiParam => match ch {
                    '0'..='9' => {
                        let digit = ch as u16 - '0' as u16;
                        self.current_param = Some(
                            self.current_param
                                .unwrap_or(0)
                                .saturating_mul(10)
                                .saturating_add(digit),
                        );
                    }
                    ';' => {
                        self.params.push(self.current_param.take().unwrap_or(0));
                    }
                    'm' => {
                        if let Some(p) = self.current_param.take() {
                            self.params.push(p);
                        }
                        let previous = self.style;
                        self.execute_sgr();
                        if self.style != previous && !text.is_empty() {
                            runs.push(StyledRun::new(std::mem::take(&mut text), previous));
                        }
                        self.state = ParserState::Ground;
                    }
                    _ => {
                        text.push_str(&input[marker_start..]);
                        self.state = ParserState::Ground;
                        break;
                    }
                },
            }
        }

        // Input ended inside a marker
        if self.state != ParserState::Ground {
            text.push_str(&input[marker_start..]);
            self.state = ParserState::Ground;
        }

        if !text.is_empty() {
            runs.push(StyledRun::new(text, self.style));
        }
        runs
    }

    fn execute_sgr(&mut self) {
        if self.params.is_empty() {
            self.style = Style::Primary;
            return;
        }

        for &param in &self.params {
            match param {
                SGR_RESET | SGR_PRIMARY => self.style = Style::Primary,
                SGR_HIGHLIGHT => self.style = Style::Highlight,
                other => tracing::debug!("Ignoring SGR code {}", other),
            }
        }
    }
}
