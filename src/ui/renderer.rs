//! Terminal renderer using crossterm
//!
//! Lays the session buffer out into screen rows and draws the tail of it.
//! The layout of the last frame is kept so mouse clicks can be mapped back
//! to buffer positions.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use unicode_width::UnicodeWidthChar;

use crate::config::ColorScheme;
use crate::core::session::Session;
use crate::core::term::{Style, TextBuffer};

/// Shown in place of chars with no display width (stray control bytes)
const REPLACEMENT: char = '\u{fffd}';

/// One char placed on a row
#[derive(Clone, Debug, PartialEq)]
struct Cell {
    ch: char,
    style: Style,
    /// Buffer position of the char
    pos: usize,
    width: u16,
}

/// One screen row of the laid-out buffer
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisualLine {
    cells: Vec<Cell>,
    /// Buffer position of the first char on the row
    start: usize,
    /// Position just past the row: its newline, or the first char of the next row
    end: usize,
    /// Row ended with a hard newline
    hard_break: bool,
}

impl VisualLine {
    fn new(start: usize) -> Self {
        Self {
            start,
            end: start,
            ..Self::default()
        }
    }

    fn width(&self) -> u16 {
        self.cells.iter().map(|c| c.width).sum()
    }

    /// Buffer position under screen column `col`
    fn position_at(&self, col: u16) -> usize {
        let mut x = 0;
        for cell in &self.cells {
            if col < x + cell.width {
                return cell.pos;
            }
            x += cell.width;
        }
        self.end
    }

    /// Screen column of buffer position `pos`
    fn column_of(&self, pos: usize) -> u16 {
        self.cells
            .iter()
            .take_while(|c| c.pos < pos)
            .map(|c| c.width)
            .sum()
    }
}

fn display_char(ch: char) -> (char, u16) {
    match ch.width() {
        Some(w) if w > 0 => (ch, w as u16),
        _ => (REPLACEMENT, 1),
    }
}

/// Break the buffer into rows at newlines and at `cols` display columns
pub fn layout(buffer: &TextBuffer, cols: u16) -> Vec<VisualLine> {
    let cols = cols.max(1);
    let mut lines = Vec::new();
    let mut line = VisualLine::new(0);

    for (pos, (ch, style)) in buffer.chars().enumerate() {
        if ch == '\n' {
            line.end = pos;
            line.hard_break = true;
            lines.push(std::mem::replace(&mut line, VisualLine::new(pos + 1)));
            continue;
        }
        let (shown, width) = display_char(ch);
        if line.width() + width > cols && !line.cells.is_empty() {
            line.end = pos;
            lines.push(std::mem::replace(&mut line, VisualLine::new(pos)));
        }
        line.cells.push(Cell {
            ch: shown,
            style,
            pos,
            width,
        });
    }
    line.end = buffer.len();
    lines.push(line);
    lines
}

/// Row and column of buffer position `pos`
fn locate(lines: &[VisualLine], pos: usize) -> (usize, u16) {
    for (idx, line) in lines.iter().enumerate() {
        let last = idx + 1 == lines.len();
        if pos >= line.start && (pos < line.end || (pos == line.end && (line.hard_break || last))) {
            return (idx, line.column_of(pos));
        }
    }
    let idx = lines.len().saturating_sub(1);
    (idx, lines.get(idx).map(VisualLine::width).unwrap_or(0))
}

/// Terminal renderer
pub struct Renderer {
    scheme: ColorScheme,
    /// Whether the terminal has been initialized
    initialized: bool,
    /// Rows scrolled back from the bottom
    scroll_offset: usize,
    /// Layout of the last frame
    frame: Vec<VisualLine>,
    /// Index in `frame` of the top screen row
    top: usize,
}

impl Renderer {
    pub fn new(scheme: ColorScheme) -> Self {
        Self {
            scheme,
            initialized: false,
            scroll_offset: 0,
            frame: Vec::new(),
            top: 0,
        }
    }

    /// Initialize the terminal for rendering
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste,
            DisableLineWrap,
            SetBackgroundColor(self.scheme.background.to_crossterm()),
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;
        stdout.flush()?;
        self.initialized = true;
        Ok(())
    }

    /// Cleanup the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();

        // Reset all attributes first
        let _ = execute!(stdout, ResetColor, SetAttribute(Attribute::Reset));
        let _ = execute!(stdout, Show, EnableLineWrap);
        let _ = execute!(stdout, DisableBracketedPaste, DisableMouseCapture);
        let _ = execute!(stdout, LeaveAlternateScreen);
        let _ = stdout.flush();

        // Disable raw mode - this is the most important part
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn scroll_up(&mut self, n: usize) {
        let max = self.frame.len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + n).min(max);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }

    /// Jump back to the bottom, e.g. after typing
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Buffer position under a screen cell of the last frame.
    ///
    /// Clicks below the text map to the end of the buffer.
    pub fn position_at(&self, col: u16, row: u16) -> Option<usize> {
        let last = self.frame.last()?;
        match self.frame.get(self.top + row as usize) {
            Some(line) => Some(line.position_at(col)),
            None => Some(last.end),
        }
    }

    fn color(&self, style: Style) -> crossterm::style::Color {
        match style {
            Style::Primary => self.scheme.primary.to_crossterm(),
            Style::Highlight => self.scheme.highlight.to_crossterm(),
        }
    }

    /// Render the session buffer
    pub fn render(&mut self, session: &Session) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        let rows = rows.max(1) as usize;

        self.frame = layout(session.buffer(), cols);
        let bottom = self.frame.len().saturating_sub(self.scroll_offset);
        self.top = bottom.saturating_sub(rows);

        // Use a buffered writer for better performance
        let stdout = io::stdout();
        let mut stdout = io::BufWriter::with_capacity(65536, stdout.lock());

        // Begin synchronized update (reduces flicker)
        write!(stdout, "\x1b[?2026h")?;
        queue!(
            stdout,
            Hide,
            SetBackgroundColor(self.scheme.background.to_crossterm())
        )?;

        for screen_row in 0..rows {
            queue!(stdout, MoveTo(0, screen_row as u16), Clear(ClearType::UntilNewLine))?;
            let Some(line) = self.frame.get(self.top + screen_row) else {
                continue;
            };
            let mut current = None;
            for cell in &line.cells {
                if current != Some(cell.style) {
                    queue!(stdout, SetForegroundColor(self.color(cell.style)))?;
                    current = Some(cell.style);
                }
                queue!(stdout, Print(cell.ch))?;
            }
        }

        let (cursor_row, cursor_col) = locate(&self.frame, session.cursor());
        if cursor_row >= self.top && cursor_row < self.top + rows {
            let col = cursor_col.min(cols.saturating_sub(1));
            queue!(stdout, MoveTo(col, (cursor_row - self.top) as u16), Show)?;
        }

        // End synchronized update
        write!(stdout, "\x1b[?2026l")?;
        stdout.flush()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
