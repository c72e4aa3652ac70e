//! Command line tokenizer
//!
//! Splits a submitted line into a command name and its arguments using
//! POSIX shell quoting: single quotes are literal, double quotes allow
//! backslash escapes of `"`, `\`, `$` and `` ` ``, and a bare backslash
//! escapes the next character. Malformed quoting never fails the line; it
//! falls back to a plain whitespace split.

/// A tokenized command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

impl ParsedCommand {
    /// True when the line held nothing but whitespace
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.args.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq)]
enum QuoteState {
    None,
    Single,
    Double,
}

/// Parse a raw line into `(name, args)`.
pub fn parse(raw: &str) -> ParsedCommand {
    let line = raw.trim();
    let mut parts = split_quoted(line)
        .unwrap_or_else(|| line.split_whitespace().map(str::to_string).collect());

    if parts.is_empty() {
        return ParsedCommand::default();
    }
    let name = parts.remove(0);
    ParsedCommand { name, args: parts }
}

/// Shell-style split. Returns `None` on an unterminated quote or a dangling escape.
fn split_quoted(line: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // A quoted empty string ('' or "") still produces a token
    let mut in_token = false;
    let mut state = QuoteState::None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match state {
            QuoteState::None => match ch {
                '\'' => {
                    state = QuoteState::Single;
                    in_token = true;
                }
                '"' => {
                    state = QuoteState::Double;
                    in_token = true;
                }
                '\\' => {
                    current.push(chars.next()?);
                    in_token = true;
                }
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
            QuoteState::Single => match ch {
                '\'' => state = QuoteState::None,
                c => current.push(c),
            },
            QuoteState::Double => match ch {
                '"' => state = QuoteState::None,
                '\\' => {
                    let next = chars.next()?;
                    if !matches!(next, '"' | '\\' | '$' | '`' | '\n') {
                        current.push('\\');
                    }
                    current.push(next);
                }
                c => current.push(c),
            },
        }
    }

    if state != QuoteState::None {
        return None;
    }
    if in_token {
        tokens.push(current);
    }
    Some(tokens)
}
