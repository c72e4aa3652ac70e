//! Styled text buffer
//!
//! The whole visible surface is one sequence of styled runs. Positions are
//! counted in chars from the start of the buffer.

/// Display style of a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Style {
    /// Default foreground (prompt, plain output, typed input)
    #[default]
    Primary,
    /// Alternate foreground (directories in listings)
    Highlight,
}

/// A contiguous span of text in one style
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub style: Style,
}

impl StyledRun {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Byte index of the `n`th char of `s` (or `s.len()` past the end)
fn byte_index(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

#[derive(Clone, Debug, Default)]
pub struct TextBuffer {
    runs: Vec<StyledRun>,
    len: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Length in chars
    pub fn len(&self) -> usize {
        self.len
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[allow(dead_code)]
    pub fn runs(&self) -> &[StyledRun] {
        &self.runs
    }

    pub fn clear(&mut self) {
        self.runs.clear();
        self.len = 0;
    }

    /// Append at the end, merging with the last run when the style matches
    pub fn push(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        self.len += text.chars().count();
        match self.runs.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.runs.push(StyledRun::new(text, style)),
        }
    }

    pub fn push_run(&mut self, run: &StyledRun) {
        self.push(&run.text, run.style);
    }

    /// Locate the run holding `pos` and the char offset inside it
    fn locate(&self, pos: usize) -> Option<(usize, usize)> {
        let mut start = 0;
        for (idx, run) in self.runs.iter().enumerate() {
            let len = run.char_len();
            if pos < start + len {
                return Some((idx, pos - start));
            }
            start += len;
        }
        None
    }

    /// Insert `text` so that its first char lands at `pos`
    pub fn insert(&mut self, pos: usize, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        let Some((idx, offset)) = self.locate(pos) else {
            self.push(text, style);
            return;
        };

        self.len += text.chars().count();
        let run = &mut self.runs[idx];
        let at = byte_index(&run.text, offset);
        if run.style == style {
            run.text.insert_str(at, text);
            return;
        }

        let tail = run.text.split_off(at);
        let run_style = run.style;
        let mut insert_at = idx + 1;
        if run.text.is_empty() {
            self.runs.remove(idx);
            insert_at = idx;
        }
        self.runs.insert(insert_at, StyledRun::new(text, style));
        self.runs.insert(insert_at + 1, StyledRun::new(tail, run_style));
    }

    /// Remove and return the char at `pos`
    pub fn remove(&mut self, pos: usize) -> Option<char> {
        let (idx, offset) = self.locate(pos)?;
        let run = &mut self.runs[idx];
        let at = byte_index(&run.text, offset);
        let ch = run.text.remove(at);
        if run.text.is_empty() {
            self.runs.remove(idx);
        }
        self.len -= 1;
        Some(ch)
    }

    /// Text from `pos` to the end of the buffer
    pub fn text_from(&self, pos: usize) -> String {
        self.chars().skip(pos).map(|(ch, _)| ch).collect()
    }

    /// Whole buffer as plain text
    #[allow(dead_code)]
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Every char with its style, in order
    pub fn chars(&self) -> impl Iterator<Item = (char, Style)> + '_ {
        self.runs
            .iter()
            .flat_map(|run| run.text.chars().map(move |ch| (ch, run.style)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_merges_same_style() {
        let mut buf = TextBuffer::new();
        buf.push("ab", Style::Primary);
        buf.push("cd", Style::Primary);
        buf.push("ef", Style::Highlight);
        assert_eq!(buf.runs().len(), 2);
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.text(), "abcdef");
    }

    #[test]
    fn test_insert_splits_other_style() {
        let mut buf = TextBuffer::new();
        buf.push("abcd", Style::Highlight);
        buf.insert(2, "X", Style::Primary);
        assert_eq!(
            buf.runs(),
            &[
                StyledRun::new("ab", Style::Highlight),
                StyledRun::new("X", Style::Primary),
                StyledRun::new("cd", Style::Highlight),
            ]
        );
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn test_insert_at_run_start_and_end() {
        let mut buf = TextBuffer::new();
        buf.push("cd", Style::Highlight);
        buf.insert(0, "ab", Style::Primary);
        buf.insert(4, "!", Style::Primary);
        assert_eq!(buf.text(), "abcd!");
        assert_eq!(buf.runs()[0], StyledRun::new("ab", Style::Primary));
    }

    #[test]
    fn test_remove_multibyte() {
        let mut buf = TextBuffer::new();
        buf.push("aé", Style::Primary);
        buf.push("ü", Style::Highlight);
        assert_eq!(buf.remove(2), Some('ü'));
        assert_eq!(buf.remove(1), Some('é'));
        assert_eq!(buf.remove(5), None);
        assert_eq!(buf.text(), "a");
        assert_eq!(buf.runs().len(), 1);
    }

    #[test]
    fn test_text_from() {
        let mut buf = TextBuffer::new();
        buf.push("/tmp$ ", Style::Primary);
        buf.push("ls -a", Style::Primary);
        assert_eq!(buf.text_from(6), "ls -a");
        assert_eq!(buf.text_from(99), "");
    }
}
