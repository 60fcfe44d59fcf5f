//! Character-level scanning shared by the JSON sublanguage and the module
//! grammar. Tracks line/column so every later error can report a precise
//! location (spec §4.2: "a later error reports line and column from the
//! token carried through").

use pfsc_errors::PfscError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub col: u32,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

pub struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    pub fn new(src: &str) -> Self {
        Cursor { chars: src.chars().collect(), pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn reset_to(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    pub fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c2) = self.peek() {
                    if c2 == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    pub fn expect(&mut self, c: char) -> Result<(), PfscError> {
        if self.peek() == Some(c) {
            self.bump();
            Ok(())
        } else {
            Err(PfscError::ParsingError(format!(
                "expected '{c}' at {}",
                self.span_from(self.pos)
            )))
        }
    }

    pub fn slice_from(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    /// Line/column of `pos`, 1-indexed, computed against the original source.
    pub fn span_from(&self, pos: usize) -> Span {
        let consumed: String = self.chars[..pos.min(self.chars.len())].iter().collect();
        let line = 1 + consumed.matches('\n').count() as u32;
        let col = match consumed.rfind('\n') {
            Some(idx) => (consumed[idx + 1..].chars().count() + 1) as u32,
            None => (consumed.chars().count() + 1) as u32,
        };
        Span { line, col }
    }

    pub fn take_ident(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        self.slice_from(start)
    }

    /// Reads one of the four pfsc string forms starting at the current
    /// position: `"""..."""`, `'''...'''` (no escape processing, WYSIWYG),
    /// `"..."`, `'...'` (backslash escapes `\"`/`\'` recognised, newlines
    /// accepted literally as multi-line content).
    pub fn take_string_literal(&mut self) -> Result<String, PfscError> {
        let quote = self
            .peek()
            .filter(|c| *c == '"' || *c == '\'')
            .ok_or_else(|| PfscError::ParsingError("expected string literal".into()))?;
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        if triple {
            self.bump();
            self.bump();
            self.bump();
            let start = self.pos;
            loop {
                if self.at_end() {
                    return Err(PfscError::ParsingError("unterminated triple-quoted string".into()));
                }
                if self.peek() == Some(quote)
                    && self.peek_at(1) == Some(quote)
                    && self.peek_at(2) == Some(quote)
                {
                    let text = self.slice_from(start);
                    self.bump();
                    self.bump();
                    self.bump();
                    return Ok(text);
                }
                self.bump();
            }
        }
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(PfscError::ParsingError("unterminated string".into())),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some(c2) if c2 == quote => out.push(quote),
                    Some('\\') => out.push('\\'),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err(PfscError::ParsingError("unterminated escape".into())),
                },
                Some(c) => out.push(c),
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_line_and_column() {
        let cur = Cursor::new("aaa\nbb");
        let span = cur.span_from(5);
        assert_eq!(span.line, 2);
        assert_eq!(span.col, 2);
    }

    #[test]
    fn reads_triple_quoted_with_embedded_quote() {
        let mut cur = Cursor::new(r#""""has "a" quote""""#);
        let s = cur.take_string_literal().unwrap();
        assert_eq!(s, r#"has "a" quote"#);
    }

    #[test]
    fn reads_escaped_string() {
        let mut cur = Cursor::new(r#""line\nbreak""#);
        let s = cur.take_string_literal().unwrap();
        assert_eq!(s, "line\nbreak");
    }
}
