//! Field paths into structured values.
//!
//! Supported syntax:
//! - `field` - top-level field access
//! - `a.b.c` - nested field access
//! - `a[0]` - array index access
//! - `a["key with spaces"]` or `a['key']` - quoted field access

use crate::error::{Error, Result};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// One step of a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Field of a map.
    Key(String),
    /// Element of an array.
    Index(usize),
}

/// A parsed field path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// Parses a path from its textual form.
    pub fn parse(input: &str) -> Result<Self> {
        Parser::new(input).parse()
    }

    /// Creates a single-segment path for a top-level key, without parsing.
    ///
    /// The key may contain characters that are special in the path syntax.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            segments: alloc::vec![Segment::Key(key.into())],
        }
    }

    /// Creates a path from segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Returns the segments of this path.
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the number of segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the path has no segments.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if is_plain_key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                Segment::Key(key) => write!(f, "[{:?}]", key)?,
                Segment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

fn is_key_char(c: char) -> bool {
    !(c.is_whitespace() || c.is_control() || matches!(c, '.' | '[' | ']' | '"' | '\''))
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(is_key_char)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::invalid_path(self.input, message)
    }

    fn parse(mut self) -> Result<Path> {
        let mut segments = Vec::new();
        if self.input.is_empty() {
            return Err(self.error("empty path"));
        }
        if self.peek() != Some('[') {
            segments.push(Segment::Key(self.parse_key()?));
        }
        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.advance();
                    segments.push(Segment::Key(self.parse_key()?));
                }
                '[' => {
                    self.advance();
                    segments.push(self.parse_bracket()?);
                }
                other => {
                    return Err(self.error(alloc::format!(
                        "unexpected '{}' at position {}",
                        other, self.pos
                    )))
                }
            }
        }
        Ok(Path { segments })
    }

    fn parse_key(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_key_char(c) {
                self.advance();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error(alloc::format!("expected field name at position {}", start)));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_bracket(&mut self) -> Result<Segment> {
        let segment = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                Segment::Key(self.parse_quoted(quote)?)
            }
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
                let index = self.input[start..self.pos]
                    .parse::<usize>()
                    .map_err(|_| self.error("index out of range"))?;
                Segment::Index(index)
            }
            Some(c) => {
                return Err(self.error(alloc::format!(
                    "expected index or quoted key, found '{}'",
                    c
                )))
            }
            None => return Err(self.error("unterminated '['")),
        };
        match self.peek() {
            Some(']') => {
                self.advance();
                Ok(segment)
            }
            _ => Err(self.error("expected ']'")),
        }
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.advance();
            if c == quote {
                return Ok(out);
            }
            if c == '\\' {
                match self.peek() {
                    Some(escaped) => {
                        out.push(escaped);
                        self.advance();
                    }
                    None => break,
                }
            } else {
                out.push(c);
            }
        }
        Err(self.error("unterminated string"))
    }
}
