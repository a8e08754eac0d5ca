//! Splits a template source into text runs and tag spans.
//!
//! The lexer only knows about delimiters, nesting is left to the parser.

use crate::errors::{Error, ParseErrorKind, Result};

const OUTPUT_START: &str = "{{";
const OUTPUT_END: &str = "}}";
const BLOCK_START: &str = "{%";
const BLOCK_END: &str = "%}";

/// A piece of the template source
#[derive(Clone, Debug, PartialEq)]
pub enum Segment<'s> {
    /// Literal text, emitted as is
    Text(&'s str),
    /// The trimmed inside of a `{{ }}` and the byte offset of that inside in the source
    Output(&'s str, usize),
    /// The trimmed inside of a `{% %}` and the byte offset of that inside in the source
    Block(&'s str, usize),
}

/// Lexer over a template source, producing `Segment`s until the end of the input
#[derive(Debug)]
pub struct Lexer<'s> {
    source: &'s str,
    position: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Lexer<'s> {
        Lexer { source, position: 0 }
    }

    /// Lexes the whole input
    pub fn tokenize(mut self) -> Result<Vec<Segment<'s>>> {
        let mut segments = Vec::new();
        while let Some(segment) = self.next_segment()? {
            match segment {
                Segment::Block("raw", position) => {
                    let body = self.block_body("raw", position)?;
                    if !body.is_empty() {
                        segments.push(Segment::Text(body));
                    }
                }
                Segment::Block(inner, position) if keyword(inner) == "comment" => {
                    self.block_body("comment", position)?;
                }
                _ => segments.push(segment),
            }
        }
        Ok(segments)
    }

    fn rest(&self) -> &'s str {
        &self.source[self.position..]
    }

    fn next_segment(&mut self) -> Result<Option<Segment<'s>>> {
        let rest = self.rest();
        if rest.is_empty() {
            return Ok(None);
        }

        match find_tag_start(rest) {
            Some(0) => {
                let (open, close) =
                    if rest.starts_with(OUTPUT_START) { (OUTPUT_START, OUTPUT_END) } else { (BLOCK_START, BLOCK_END) };
                let start = self.position;
                let inner_start = start + open.len();
                let inner_len = match self.source[inner_start..].find(close) {
                    Some(len) => len,
                    None => return Err(Error::unterminated(open, start)),
                };
                let raw_inner = &self.source[inner_start..inner_start + inner_len];
                let leading = raw_inner.len() - raw_inner.trim_start().len();
                let inner = raw_inner.trim();
                self.position = inner_start + inner_len + close.len();

                if open == OUTPUT_START {
                    Ok(Some(Segment::Output(inner, inner_start + leading)))
                } else {
                    Ok(Some(Segment::Block(inner, inner_start + leading)))
                }
            }
            Some(idx) => {
                let text = &rest[..idx];
                self.position += idx;
                Ok(Some(Segment::Text(text)))
            }
            None => {
                self.position = self.source.len();
                Ok(Some(Segment::Text(rest)))
            }
        }
    }

    /// Consumes everything up to the `{% end<opener> %}` closing the block opened at
    /// `opener_position` and returns it untouched. Tags in the body don't have to be closed.
    /// Only comments nest: `{% raw %}` inside a raw body is plain text.
    fn block_body(&mut self, opener: &str, opener_position: usize) -> Result<&'s str> {
        let closer = format!("end{}", opener);
        let nests = opener == "comment";
        let body_start = self.position;
        let mut search_from = body_start;
        let mut depth = 1;

        while let Some(idx) = self.source[search_from..].find(BLOCK_START) {
            let tag_start = search_from + idx;
            let inner_start = tag_start + BLOCK_START.len();
            if let Some(inner_len) = self.source[inner_start..].find(BLOCK_END) {
                let name = keyword(self.source[inner_start..inner_start + inner_len].trim());
                if nests && name == opener {
                    depth += 1;
                } else if name == closer {
                    depth -= 1;
                    if depth == 0 {
                        self.position = inner_start + inner_len + BLOCK_END.len();
                        return Ok(&self.source[body_start..tag_start]);
                    }
                }
            }
            search_from = inner_start;
        }

        let (line, column) = line_col(self.source, opener_position);
        Err(Error::parse(
            ParseErrorKind::UnmatchedTag,
            opener_position,
            format!(
                "{}:{}: `{}` is never closed: expected `{}` before the end of the template",
                line, column, opener, closer
            ),
        ))
    }
}

/// The first word of the inside of a tag
fn keyword(inner: &str) -> &str {
    inner.split_whitespace().next().unwrap_or("")
}

/// 1-based line and column of a byte offset
pub(crate) fn line_col(source: &str, position: usize) -> (usize, usize) {
    let before = source.get(..position).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

/// Byte index of the first `{{` or `{%` in the input
fn find_tag_start(input: &str) -> Option<usize> {
    input.find(OUTPUT_START).into_iter().chain(input.find(BLOCK_START)).min()
}

/// Convenience function to lex a source in one go
pub fn tokenize(source: &str) -> Result<Vec<Segment<'_>>> {
    Lexer::new(source).tokenize()
}
