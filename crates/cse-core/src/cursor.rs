// Byte cursor and token classification for gamestate script text.
//
// All structural characters are ASCII, so every token boundary the cursor
// reports is also a valid UTF-8 boundary of the source `str`.

use std::ops::Range;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Half-open byte range `[start, end)` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
    pub fn len(&self) -> usize {
        self.end - self.start
    }
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Bareword,
    /// `closed` is false when input ended before the closing quote.
    Quoted { closed: bool },
    Equals,
    OpenBrace,
    CloseBrace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

pub fn is_special(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'=' | b'{' | b'}' | b'"')
}

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    pub fn at(text: &'a str, pos: usize) -> Self {
        Self {
            text,
            pos: pos.min(text.len()),
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub fn slice(&self, span: Span) -> &'a str {
        &self.text[span.range()]
    }

    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    /// Skips ASCII whitespace, `#` line comments and a leading byte-order mark.
    pub fn skip_whitespace(&mut self) {
        let bytes = self.bytes();
        if self.pos == 0 && bytes.starts_with(BOM) {
            self.pos = BOM.len();
        }
        while let Some(&b) = bytes.get(self.pos) {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else if b == b'#' {
                while let Some(&c) = bytes.get(self.pos) {
                    if c == b'\n' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    /// Classifies the token starting at the current position without consuming it.
    /// Expects whitespace to have been skipped already.
    pub fn peek(&self) -> Option<TokenKind> {
        let b = self.peek_byte()?;
        Some(match b {
            b'=' => TokenKind::Equals,
            b'{' => TokenKind::OpenBrace,
            b'}' => TokenKind::CloseBrace,
            b'"' => TokenKind::Quoted {
                closed: self.bytes()[self.pos + 1..].contains(&b'"'),
            },
            _ => TokenKind::Bareword,
        })
    }

    /// Consumes a bareword value: everything up to the next `{`, `}` or line
    /// break outside quotes, minus trailing whitespace. Interior spaces and `=`
    /// stay part of the value. Expects `peek()` to have returned `Bareword`.
    pub fn advance_value_run(&mut self) -> Option<Span> {
        let bytes = self.bytes();
        let start = self.pos;
        let mut end = start;
        let mut quoted = false;
        while let Some(&b) = bytes.get(end) {
            match b {
                b'\n' | b'\r' => break,
                b'"' => quoted = !quoted,
                b'{' | b'}' if !quoted => break,
                _ => {}
            }
            end += 1;
        }
        while end > start && bytes[end - 1].is_ascii_whitespace() {
            end -= 1;
        }
        if end == start {
            return None;
        }
        self.pos = end;
        Some(Span::new(start, end))
    }

    /// Consumes the token at the current position.
    pub fn advance(&mut self) -> Option<Token> {
        let kind = self.peek()?;
        let start = self.pos;
        let end = match kind {
            TokenKind::Equals | TokenKind::OpenBrace | TokenKind::CloseBrace => start + 1,
            TokenKind::Quoted { closed } => {
                if closed {
                    // contents are opaque: no escapes, braces and whitespace included
                    let rest = &self.bytes()[start + 1..];
                    start + 1 + rest.iter().position(|&b| b == b'"').unwrap_or(rest.len()) + 1
                } else {
                    self.text.len()
                }
            }
            TokenKind::Bareword => {
                let rest = &self.bytes()[start..];
                start + rest.iter().position(|&b| is_special(b)).unwrap_or(rest.len())
            }
        };
        self.pos = end;
        Some(Token {
            kind,
            span: Span::new(start, end),
        })
    }
}
