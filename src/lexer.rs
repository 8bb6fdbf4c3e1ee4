//! Scans raw document text into a flat stream of [`Token`]s.
//!
//! The lexer never classifies literals: every unquoted run of key-like
//! characters becomes a [`TokenKind::Bare`] token and the parser decides
//! later, with lookahead, whether it is a boolean, number, date or time.

#[cfg(test)]
#[path = "./lexer_tests.rs"]
mod tests;

use crate::Span;
use crate::error::{Error, ErrorKind};
use std::borrow::Cow;

/// The kind of a [`Token`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input. Returned repeatedly once the input is exhausted.
    Eof,
    /// A run of `A-Z a-z 0-9 _ -`.
    Bare,
    /// A run of spaces and tabs.
    Whitespace,
    /// `\n`, or `\r\n` folded into one token.
    Newline,
    /// A basic or literal string, single-line or multiline.
    String,
    /// A `#` comment, up to but excluding the line break.
    Comment,
    Equals,
    Period,
    Comma,
    Colon,
    Plus,
    LeftCurly,
    RightCurly,
    LeftSquare,
    RightSquare,
}

impl TokenKind {
    /// Describes the token kind for error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Eof => "eof",
            TokenKind::Bare => "an identifier",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Newline => "a newline",
            TokenKind::String => "a string",
            TokenKind::Comment => "a comment",
            TokenKind::Equals => "an equals",
            TokenKind::Period => "a period",
            TokenKind::Comma => "a comma",
            TokenKind::Colon => "a colon",
            TokenKind::Plus => "a plus",
            TokenKind::LeftCurly => "a left brace",
            TokenKind::RightCurly => "a right brace",
            TokenKind::LeftSquare => "a left bracket",
            TokenKind::RightSquare => "a right bracket",
        }
    }
}

/// A single lexical token.
///
/// For strings `text` holds the decoded contents (escapes processed, quotes
/// removed); for every other kind it is the raw source slice.
#[derive(Clone, Debug, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: Cow<'a, str>,
    /// Set for `"""` and `'''` strings.
    pub multiline: bool,
    pub span: Span,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, text: &'a str, start: usize, end: usize) -> Self {
        Token {
            kind,
            text: Cow::Borrowed(text),
            multiline: false,
            span: Span::from_offsets(start, end),
        }
    }
}

/// Pull-based tokenizer with one token of lookahead.
pub struct Lexer<'a> {
    input: &'a str,
    /// Raw bytes of the input. Always valid UTF-8 (derived from `&str`).
    bytes: &'a [u8],
    cursor: usize,
    peeked: Option<Token<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        // A leading byte order mark is skipped; spans still count it.
        let cursor = if input.starts_with('\u{feff}') { 3 } else { 0 };
        Lexer {
            input,
            bytes: input.as_bytes(),
            cursor,
            peeked: None,
        }
    }

    /// The text being tokenized.
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Consumes and returns the next token.
    pub fn next(&mut self) -> Result<Token<'a>, Error> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.scan(),
        }
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> Result<&Token<'a>, Error> {
        if self.peeked.is_none() {
            let token = self.scan()?;
            self.peeked = Some(token);
        }
        match &self.peeked {
            Some(token) => Ok(token),
            None => unreachable!("peeked token was just stored"),
        }
    }

    /// Kind of the next token.
    #[inline]
    pub fn peek_kind(&mut self) -> Result<TokenKind, Error> {
        self.peek().map(|t| t.kind)
    }

    /// Consumes the next token only if it has the given kind.
    pub fn take(&mut self, kind: TokenKind) -> Result<bool, Error> {
        if self.peek_kind()? == kind {
            self.peeked = None;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes the next token, failing if it is not of `kind`.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, Error> {
        let token = self.next()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(Error::from((
                ErrorKind::Wanted {
                    expected: kind.describe(),
                    found: token.kind.describe(),
                },
                token.span,
            )))
        }
    }

    /// Consumes a fixed run of token kinds, failing on the first mismatch.
    pub fn sequence(&mut self, kinds: &[TokenKind]) -> Result<Vec<Token<'a>>, Error> {
        let mut tokens = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            tokens.push(self.expect(kind)?);
        }
        Ok(tokens)
    }

    // -- cursor operations --------------------------------------------------

    #[inline]
    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.cursor).copied()
    }

    #[inline]
    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.cursor + offset).copied()
    }

    #[inline]
    fn eat_byte(&mut self, b: u8) -> bool {
        if self.peek_byte() == Some(b) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Decodes the character at byte offset `at`.
    fn char_at(&self, at: usize) -> char {
        self.input[at..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    #[cold]
    fn error(&self, start: usize, end: Option<usize>, kind: ErrorKind) -> Error {
        Error::from((kind, Span::from_offsets(start, end.unwrap_or(start + 1))))
    }

    // -- scanning -----------------------------------------------------------

    fn scan(&mut self) -> Result<Token<'a>, Error> {
        let start = self.cursor;
        let Some(b) = self.peek_byte() else {
            return Ok(Token::new(TokenKind::Eof, "", start, start));
        };
        let kind = match b {
            b' ' | b'\t' => {
                while let Some(b' ' | b'\t') = self.peek_byte() {
                    self.cursor += 1;
                }
                TokenKind::Whitespace
            }
            b'\n' => {
                self.cursor += 1;
                TokenKind::Newline
            }
            b'\r' => {
                if self.peek_byte_at(1) != Some(b'\n') {
                    return Err(self.error(start, None, ErrorKind::Unexpected('\r')));
                }
                self.cursor += 2;
                return Ok(Token::new(TokenKind::Newline, "\n", start, self.cursor));
            }
            b'#' => return self.comment(start),
            b'"' | b'\'' => return self.string(start, b),
            b'=' => self.punct(TokenKind::Equals),
            b'.' => self.punct(TokenKind::Period),
            b',' => self.punct(TokenKind::Comma),
            b':' => self.punct(TokenKind::Colon),
            b'+' => self.punct(TokenKind::Plus),
            b'{' => self.punct(TokenKind::LeftCurly),
            b'}' => self.punct(TokenKind::RightCurly),
            b'[' => self.punct(TokenKind::LeftSquare),
            b']' => self.punct(TokenKind::RightSquare),
            b if is_keylike_byte(b) => {
                while let Some(b) = self.peek_byte() {
                    if !is_keylike_byte(b) {
                        break;
                    }
                    self.cursor += 1;
                }
                TokenKind::Bare
            }
            _ => {
                let ch = self.char_at(start);
                return Err(self.error(start, Some(start + ch.len_utf8()), ErrorKind::Unexpected(ch)));
            }
        };
        Ok(Token::new(kind, &self.input[start..self.cursor], start, self.cursor))
    }

    #[inline]
    fn punct(&mut self, kind: TokenKind) -> TokenKind {
        self.cursor += 1;
        kind
    }

    fn comment(&mut self, start: usize) -> Result<Token<'a>, Error> {
        self.cursor += 1;
        // Valid comment bytes: tab, 0x20..=0x7E, 0x80..=0xFF
        while let Some(b) = self.peek_byte() {
            match b {
                0x09 | 0x20..=0x7E | 0x80.. => self.cursor += 1,
                b'\n' => break,
                b'\r' if self.peek_byte_at(1) == Some(b'\n') => break,
                _ => {
                    let at = self.cursor;
                    return Err(self.error(at, None, ErrorKind::Unexpected(b as char)));
                }
            }
        }
        Ok(Token::new(
            TokenKind::Comment,
            &self.input[start + 1..self.cursor],
            start,
            self.cursor,
        ))
    }

    // -- string parsing -----------------------------------------------------

    /// Reads a basic (`"`) or literal (`'`) string. `start` is the byte offset
    /// of the opening quote, which has not been consumed yet.
    fn string(&mut self, start: usize, delim: u8) -> Result<Token<'a>, Error> {
        self.cursor = start + 1;
        let mut multiline = false;
        if self.eat_byte(delim) {
            if self.eat_byte(delim) {
                multiline = true;
            } else {
                return Ok(Token::new(TokenKind::String, "", start, self.cursor));
            }
        }

        let mut content_start = self.cursor;
        if multiline {
            match self.peek_byte() {
                Some(b'\n') => {
                    self.cursor += 1;
                    content_start = self.cursor;
                }
                Some(b'\r') if self.peek_byte_at(1) == Some(b'\n') => {
                    self.cursor += 2;
                    content_start = self.cursor;
                }
                _ => {}
            }
        }

        let text = self.string_loop(start, content_start, multiline, delim)?;
        Ok(Token {
            kind: TokenKind::String,
            text,
            multiline,
            span: Span::from_offsets(start, self.cursor),
        })
    }

    fn string_loop(
        &mut self,
        start: usize,
        content_start: usize,
        multiline: bool,
        delim: u8,
    ) -> Result<Cow<'a, str>, Error> {
        // Escapes switch the string into an owned buffer; `plain_start` marks
        // the first source byte not yet copied into it.
        let mut owned: Option<String> = None;
        let mut plain_start = content_start;
        loop {
            let i = self.cursor;
            let Some(&b) = self.bytes.get(i) else {
                return Err(self.error(start, None, ErrorKind::UnterminatedString));
            };

            match b {
                b'\r' => {
                    if self.peek_byte_at(1) != Some(b'\n') {
                        return Err(self.error(i, None, ErrorKind::InvalidCharInString('\r')));
                    }
                    if !multiline {
                        return Err(self.error(i, None, ErrorKind::InvalidCharInString('\n')));
                    }
                    self.cursor += 2;
                }
                b'\n' => {
                    if !multiline {
                        return Err(self.error(i, None, ErrorKind::InvalidCharInString('\n')));
                    }
                    self.cursor += 1;
                }
                d if d == delim => {
                    let end = if multiline {
                        let mut run = 0;
                        while self.bytes.get(i + run) == Some(&delim) {
                            run += 1;
                        }
                        if run < 3 {
                            self.cursor += run;
                            continue;
                        }
                        // Up to two quotes directly before the closing three
                        // belong to the content.
                        if run > 5 {
                            return Err(self.error(
                                i + 5,
                                None,
                                ErrorKind::InvalidCharInString(delim as char),
                            ));
                        }
                        self.cursor = i + run;
                        i + run - 3
                    } else {
                        self.cursor = i + 1;
                        i
                    };
                    return Ok(match owned {
                        Some(mut buf) => {
                            buf.push_str(&self.input[plain_start..end]);
                            Cow::Owned(buf)
                        }
                        None => Cow::Borrowed(&self.input[content_start..end]),
                    });
                }
                b'\\' if delim == b'"' => {
                    let mut buf = owned.take().unwrap_or_default();
                    buf.push_str(&self.input[plain_start..i]);
                    self.cursor = i + 1;
                    self.basic_escape(start, multiline, &mut buf)?;
                    owned = Some(buf);
                    plain_start = self.cursor;
                }
                0x09 | 0x20..=0x7E | 0x80.. => self.cursor += 1,
                _ => {
                    return Err(self.error(i, None, ErrorKind::InvalidCharInString(b as char)));
                }
            }
        }
    }

    fn basic_escape(
        &mut self,
        string_start: usize,
        multi: bool,
        buf: &mut String,
    ) -> Result<(), Error> {
        let i = self.cursor;
        let Some(&b) = self.bytes.get(i) else {
            return Err(self.error(string_start, None, ErrorKind::UnterminatedString));
        };
        self.cursor = i + 1;

        match b {
            b'"' => buf.push('"'),
            b'\\' => buf.push('\\'),
            b'b' => buf.push('\u{8}'),
            b'f' => buf.push('\u{c}'),
            b'n' => buf.push('\n'),
            b'r' => buf.push('\r'),
            b't' => buf.push('\t'),
            b'u' => buf.push(self.hex(4, string_start, i)?),
            b'U' => buf.push(self.hex(8, string_start, i)?),
            b' ' | b'\t' | b'\n' | b'\r' if multi => {
                // Line-ending backslash (CRLF folding: \r\n counts as \n)
                let c = if b == b'\r' && self.peek_byte() == Some(b'\n') {
                    self.cursor += 1;
                    '\n'
                } else {
                    b as char
                };
                if c != '\n' {
                    // Only whitespace may follow the backslash on its line
                    loop {
                        match self.peek_byte() {
                            Some(b' ' | b'\t') => self.cursor += 1,
                            Some(b'\n') => {
                                self.cursor += 1;
                                break;
                            }
                            Some(b'\r') if self.peek_byte_at(1) == Some(b'\n') => {
                                self.cursor += 2;
                                break;
                            }
                            _ => return Err(self.error(i, None, ErrorKind::InvalidEscape(c))),
                        }
                    }
                }
                loop {
                    match self.peek_byte() {
                        Some(b' ' | b'\t' | b'\n') => self.cursor += 1,
                        Some(b'\r') if self.peek_byte_at(1) == Some(b'\n') => self.cursor += 2,
                        _ => break,
                    }
                }
            }
            _ => {
                let ch = self.char_at(i);
                self.cursor = i + ch.len_utf8();
                return Err(self.error(i, Some(self.cursor), ErrorKind::InvalidEscape(ch)));
            }
        }
        Ok(())
    }

    fn hex(&mut self, n: usize, string_start: usize, escape_start: usize) -> Result<char, Error> {
        let mut val = 0u32;
        for _ in 0..n {
            let at = self.cursor;
            let Some(&byte) = self.bytes.get(at) else {
                return Err(self.error(string_start, None, ErrorKind::UnterminatedString));
            };
            match (byte as char).to_digit(16) {
                Some(digit) if byte.is_ascii() => {
                    val = (val << 4) | digit;
                    self.cursor += 1;
                }
                _ => {
                    let ch = self.char_at(at);
                    return Err(self.error(
                        at,
                        Some(at + ch.len_utf8()),
                        ErrorKind::InvalidHexEscape(ch),
                    ));
                }
            }
        }
        match char::from_u32(val) {
            Some(ch) => Ok(ch),
            None => Err(self.error(
                escape_start,
                Some(escape_start + n + 1),
                ErrorKind::InvalidEscapeValue(val),
            )),
        }
    }
}

#[inline]
pub(crate) fn is_keylike_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}
