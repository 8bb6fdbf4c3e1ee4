//! Recursive-descent parser turning the token stream into an [`ast`] tree.
//!
//! The lexer hands out raw bare runs; this module decides, with one token of
//! lookahead, whether a run is a boolean, an integer, a float, a date, a time
//! or a date-time. Every top-level node is checked against the document's
//! [`Keystore`] before it is linked into the tree.

#[cfg(test)]
#[path = "./parser_tests.rs"]
mod tests;

use crate::ast::{self, ArrayTable, Key, KeySegment, KeyValuePair, Node, RootTable, Table};
use crate::keystore::Keystore;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::time::{LocalDate, LocalDateTime, LocalTime, OffsetDateTime};
use crate::{Error, ErrorKind, Span};
use std::num::IntErrorKind;

/// Deepest nesting of arrays and inline tables accepted in one value.
pub const MAX_RECURSION_DEPTH: u16 = 128;

#[cold]
fn wanted(expected: &'static str, found: TokenKind, span: Span) -> Error {
    Error::from((
        ErrorKind::Wanted {
            expected,
            found: found.describe(),
        },
        span,
    ))
}

fn at(span: Span) -> impl FnOnce(ErrorKind) -> Error {
    move |kind| Error::from((kind, span))
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    keystore: Keystore,
    root: RootTable,
    depth: u16,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(input),
            keystore: Keystore::new(),
            root: RootTable::default(),
            depth: 0,
        }
    }

    /// Parses the whole document.
    ///
    /// Errors carry a span but no [`Location`](crate::Location); see
    /// [`parse`] for the positioned variant.
    pub fn parse(mut self) -> Result<RootTable, Error> {
        loop {
            self.skip_comments_and_newlines()?;
            let node = match self.lexer.peek_kind()? {
                TokenKind::LeftSquare => self.table()?,
                TokenKind::Eof => break,
                _ => Node::KeyValue(self.key_value()?),
            };
            self.end_of_line()?;

            let span = node.span();
            self.keystore.add_node(&node).map_err(at(span))?;
            log::trace!("parsed {} at {}..{}", node_kind(&node), span.start, span.end);
            self.attach(node);
        }
        Ok(self.root)
    }

    /// Key/value pairs belong to the most recent header, if there is one.
    fn attach(&mut self, node: Node) {
        match node {
            Node::KeyValue(kv) => match self.root.nodes.last_mut() {
                Some(Node::Table(table)) => table.elements.push(kv),
                Some(Node::ArrayTable(table)) => table.elements.push(kv),
                _ => self.root.nodes.push(Node::KeyValue(kv)),
            },
            header => self.root.nodes.push(header),
        }
    }

    fn skip_comments_and_newlines(&mut self) -> Result<(), Error> {
        loop {
            self.lexer.take(TokenKind::Whitespace)?;
            if self.lexer.take(TokenKind::Comment)? {
                if self.lexer.peek_kind()? == TokenKind::Eof {
                    return Ok(());
                }
                self.lexer.expect(TokenKind::Newline)?;
                continue;
            }
            if !self.lexer.take(TokenKind::Newline)? {
                return Ok(());
            }
        }
    }

    /// Only whitespace and a comment may follow a node on its line.
    fn end_of_line(&mut self) -> Result<(), Error> {
        self.lexer.take(TokenKind::Whitespace)?;
        self.lexer.take(TokenKind::Comment)?;
        let token = self.lexer.next()?;
        match token.kind {
            TokenKind::Newline | TokenKind::Eof => Ok(()),
            found => Err(wanted("a newline", found, token.span)),
        }
    }

    fn table(&mut self) -> Result<Node, Error> {
        let open = self.lexer.expect(TokenKind::LeftSquare)?;
        let is_array = self.lexer.take(TokenKind::LeftSquare)?;
        let key = self.key()?;
        let mut close = self.lexer.expect(TokenKind::RightSquare)?;
        if is_array {
            close = self.lexer.expect(TokenKind::RightSquare)?;
        }
        let span = open.span.join(close.span);
        Ok(if is_array {
            Node::ArrayTable(ArrayTable {
                key,
                elements: Vec::new(),
                span,
            })
        } else {
            Node::Table(Table {
                key,
                elements: Vec::new(),
                span,
            })
        })
    }

    fn key(&mut self) -> Result<Key, Error> {
        let mut segments = Vec::new();
        loop {
            self.lexer.take(TokenKind::Whitespace)?;
            let token = self.lexer.next()?;
            match token.kind {
                TokenKind::Bare => segments.push(KeySegment {
                    name: token.text.into_owned(),
                    quoted: false,
                    span: token.span,
                }),
                TokenKind::String if token.multiline => {
                    return Err(Error::from((ErrorKind::MultilineStringKey, token.span)));
                }
                TokenKind::String => segments.push(KeySegment {
                    name: token.text.into_owned(),
                    quoted: true,
                    span: token.span,
                }),
                found => return Err(wanted("a table key", found, token.span)),
            }
            self.lexer.take(TokenKind::Whitespace)?;
            if !self.lexer.take(TokenKind::Period)? {
                return Ok(Key { segments });
            }
        }
    }

    fn key_value(&mut self) -> Result<KeyValuePair, Error> {
        let key = self.key()?;
        self.lexer.expect(TokenKind::Equals)?;
        self.lexer.take(TokenKind::Whitespace)?;
        let value = self.value()?;
        let span = key.span();
        Ok(KeyValuePair { key, value, span })
    }

    fn value(&mut self) -> Result<ast::Value, Error> {
        let token = self.lexer.next()?;
        match token.kind {
            TokenKind::String => Ok(ast::Value::String(token.text.into_owned())),
            TokenKind::Bare => self.literal(token),
            TokenKind::Plus => {
                let bare = self.lexer.expect(TokenKind::Bare)?;
                let text = format!("+{}", bare.text);
                self.number(&text, token.span.join(bare.span))
            }
            TokenKind::LeftSquare => self.nested(token.span, Self::array),
            TokenKind::LeftCurly => self.nested(token.span, Self::inline_table),
            found => Err(wanted("a value", found, token.span)),
        }
    }

    fn nested(
        &mut self,
        span: Span,
        f: fn(&mut Self) -> Result<ast::Value, Error>,
    ) -> Result<ast::Value, Error> {
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(Error::from((ErrorKind::RecursionLimitExceeded, span)));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn array(&mut self) -> Result<ast::Value, Error> {
        let mut values = Vec::new();
        loop {
            self.skip_comments_and_newlines()?;
            if self.lexer.peek_kind()? == TokenKind::RightSquare {
                break;
            }
            values.push(self.value()?);
            self.skip_comments_and_newlines()?;
            if !self.lexer.take(TokenKind::Comma)? {
                break;
            }
        }
        self.lexer.expect(TokenKind::RightSquare)?;
        Ok(ast::Value::Array(values))
    }

    /// Pairs are checked against a keystore of their own, so keys inside
    /// the braces never clash with keys of the enclosing document.
    fn inline_table(&mut self) -> Result<ast::Value, Error> {
        let mut pairs = Vec::new();
        self.lexer.take(TokenKind::Whitespace)?;
        if self.lexer.take(TokenKind::RightCurly)? {
            return Ok(ast::Value::InlineTable(pairs));
        }
        let mut keystore = Keystore::new();
        loop {
            let kv = self.key_value()?;
            keystore.add_key_value(&kv).map_err(at(kv.span))?;
            pairs.push(kv);
            self.lexer.take(TokenKind::Whitespace)?;
            if self.lexer.take(TokenKind::RightCurly)? {
                return Ok(ast::Value::InlineTable(pairs));
            }
            self.lexer.expect(TokenKind::Comma)?;
        }
    }

    fn literal(&mut self, token: Token<'a>) -> Result<ast::Value, Error> {
        let text = &*token.text;
        match text {
            "true" => return Ok(ast::Value::Boolean(true)),
            "false" => return Ok(ast::Value::Boolean(false)),
            _ => {}
        }
        let (_, unsigned) = split_sign(text);
        if !unsigned.starts_with(|c: char| c.is_ascii_digit())
            && unsigned != "inf"
            && unsigned != "nan"
        {
            return Err(Error::from((ErrorKind::UnquotedString, token.span)));
        }
        if text[1..].contains('-') && !text.to_ascii_lowercase().contains("e-") {
            return self.date_or_date_time(token);
        }
        if self.lexer.peek_kind()? == TokenKind::Colon {
            return self.time(token);
        }
        self.number(text, token.span)
    }

    /// Appends the text of a fixed run of tokens, returning the last one.
    fn append(
        &mut self,
        text: &mut String,
        span: &mut Span,
        kinds: &[TokenKind],
    ) -> Result<String, Error> {
        let tokens = self.lexer.sequence(kinds)?;
        let mut last = String::new();
        for token in tokens {
            text.push_str(&token.text);
            *span = span.join(token.span);
            last = token.text.into_owned();
        }
        Ok(last)
    }

    fn date_or_date_time(&mut self, first: Token<'a>) -> Result<ast::Value, Error> {
        use TokenKind::{Bare, Colon, Period, Plus};

        let mut span = first.span;
        let mut text = first.text.into_owned();

        // `1979-05-27 07:32:00`: one space may separate date and time.
        let single_space = matches!(
            self.lexer.peek()?,
            Token { kind: TokenKind::Whitespace, text: ws, .. } if ws == " "
        );
        if single_space {
            self.lexer.next()?;
            if self.lexer.peek_kind()? != Bare {
                return local_date(&text, span);
            }
            let time = self.lexer.next()?;
            span = span.join(time.span);
            text.push('T');
            text.push_str(&time.text);
        }
        if !text.contains(['t', 'T']) {
            return local_date(&text, span);
        }

        let seconds = self.append(&mut text, &mut span, &[Colon, Bare, Colon, Bare])?;
        if seconds.ends_with(['z', 'Z']) {
            return offset_date_time(&text, span);
        }
        if seconds.contains('-') {
            self.append(&mut text, &mut span, &[Colon, Bare])?;
            return offset_date_time(&text, span);
        }
        match self.lexer.peek_kind()? {
            Plus => {
                self.append(&mut text, &mut span, &[Plus, Bare, Colon, Bare])?;
                return offset_date_time(&text, span);
            }
            Period => {
                let fraction = self.append(&mut text, &mut span, &[Period, Bare])?;
                if fraction.ends_with(['z', 'Z']) {
                    return offset_date_time(&text, span);
                }
                if fraction.contains('-') {
                    self.append(&mut text, &mut span, &[Colon, Bare])?;
                    return offset_date_time(&text, span);
                }
                if self.lexer.peek_kind()? == Plus {
                    self.append(&mut text, &mut span, &[Plus, Bare, Colon, Bare])?;
                    return offset_date_time(&text, span);
                }
            }
            _ => {}
        }
        LocalDateTime::parse(&text)
            .map(ast::Value::LocalDateTime)
            .map_err(at(span))
    }

    fn time(&mut self, first: Token<'a>) -> Result<ast::Value, Error> {
        use TokenKind::{Bare, Colon, Period};

        let mut span = first.span;
        let mut text = first.text.into_owned();
        self.append(&mut text, &mut span, &[Colon, Bare, Colon, Bare])?;
        if self.lexer.peek_kind()? == Period {
            self.append(&mut text, &mut span, &[Period, Bare])?;
        }
        LocalTime::parse(&text)
            .map(ast::Value::LocalTime)
            .map_err(at(span))
    }

    fn number(&mut self, text: &str, span: Span) -> Result<ast::Value, Error> {
        let special = match text {
            "inf" | "+inf" => Some(f64::INFINITY),
            "-inf" => Some(f64::NEG_INFINITY),
            "nan" | "+nan" | "-nan" => Some(f64::NAN),
            _ => None,
        };
        if let Some(value) = special {
            return Ok(ast::Value::Float {
                value,
                text: text.trim_start_matches('+').to_owned(),
            });
        }

        let radix = if text.starts_with("0x") {
            16
        } else if text.starts_with("0o") {
            8
        } else if text.starts_with("0b") {
            2
        } else if text.contains(['e', 'E']) || self.lexer.peek_kind()? == TokenKind::Period {
            return self.float(text, span);
        } else {
            10
        };
        integer(text, radix)
            .map(ast::Value::Integer)
            .map_err(at(span))
    }

    /// Parses a float whose integral part is `text`, consuming the fraction
    /// and exponent tokens that follow it.
    fn float(&mut self, text: &str, mut span: Span) -> Result<ast::Value, Error> {
        let (negative, unsigned) = split_sign(text);
        if unsigned.starts_with('0')
            && unsigned[1..].starts_with(|c: char| c.is_ascii_digit() || c == '_')
        {
            return Err(Error::from((
                ErrorKind::InvalidNumber("leading zeros are not allowed"),
                span,
            )));
        }

        let mut number = String::new();
        if negative {
            number.push('-');
        }
        let (integral, rest) = digit_run(unsigned, 10).map_err(at(span))?;
        number.push_str(&integral);
        let mut rest = rest.to_owned();

        if self.lexer.take(TokenKind::Period)? {
            if !rest.is_empty() {
                return Err(Error::from((
                    ErrorKind::InvalidNumber("unexpected character before the decimal point"),
                    span,
                )));
            }
            let token = self.lexer.expect(TokenKind::Bare)?;
            span = span.join(token.span);
            let (fraction, after) = digit_run(&token.text, 10).map_err(at(span))?;
            number.push('.');
            number.push_str(&fraction);
            rest = after.to_owned();
        }

        if !rest.is_empty() {
            let Some(exponent) = rest.strip_prefix(['e', 'E']) else {
                return Err(Error::from((
                    ErrorKind::InvalidNumber("unexpected character in float"),
                    span,
                )));
            };
            number.push('e');
            let digits = if exponent.is_empty() {
                // `1e+5` lexes as `1e`, `+`, `5`.
                self.lexer.expect(TokenKind::Plus)?;
                let token = self.lexer.expect(TokenKind::Bare)?;
                span = span.join(token.span);
                whole_digit_run(&token.text).map_err(at(span))?
            } else {
                let (negative, unsigned) = split_sign(exponent);
                if negative {
                    number.push('-');
                }
                whole_digit_run(unsigned).map_err(at(span))?
            };
            number.push_str(&digits);
        }

        let value: f64 = number
            .parse()
            .map_err(|_| Error::from((ErrorKind::InvalidNumber("malformed float"), span)))?;
        if !value.is_finite() {
            return Err(Error::from((ErrorKind::OutOfRange("f64"), span)));
        }
        Ok(ast::Value::Float {
            value,
            text: number,
        })
    }
}

fn node_kind(node: &Node) -> &'static str {
    match node {
        Node::KeyValue(_) => "key/value pair",
        Node::Table(_) => "table header",
        Node::ArrayTable(_) => "array of tables header",
    }
}

fn local_date(text: &str, span: Span) -> Result<ast::Value, Error> {
    LocalDate::parse(text)
        .map(ast::Value::LocalDate)
        .map_err(at(span))
}

fn offset_date_time(text: &str, span: Span) -> Result<ast::Value, Error> {
    OffsetDateTime::parse(text)
        .map(ast::Value::OffsetDateTime)
        .map_err(at(span))
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

/// Reads digits of `radix` in which every `_` sits between two digits.
/// Returns the digits without underscores and the unread remainder.
fn digit_run(text: &str, radix: u32) -> Result<(String, &str), ErrorKind> {
    let mut digits = String::with_capacity(text.len());
    let mut underscore_ok = false;
    let mut end = text.len();
    for (i, c) in text.char_indices() {
        match c {
            '_' if underscore_ok => underscore_ok = false,
            '_' => return Err(ErrorKind::InvalidNumber("underscores must sit between digits")),
            c if c.is_digit(radix) => {
                digits.push(c);
                underscore_ok = true;
            }
            _ => {
                end = i;
                break;
            }
        }
    }
    if !underscore_ok {
        return Err(ErrorKind::InvalidNumber(if digits.is_empty() {
            "expected digits"
        } else {
            "underscores must sit between digits"
        }));
    }
    Ok((digits, &text[end..]))
}

fn whole_digit_run(text: &str) -> Result<String, ErrorKind> {
    match digit_run(text, 10)? {
        (digits, "") => Ok(digits),
        _ => Err(ErrorKind::InvalidNumber("unexpected character in exponent")),
    }
}

/// Parses an integer literal in `radix`, prefix included for radix 2, 8 and 16.
fn integer(text: &str, radix: u32) -> Result<i64, ErrorKind> {
    let allowed = |b: u8| {
        b.is_ascii_hexdigit() || matches!(b, b'_' | b'.' | b'+' | b'-' | b'o' | b'x' | b'b')
    };
    if !text.bytes().all(allowed) {
        return Err(ErrorKind::InvalidNumber("unexpected non-numeric character"));
    }
    let (negative, body) = split_sign(text);
    if body.len() != text.len() && radix != 10 {
        return Err(ErrorKind::InvalidNumber("a sign is only allowed on decimal integers"));
    }

    let digits = if radix == 10 {
        if body.len() > 1 && body.starts_with('0') {
            return Err(ErrorKind::InvalidNumber("leading zeros are not allowed"));
        }
        body
    } else {
        &body[2..]
    };
    let digits = match digit_run(digits, radix)? {
        (digits, "") => digits,
        _ => return Err(ErrorKind::InvalidNumber("unexpected character in integer")),
    };

    let signed = if negative { format!("-{digits}") } else { digits };
    i64::from_str_radix(&signed, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ErrorKind::OutOfRange("i64"),
        _ => ErrorKind::InvalidNumber("malformed integer"),
    })
}

/// Parses a document, resolving the line, column and snippet of any error.
pub fn parse(text: &str) -> Result<RootTable, Error> {
    if u32::try_from(text.len()).is_err() {
        return Err(Error::from((ErrorKind::FileTooLarge, Span::new(0, 0))));
    }
    Parser::new(text).parse().map_err(|e| e.locate(text))
}
