#[cfg(test)]
#[path = "./error_tests.rs"]
mod tests;

use crate::Span;
use std::fmt::{self, Debug, Display};

/// Error that can occur when decoding TOML.
#[derive(Debug, Clone)]
pub struct Error {
    /// The error kind
    pub kind: ErrorKind,
    /// The span where the error occurs.
    pub span: Span,
    /// Line, column and source excerpt; only available for errors that
    /// crossed the [`parse`](crate::parse) boundary.
    pub location: Option<Location>,
}

/// Position of an error within the original document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// 1-based line number.
    pub line: usize,
    /// 0-based column, counted in characters.
    pub column: usize,
    /// Up to three numbered source lines with a caret under the column.
    pub snippet: String,
}

impl std::error::Error for Error {}

impl From<(ErrorKind, Span)> for Error {
    fn from((kind, span): (ErrorKind, Span)) -> Self {
        Self {
            kind,
            span,
            location: None,
        }
    }
}

impl Error {
    /// Returns the taxonomy bucket of this error.
    #[inline]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Returns the human readable message, without position information.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// 1-based line of the failure, if known.
    pub fn line(&self) -> Option<usize> {
        self.location.as_ref().map(|loc| loc.line)
    }

    /// 0-based column of the failure, if known.
    pub fn column(&self) -> Option<usize> {
        self.location.as_ref().map(|loc| loc.column)
    }

    /// Source excerpt pointing at the failure, if known.
    pub fn snippet(&self) -> Option<&str> {
        self.location.as_ref().map(|loc| loc.snippet.as_str())
    }

    /// Resolves the line, column and snippet against `source`.
    ///
    /// A location that was already resolved is kept as is.
    pub(crate) fn locate(mut self, source: &str) -> Self {
        if self.location.is_none() {
            self.location = Some(Location::resolve(source, self.span.start as usize));
        }
        self
    }
}

impl Location {
    pub(crate) fn resolve(source: &str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = split_lines(&source[..offset]);
        let line = before.len();
        let column = before.last().map_or(0, |l| l.chars().count());
        let snippet = make_snippet(source, line, column);
        Location {
            line,
            column,
            snippet,
        }
    }
}

/// Splits on `\r\n`, `\n` and lone `\r`. Always yields at least one line.
fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    lines.push(&text[start..]);
    lines
}

fn make_snippet(source: &str, line: usize, column: usize) -> String {
    use std::fmt::Write as _;

    let lines = split_lines(source);
    let printed: Vec<(usize, &str)> = (line.saturating_sub(1)..=line + 1)
        .filter(|&n| n >= 1)
        .filter_map(|n| match lines.get(n - 1) {
            Some(text) if !text.is_empty() || n == line => Some((n, *text)),
            _ => None,
        })
        .collect();
    let width = printed.last().map_or(1, |(n, _)| n.to_string().len());

    let mut out = String::new();
    for (n, text) in printed {
        let _ = writeln!(out, "{n:>width$}:  {text}");
        if n == line {
            let _ = writeln!(out, " {:pad$}^", "", pad = width + column + 2);
        }
    }
    out
}

/// Coarse classification of every [`ErrorKind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed token: bad escape, unterminated string, stray character.
    Lex,
    /// Unexpected token at a grammar point.
    Syntax,
    /// Malformed number, date or time text.
    Literal,
    /// Key, table or array-of-tables path collision.
    Duplication,
    /// Header or value shape that cannot be placed in the tree.
    Structural,
}

/// Errors that can occur when decoding a document.
#[derive(Clone, PartialEq)]
pub enum ErrorKind {
    /// The input file is larger than the maximum supported size of 4GiB.
    FileTooLarge,

    /// A character that cannot start any token was found.
    Unexpected(char),

    /// An invalid character not allowed in a string was found.
    InvalidCharInString(char),

    /// An invalid character was found as an escape.
    InvalidEscape(char),

    /// An invalid character was found in a hex escape.
    InvalidHexEscape(char),

    /// An invalid escape value was specified in a hex escape in a string.
    ///
    /// Valid values are in the plane of unicode codepoints.
    InvalidEscapeValue(u32),

    /// EOF was found before the closing delimiter of a string.
    UnterminatedString,

    /// Wanted one sort of token, but found another.
    Wanted {
        /// Expected token type.
        expected: &'static str,
        /// Actually found token type.
        found: &'static str,
    },

    /// Multiline strings are not allowed for key.
    MultilineStringKey,

    /// Arrays and inline tables nest deeper than the parser allows.
    RecursionLimitExceeded,

    /// Unquoted string was found when a value was expected.
    UnquotedString,

    /// A number failed to parse, with the rule it broke.
    InvalidNumber(&'static str),

    /// The number does not fit the named type.
    OutOfRange(&'static str),

    /// A date, time or date-time failed validation.
    InvalidDateTime(String),

    /// A key was assigned twice, or collides with a table.
    DuplicateKey {
        /// The dotted path of the duplicate key
        key: String,
    },

    /// A table or array of tables was defined twice, or collides with a key.
    DuplicateTable {
        /// The dotted path of the duplicate table
        name: String,
    },

    /// A table header resolves to nothing below its owning array of tables.
    BrokenKey {
        /// The header as written
        name: String,
    },

    /// Two fragments of the document assign different values to one key.
    ConflictingValue {
        /// The key being merged
        key: String,
    },
}

impl ErrorKind {
    /// Returns the taxonomy bucket of this error kind.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileTooLarge
            | Self::Unexpected(..)
            | Self::InvalidCharInString(..)
            | Self::InvalidEscape(..)
            | Self::InvalidHexEscape(..)
            | Self::InvalidEscapeValue(..)
            | Self::UnterminatedString => ErrorCategory::Lex,
            Self::Wanted { .. }
            | Self::MultilineStringKey
            | Self::RecursionLimitExceeded
            | Self::UnquotedString => ErrorCategory::Syntax,
            Self::InvalidNumber(..) | Self::OutOfRange(..) | Self::InvalidDateTime(..) => {
                ErrorCategory::Literal
            }
            Self::DuplicateKey { .. } | Self::DuplicateTable { .. } => ErrorCategory::Duplication,
            Self::BrokenKey { .. } | Self::ConflictingValue { .. } => ErrorCategory::Structural,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::FileTooLarge => "file-too-large",
            Self::Unexpected(..) => "unexpected",
            Self::InvalidCharInString(..) => "invalid-char-in-string",
            Self::InvalidEscape(..) => "invalid-escape",
            Self::InvalidHexEscape(..) => "invalid-hex-escape",
            Self::InvalidEscapeValue(..) => "invalid-escape-value",
            Self::UnterminatedString => "unterminated-string",
            Self::Wanted { .. } => "wanted",
            Self::MultilineStringKey => "multiline-string-key",
            Self::RecursionLimitExceeded => "recursion-limit-exceeded",
            Self::UnquotedString => "unquoted-string",
            Self::InvalidNumber(..) => "invalid-number",
            Self::OutOfRange(..) => "out-of-range",
            Self::InvalidDateTime(..) => "invalid-datetime",
            Self::DuplicateKey { .. } => "duplicate-key",
            Self::DuplicateTable { .. } => "duplicate-table",
            Self::BrokenKey { .. } => "broken-key",
            Self::ConflictingValue { .. } => "conflicting-value",
        };
        f.write_str(text)
    }
}

impl Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

struct Escape(char);

impl fmt::Display for Escape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use std::fmt::Write as _;

        if self.0.is_whitespace() || self.0.is_control() {
            for esc in self.0.escape_default() {
                f.write_char(esc)?;
            }
            Ok(())
        } else {
            f.write_char(self.0)
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("invalid TOML document: ")?;
        }
        match &self.kind {
            ErrorKind::FileTooLarge => f.write_str("file is too large (maximum 4GiB)")?,
            ErrorKind::Unexpected(c) => write!(f, "unexpected character found: `{}`", Escape(*c))?,
            ErrorKind::InvalidCharInString(c) => {
                write!(f, "invalid character in string: `{}`", Escape(*c))?
            }
            ErrorKind::InvalidEscape(c) => {
                write!(f, "invalid escape character in string: `{}`", Escape(*c))?
            }
            ErrorKind::InvalidHexEscape(c) => {
                write!(f, "invalid hex escape character in string: `{}`", Escape(*c))?
            }
            ErrorKind::InvalidEscapeValue(c) => write!(f, "invalid escape value: `{c}`")?,
            ErrorKind::UnterminatedString => f.write_str("unterminated string")?,
            ErrorKind::Wanted { expected, found } => write!(f, "expected {expected}, found {found}")?,
            ErrorKind::MultilineStringKey => {
                f.write_str("multiline strings are not allowed for key")?
            }
            ErrorKind::RecursionLimitExceeded => write!(
                f,
                "values are nested deeper than {} levels",
                crate::parser::MAX_RECURSION_DEPTH
            )?,
            ErrorKind::UnquotedString => {
                f.write_str("invalid TOML value, did you mean to use a quoted string?")?
            }
            ErrorKind::InvalidNumber(reason) => write!(f, "invalid number: {reason}")?,
            ErrorKind::OutOfRange(kind) => write!(f, "number is out of range of '{kind}'")?,
            ErrorKind::InvalidDateTime(message) => f.write_str(message)?,
            ErrorKind::DuplicateKey { key } => write!(f, "duplicate key: `{key}`")?,
            ErrorKind::DuplicateTable { name } => write!(f, "redefinition of table `{name}`")?,
            ErrorKind::BrokenKey { name } => write!(
                f,
                "broken key: table header `{name}` names its array of tables itself"
            )?,
            ErrorKind::ConflictingValue { key } => {
                write!(f, "conflicting value for key `{key}`")?
            }
        }
        if f.alternate() {
            if let Some(loc) = &self.location {
                write!(f, " at line {}, column {}\n\n{}", loc.line, loc.column, loc.snippet)?;
            }
        }
        Ok(())
    }
}
