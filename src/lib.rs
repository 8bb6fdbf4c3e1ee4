//! A TOML decoder that validates every key, table and array-of-tables
//! definition as it parses.
//!
//! Decoding runs in three stages. The [`Lexer`] splits text into tokens, the
//! [`Parser`] builds an [`ast::RootTable`] while a [`Keystore`] rejects
//! redefinitions the moment they occur, and the normalizer folds the tree
//! into a nested [`Table`] of [`Value`]s.
//!
//! # Examples
//!
//! ```
//! use toml_keystore::{Value, decode};
//!
//! let content = r#"
//! title = "example"
//!
//! [[fruit]]
//! name = "apple"
//!
//! [fruit.physical]
//! color = "red"
//!
//! [[fruit]]
//! name = "banana"
//! "#;
//!
//! let table = decode(content)?;
//! assert_eq!(table.get("title").and_then(Value::as_str), Some("example"));
//!
//! let fruit = table.get("fruit").and_then(Value::as_array).unwrap();
//! assert_eq!(fruit.len(), 2);
//! let color = fruit[0].get("physical").and_then(|p| p.get("color"));
//! assert_eq!(color.and_then(Value::as_str), Some("red"));
//! # Ok::<(), toml_keystore::Error>(())
//! ```
//!
//! Errors report where decoding stopped:
//!
//! ```
//! let err = toml_keystore::decode("a = 1\na = 2\n").unwrap_err();
//! assert_eq!(err.kind.to_string(), "duplicate-key");
//! assert_eq!(err.line(), Some(2));
//! assert_eq!(err.column(), Some(0));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod ast;
mod error;
pub mod keystore;
pub mod lexer;
pub mod normalize;
pub mod parser;
mod span;
mod table;
mod time;
mod value;

#[cfg(feature = "to-toml")]
mod encode;

pub use error::{Error, ErrorCategory, ErrorKind, Location};
pub use keystore::Keystore;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{Parser, parse};
pub use span::Span;
pub use table::Table;
pub use time::{LocalDate, LocalDateTime, LocalTime, OffsetDateTime, TimeOffset};
pub use value::Value;

#[cfg(feature = "to-toml")]
pub use encode::encode;

#[cfg(feature = "serde")]
pub mod impl_serde;

/// How floats are represented in the decoded tree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FloatMode {
    /// Every float becomes a [`Value::Float`].
    #[default]
    Native,
    /// Finite floats without an exponent become a [`Value::Decimal`] holding
    /// their source text with underscores and a leading `+` removed, so no
    /// precision is lost. Other floats stay [`Value::Float`].
    PreserveText,
}

/// Options accepted by [`decode_with`].
#[derive(Clone, Debug, Default)]
pub struct DecodeOptions {
    pub float_mode: FloatMode,
}

/// Decodes a TOML document with default options.
pub fn decode(text: &str) -> Result<Table, Error> {
    decode_with(text, &DecodeOptions::default())
}

/// Decodes a TOML document.
///
/// Every error carries a [`Location`]; the first error aborts the whole
/// decode.
pub fn decode_with(text: &str, options: &DecodeOptions) -> Result<Table, Error> {
    let result = parse(text).and_then(|root| {
        let nodes = root.nodes.len();
        let table = normalize::normalize(root, options).map_err(|e| e.locate(text))?;
        log::debug!("decoded {} bytes into {} top-level nodes", text.len(), nodes);
        Ok(table)
    });
    if let Err(e) = &result {
        match (e.line(), e.column()) {
            (Some(line), Some(column)) => {
                log::debug!("rejected document: {} at {}:{}", e.kind, line, column)
            }
            _ => log::debug!("rejected document: {}", e.kind),
        }
    }
    result
}
