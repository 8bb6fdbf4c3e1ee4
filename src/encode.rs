#![cfg_attr(docsrs, doc(cfg(feature = "to-toml")))]

//! Writes a value tree back out as TOML text.
//!
//! Scalars, arrays and inline tables of a table come first, followed by its
//! sub-tables as `[headers]` and its arrays of tables as `[[headers]]`.
//! Decoding the output yields a tree equal to the input.

#[cfg(test)]
#[path = "./encode_tests.rs"]
mod tests;

use crate::lexer::is_keylike_byte;
use crate::{Error, ErrorKind, Span, Table, Value};
use std::fmt::Write as _;

/// Encodes `table` as a TOML document.
pub fn encode(table: &Table) -> Result<String, Error> {
    let mut encoder = Encoder {
        out: String::new(),
        path: Vec::new(),
    };
    encoder.table_body(table)?;
    Ok(encoder.out)
}

struct Encoder<'t> {
    out: String,
    /// Keys of the header currently being written.
    path: Vec<&'t str>,
}

/// Values written as their own `[header]` or `[[header]]` sections.
fn is_section(value: &Value) -> bool {
    match value {
        Value::Table(_) => true,
        Value::Array(values) => is_array_of_tables(values),
        _ => false,
    }
}

fn is_array_of_tables(values: &[Value]) -> bool {
    !values.is_empty() && values.iter().all(|v| matches!(v, Value::Table(_)))
}

impl<'t> Encoder<'t> {
    fn table_body(&mut self, table: &'t Table) -> Result<(), Error> {
        for (key, value) in table {
            if is_section(value) {
                continue;
            }
            encode_key(key, &mut self.out);
            self.out.push_str(" = ");
            encode_inline(value, &mut self.out)?;
            self.out.push('\n');
        }

        for (key, value) in table {
            match value {
                Value::Table(sub) => {
                    self.path.push(key);
                    self.header("[", "]");
                    self.table_body(sub)?;
                    self.path.pop();
                }
                Value::Array(values) if is_array_of_tables(values) => {
                    self.path.push(key);
                    for element in values {
                        self.header("[[", "]]");
                        if let Value::Table(sub) = element {
                            self.table_body(sub)?;
                        }
                    }
                    self.path.pop();
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn header(&mut self, open: &str, close: &str) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out.push_str(open);
        for (i, key) in self.path.iter().enumerate() {
            if i != 0 {
                self.out.push('.');
            }
            encode_key(key, &mut self.out);
        }
        self.out.push_str(close);
        self.out.push('\n');
    }
}

fn encode_key(key: &str, out: &mut String) {
    if !key.is_empty() && key.bytes().all(is_keylike_byte) {
        out.push_str(key);
    } else {
        encode_string(key, out);
    }
}

fn encode_string(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn encode_float(f: f64, out: &mut String) {
    if f.is_nan() {
        out.push_str("nan");
    } else if f.is_infinite() {
        out.push_str(if f > 0.0 { "inf" } else { "-inf" });
    } else {
        // Always carry an exponent so that `FloatMode::PreserveText` reads
        // the value back as a float rather than a decimal.
        let mut buffer = zmij::Buffer::new();
        let text = buffer.format(f);
        out.push_str(text);
        if !text.contains(['e', 'E']) {
            out.push_str("e0");
        }
    }
}

/// `-?digits(.digits)?`
fn is_plain_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (integral, fraction) = match unsigned.split_once('.') {
        Some((integral, fraction)) => (integral, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(integral)
        && (integral == "0" || !integral.starts_with('0'))
        && fraction.is_none_or(digits)
}

fn encode_inline(value: &Value, out: &mut String) -> Result<(), Error> {
    match value {
        Value::String(s) => encode_string(s, out),
        Value::Integer(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Float(f) => encode_float(*f, out),
        Value::Decimal(text) => {
            if !is_plain_decimal(text) {
                return Err(Error::from((
                    ErrorKind::InvalidNumber("decimal text is not a plain float"),
                    Span::default(),
                )));
            }
            out.push_str(text);
            if !text.contains('.') {
                out.push_str(".0");
            }
        }
        Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::OffsetDateTime(dt) => {
            let _ = write!(out, "{dt}");
        }
        Value::LocalDateTime(dt) => {
            let _ = write!(out, "{dt}");
        }
        Value::LocalDate(date) => {
            let _ = write!(out, "{date}");
        }
        Value::LocalTime(time) => {
            let _ = write!(out, "{time}");
        }
        Value::Array(values) => {
            out.push('[');
            for (i, element) in values.iter().enumerate() {
                if i != 0 {
                    out.push_str(", ");
                }
                encode_inline(element, out)?;
            }
            out.push(']');
        }
        Value::Table(table) => {
            if table.is_empty() {
                out.push_str("{}");
                return Ok(());
            }
            out.push_str("{ ");
            for (i, (key, element)) in table.iter().enumerate() {
                if i != 0 {
                    out.push_str(", ");
                }
                encode_key(key, out);
                out.push_str(" = ");
                encode_inline(element, out)?;
            }
            out.push_str(" }");
        }
    }
    Ok(())
}
