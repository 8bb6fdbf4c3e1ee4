//! Folds the syntax tree into the nested [`Table`] handed to callers.
//!
//! Every node becomes a single-path fragment (`[a.b]` with `x = 1` becomes
//! `{a: {b: {x: 1}}}`) and fragments are merged left to right. Arrays of
//! tables produce one-element arrays, so repeated headers concatenate.

#[cfg(test)]
#[path = "./normalize_tests.rs"]
mod tests;

use crate::ast::{self, Key, KeyValuePair, Node, RootTable};
use crate::{DecodeOptions, Error, ErrorKind, FloatMode, Table, Value};

/// Converts a parsed document into its value tree.
///
/// The keystore has already rejected redefinitions, so a conflict here means
/// two fragments disagree on the shape of a key. Such errors carry the span
/// of the node that could not be merged; they are not yet located.
pub fn normalize(root: RootTable, options: &DecodeOptions) -> Result<Table, Error> {
    let mut out = Table::new();
    for node in root.nodes {
        let span = node.span();
        let fragment = match node {
            Node::KeyValue(kv) => key_value(kv, options)?,
            Node::Table(table) => {
                let body = elements(table.elements, options)?;
                objectify(&table.key, Value::Table(body))
            }
            Node::ArrayTable(table) => {
                let body = elements(table.elements, options)?;
                objectify(&table.key, Value::Array(vec![Value::Table(body)]))
            }
        };
        merge(&mut out, fragment).map_err(|kind| Error::from((kind, span)))?;
    }
    Ok(out)
}

fn elements(pairs: Vec<KeyValuePair>, options: &DecodeOptions) -> Result<Table, Error> {
    let mut out = Table::new();
    for kv in pairs {
        let span = kv.span;
        let fragment = key_value(kv, options)?;
        merge(&mut out, fragment).map_err(|kind| Error::from((kind, span)))?;
    }
    Ok(out)
}

fn key_value(kv: KeyValuePair, options: &DecodeOptions) -> Result<Table, Error> {
    let value = value(kv.value, options)?;
    Ok(objectify(&kv.key, value))
}

fn value(value: ast::Value, options: &DecodeOptions) -> Result<Value, Error> {
    Ok(match value {
        ast::Value::String(s) => Value::String(s),
        ast::Value::Integer(i) => Value::Integer(i),
        ast::Value::Float { value, text } => match options.float_mode {
            FloatMode::PreserveText if value.is_finite() && !text.contains(['e', 'E']) => {
                Value::Decimal(text)
            }
            _ => Value::Float(value),
        },
        ast::Value::Boolean(b) => Value::Boolean(b),
        ast::Value::OffsetDateTime(dt) => Value::OffsetDateTime(dt),
        ast::Value::LocalDateTime(dt) => Value::LocalDateTime(dt),
        ast::Value::LocalDate(date) => Value::LocalDate(date),
        ast::Value::LocalTime(time) => Value::LocalTime(time),
        ast::Value::Array(values) => Value::Array(
            values
                .into_iter()
                .map(|v| self::value(v, options))
                .collect::<Result<_, _>>()?,
        ),
        ast::Value::InlineTable(pairs) => Value::Table(elements(pairs, options)?),
    })
}

/// Wraps `value` in one single-entry table per key segment.
pub fn objectify(key: &Key, value: Value) -> Table {
    let mut names = key.names().rev();
    let mut table = Table::new();
    let Some(last) = names.next() else {
        return table;
    };
    table.insert(last, value);
    for name in names {
        let mut parent = Table::new();
        parent.insert(name, Value::Table(table));
        table = parent;
    }
    table
}

/// Merges `incoming` into `acc`.
///
/// Arrays concatenate, tables merge recursively, and a table merged into an
/// array of tables lands in that array's last element. On error `acc` is
/// left partially merged and should be discarded.
pub fn merge(acc: &mut Table, incoming: Table) -> Result<(), ErrorKind> {
    for (key, value) in incoming {
        match acc.get_mut(&key) {
            Some(existing) => merge_value(existing, value, &key)?,
            None => {
                acc.insert(key, value);
            }
        }
    }
    Ok(())
}

fn merge_value(existing: &mut Value, incoming: Value, key: &str) -> Result<(), ErrorKind> {
    match (existing, incoming) {
        (Value::Array(acc), Value::Array(values)) => acc.extend(values),
        (Value::Table(acc), Value::Table(table)) => merge(acc, table)?,
        (Value::Array(acc), Value::Table(table)) if matches!(acc.last(), Some(Value::Table(_))) => {
            if let Some(Value::Table(last)) = acc.last_mut() {
                merge(last, table)?;
            }
        }
        _ => {
            return Err(ErrorKind::ConflictingValue {
                key: key.to_owned(),
            });
        }
    }
    Ok(())
}
