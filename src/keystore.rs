//! Online validation of key, table and array-of-tables definitions.
//!
//! Every path seen so far is kept as a dotted string. Segments are escaped
//! (`\`, `.` and a leading `[`) so that a synthesized array index segment
//! such as `[2]` can never be confused with a key written by the user.
//!
//! A [`Keystore`] is scoped to one document or one inline table and is
//! consulted once per node, before the node is linked into the tree.

#[cfg(test)]
#[path = "./keystore_tests.rs"]
mod tests;

use crate::ErrorKind;
use crate::ast::{ArrayTable, Key, KeyValuePair, Node, Table};
use foldhash::HashSet;

/// Paths in insertion order with constant time membership.
#[derive(Default)]
struct PathList {
    order: Vec<String>,
    members: HashSet<String>,
}

impl PathList {
    fn push(&mut self, path: String) {
        if self.members.insert(path.clone()) {
            self.order.push(path);
        }
    }

    fn contains(&self, path: &str) -> bool {
        self.members.contains(path)
    }

    fn last(&self) -> Option<&str> {
        self.order.last().map(String::as_str)
    }

    fn iter(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// Records every path defined in one scope and rejects redefinitions.
#[derive(Default)]
pub struct Keystore {
    /// Leaf key/value assignments.
    keys: HashSet<String>,
    /// Explicit tables and array-of-tables entries; the last one is the
    /// table that following key/value pairs belong to.
    tables: PathList,
    /// Array-of-tables entries, each suffixed with its `[index]` segment.
    array_tables: PathList,
    /// Parents created by dotted keys.
    implicit_tables: HashSet<String>,
}

impl Keystore {
    pub fn new() -> Keystore {
        Keystore::default()
    }

    /// Validates `node` against everything recorded so far and records it.
    pub fn add_node(&mut self, node: &Node) -> Result<(), ErrorKind> {
        match node {
            Node::KeyValue(kv) => self.add_key_value(kv),
            Node::Table(table) => self.add_table(table),
            Node::ArrayTable(table) => self.add_array_table(table),
        }
    }

    pub fn add_key_value(&mut self, kv: &KeyValuePair) -> Result<(), ErrorKind> {
        let duplicate = || ErrorKind::DuplicateKey {
            key: kv.key.to_string(),
        };
        let mut path = match self.tables.last() {
            Some(table) => format!("{table}."),
            None => String::new(),
        };
        let count = kv.key.segments.len();
        for (i, segment) in kv.key.names().enumerate() {
            if i != 0 {
                path.push('.');
            }
            path.push_str(&escape_segment(segment));

            if self.keys.contains(&path)
                || self.tables.contains(&path)
                || self.tables.contains(&format!("{path}.[0]"))
            {
                return Err(duplicate());
            }
            if i + 1 < count {
                self.implicit_tables.insert(path.clone());
                continue;
            }
            if self.implicit_tables.contains(&path) {
                return Err(duplicate());
            }
        }
        log::trace!("keystore: key `{path}`");
        self.keys.insert(path);
        Ok(())
    }

    pub fn add_table(&mut self, table: &Table) -> Result<(), ErrorKind> {
        let header = key_path(&table.key);
        let header_segments = split_segments(&header);

        let owner = self
            .array_tables
            .iter()
            .rev()
            .find(|entry| has_prefix(&header_segments, &split_segments(&header_of(entry))));

        let (mut path, remainder) = match owner {
            Some(entry) => {
                let owner_len = split_segments(&header_of(entry)).len();
                let remainder = &header_segments[owner_len..];
                if remainder.is_empty() {
                    return Err(ErrorKind::BrokenKey {
                        name: table.key.to_string(),
                    });
                }
                (format!("{entry}."), remainder)
            }
            None => (String::new(), &header_segments[..]),
        };

        for (i, segment) in remainder.iter().enumerate() {
            if i != 0 {
                path.push('.');
            }
            path.push_str(segment);
            if self.keys.contains(&path) {
                return Err(ErrorKind::DuplicateKey {
                    key: table.key.to_string(),
                });
            }
        }

        if self.array_tables.contains(&path)
            || self.tables.contains(&path)
            || self.implicit_tables.contains(&path)
        {
            return Err(ErrorKind::DuplicateTable {
                name: table.key.to_string(),
            });
        }
        log::trace!("keystore: table `{path}`");
        self.tables.push(path);
        Ok(())
    }

    pub fn add_array_table(&mut self, table: &ArrayTable) -> Result<(), ErrorKind> {
        let duplicate = || ErrorKind::DuplicateTable {
            name: table.key.to_string(),
        };
        let header = key_path(&table.key);
        if self.keys.contains(&header)
            || self.tables.contains(&header)
            || self.implicit_tables.contains(&header)
        {
            return Err(duplicate());
        }

        let header_segments = split_segments(&header);
        let mut path = header.clone();
        let mut index = 0usize;
        for entry in self.array_tables.iter().rev() {
            let entry_header = header_of(entry);
            if entry_header == header {
                index += 1;
                continue;
            }
            let entry_segments = split_segments(&entry_header);
            if has_prefix(&header_segments, &entry_segments) {
                path = format!("{entry}.{}", header_segments[entry_segments.len()..].join("."));
                break;
            }
        }

        // An array of tables cannot be declared after a table below it.
        if index == 0
            && self
                .tables
                .iter()
                .any(|existing| has_prefix(&split_segments(existing), &header_segments))
        {
            return Err(duplicate());
        }
        if self.keys.contains(&path) || self.tables.contains(&path) {
            return Err(duplicate());
        }

        path.push_str(&format!(".[{index}]"));
        log::trace!("keystore: array table entry `{path}`");
        self.array_tables.push(path.clone());
        self.tables.push(path);
        Ok(())
    }
}

fn escape_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        match c {
            '\\' | '.' => out.push('\\'),
            '[' if i == 0 => out.push('\\'),
            _ => {}
        }
        out.push(c);
    }
    out
}

fn key_path(key: &Key) -> String {
    key.names().map(escape_segment).collect::<Vec<_>>().join(".")
}

/// Splits a path on unescaped dots, keeping each segment escaped.
fn split_segments(path: &str) -> Vec<&str> {
    let bytes = path.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'.' => {
                segments.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(&path[start..]);
    segments
}

/// The header an array-of-tables entry was declared with: its path with
/// every `[index]` segment removed.
fn header_of(entry: &str) -> String {
    split_segments(entry)
        .into_iter()
        .filter(|segment| !segment.starts_with('['))
        .collect::<Vec<_>>()
        .join(".")
}

/// Whether `prefix` equals the leading segments of `path`.
fn has_prefix(path: &[&str], prefix: &[&str]) -> bool {
    path.len() >= prefix.len() && path[..prefix.len()] == *prefix
}
