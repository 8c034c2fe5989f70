//! Group table rows by a key, keeping the order keys are first seen.
//!
//! ```text
//! Input rows                     →  Groups (first-seen order)
//! ┌──────────────────────────┐     ┌───────────────────────────┐
//! │ 老師: Amy,  學生: 陳大文 │     │ Amy → [row 1, row 3]      │
//! │ 老師: Ben,  學生: 李小明 │  →  ├───────────────────────────┤
//! │ 老師: Amy,  學生: 張三   │     │ Ben → [row 2]             │
//! └──────────────────────────┘     └───────────────────────────┘
//! ```
//!
//! Rows whose key is `None` (an empty grouping cell) belong to no group,
//! so groups are never empty. Only null cells count as empty: a cell
//! holding spaces is still a key.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::hash::Hash;

use crate::models::cell_text;

/// A row of the input table with its 1-based data row number.
pub type NumberedRow<'a> = (usize, &'a [Value]);

/// Group rows by `key`, dropping rows for which it returns `None`.
pub fn group_rows<'a, K, I, F>(rows: I, mut key: F) -> IndexMap<K, Vec<NumberedRow<'a>>>
where
    K: Hash + Eq,
    I: IntoIterator<Item = NumberedRow<'a>>,
    F: FnMut(&[Value]) -> Option<K>,
{
    let mut groups: IndexMap<K, Vec<NumberedRow<'a>>> = IndexMap::new();
    for (line, row) in rows {
        if let Some(k) = key(row) {
            groups.entry(k).or_default().push((line, row));
        }
    }
    groups
}

/// Text of a grouping cell, or `None` when the cell is null.
pub fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(cell_text(other)),
    }
}

/// Distinct non-null values.
///
/// Values are compared as typed: the number `1001` and the text `"1001"`
/// are two values.
#[derive(Debug, Default)]
pub struct Distinct {
    seen: IndexSet<String>,
}

impl Distinct {
    pub fn insert(&mut self, value: &Value) {
        if !value.is_null() {
            // Value has no Hash; its JSON text keeps the type apart.
            self.seen.insert(value.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
