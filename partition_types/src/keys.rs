//! Partition key definitions: which columns a logical table is split on
//! and how values of each column are matched against partition boundaries.

use serde::{Deserialize, Serialize};
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("key column '{}' is already part of this key set", column))]
    DuplicateKeyColumn { column: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Physical begin-bound column name of a continuous key column.
pub fn begin_column_name(column: &str) -> String {
    format!("{}_begin", column)
}

/// Physical end-bound column name of a continuous key column.
pub fn end_column_name(column: &str) -> String {
    format!("{}_end", column)
}

/// How values of a partitioning column are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyKind {
    /// Matched by exact equality. Occupies one physical catalog column.
    Discrete,

    /// Matched by containment in a `[begin, end]` interval. Occupies two
    /// physical catalog columns, `<column>_begin` and `<column>_end`.
    Continuous,
}

/// A single partitioning column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    column: String,
    kind: KeyKind,
}

impl Key {
    /// A key matched by exact equality.
    pub fn discrete(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            kind: KeyKind::Discrete,
        }
    }

    /// A ranged key matched by interval containment.
    pub fn continuous(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            kind: KeyKind::Continuous,
        }
    }

    /// The logical column name of this key.
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// The physical catalog column name(s) this key occupies.
    pub fn column_names(&self) -> Vec<String> {
        match self.kind {
            KeyKind::Discrete => vec![self.column.clone()],
            KeyKind::Continuous => vec![
                begin_column_name(&self.column),
                end_column_name(&self.column),
            ],
        }
    }
}

/// A uniqueness requirement the backend must enforce on the partition
/// catalog: no two partitions may share a value for `column` while agreeing
/// on every column in `scope`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniquenessRule {
    pub column: String,
    pub scope: Vec<String>,
}

/// An ordered set of partitioning keys, unique by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
    keys: Vec<Key>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key. Column names must be unique within the set.
    pub fn push(&mut self, key: Key) -> Result<()> {
        if self.keys.iter().any(|k| k.column() == key.column()) {
            return DuplicateKeyColumn { column: key.column() }.fail();
        }
        self.keys.push(key);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter()
    }

    /// Logical column names, in insertion order.
    pub fn columns(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.column().to_string()).collect()
    }

    /// Physical catalog column names in insertion order, continuous keys
    /// expanded to their `_begin`/`_end` pair.
    pub fn column_names(&self) -> Vec<String> {
        self.keys.iter().flat_map(Key::column_names).collect()
    }

    /// Physical column names excluding `column`, order preserved. This is
    /// the scope to which uniqueness of `column` is restricted.
    pub fn remaining_columns(&self, column: &str) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|c| c != column)
            .collect()
    }

    /// The uniqueness rules the catalog must enforce for this key set: one
    /// per physical column, each scoped to all other physical columns.
    pub fn uniqueness_rules(&self) -> Vec<UniquenessRule> {
        self.column_names()
            .into_iter()
            .map(|column| {
                let scope = self.remaining_columns(&column);
                UniquenessRule { column, scope }
            })
            .collect()
    }
}
