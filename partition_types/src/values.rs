//! Tagged key values supplied by callers: scalars for discrete keys and
//! routing points, ranges for continuous keys at partition creation time.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, Snafu};

use crate::keys::{begin_column_name, end_column_name, KeyKind, KeySet};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("no value provided for key '{}'", column))]
    MissingKeyValue { column: String },

    #[snafu(display("key '{}' takes a single scalar value, not a range", column))]
    ScalarExpected { column: String },

    #[snafu(display("key '{}' is ranged and takes a begin/end range value", column))]
    RangeExpected { column: String },

    #[snafu(display("range bounds must share one value type, got {} and {}", begin, end))]
    MismatchedRangeBounds { begin: Scalar, end: Scalar },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A typed literal value for one physical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl Scalar {
    /// Render as a SQL literal. Quoted variants double any embedded single
    /// quotes.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Integer(v) => v.to_string(),
            Self::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            Self::Timestamp(t) => format!("'{}'", t.to_rfc3339()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

/// Scalars order within a variant; values of different variants have no
/// defined ordering.
impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.partial_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.partial_cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<NaiveDate> for Scalar {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

/// An interval for a continuous key: inclusive begin, optionally exclusive
/// end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeValue {
    begin: Scalar,
    end: Scalar,
    end_exclusive: bool,
}

impl RangeValue {
    /// A range whose end is part of the interval.
    pub fn inclusive(begin: impl Into<Scalar>, end: impl Into<Scalar>) -> Result<Self> {
        Self::new(begin.into(), end.into(), false)
    }

    /// A range that stops just short of `end`.
    pub fn exclusive(begin: impl Into<Scalar>, end: impl Into<Scalar>) -> Result<Self> {
        Self::new(begin.into(), end.into(), true)
    }

    fn new(begin: Scalar, end: Scalar, end_exclusive: bool) -> Result<Self> {
        if std::mem::discriminant(&begin) != std::mem::discriminant(&end) {
            return MismatchedRangeBounds { begin, end }.fail();
        }
        Ok(Self {
            begin,
            end,
            end_exclusive,
        })
    }

    pub fn begin(&self) -> &Scalar {
        &self.begin
    }

    pub fn end(&self) -> &Scalar {
        &self.end
    }

    pub fn end_exclusive(&self) -> bool {
        self.end_exclusive
    }
}

/// A caller-supplied value for one partitioning key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KeyValue {
    /// A single point: discrete keys always, continuous keys when routing.
    Scalar(Scalar),

    /// An interval: continuous keys at partition creation time.
    Range(RangeValue),
}

impl From<Scalar> for KeyValue {
    fn from(v: Scalar) -> Self {
        Self::Scalar(v)
    }
}

impl From<RangeValue> for KeyValue {
    fn from(v: RangeValue) -> Self {
        Self::Range(v)
    }
}

impl From<&str> for KeyValue {
    fn from(v: &str) -> Self {
        Self::Scalar(v.into())
    }
}

impl From<String> for KeyValue {
    fn from(v: String) -> Self {
        Self::Scalar(v.into())
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        Self::Scalar(v.into())
    }
}

impl From<NaiveDate> for KeyValue {
    fn from(v: NaiveDate) -> Self {
        Self::Scalar(v.into())
    }
}

impl From<DateTime<Utc>> for KeyValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Scalar(v.into())
    }
}

/// The column → value mapping supplied to create and routing calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyValues {
    values: BTreeMap<String, KeyValue>,
}

impl KeyValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<KeyValue>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&KeyValue> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Expand to the physical catalog row for `keys`: discrete keys map to
    /// one `(column, scalar)` entry, continuous keys to their
    /// `_begin`/`_end` pair. Every key must have a value of the right
    /// shape.
    pub fn physical(&self, keys: &KeySet) -> Result<BTreeMap<String, Scalar>> {
        let mut row = BTreeMap::new();
        for key in keys.iter() {
            let value = self
                .get(key.column())
                .context(MissingKeyValue { column: key.column() })?;
            match (key.kind(), value) {
                (KeyKind::Discrete, KeyValue::Scalar(scalar)) => {
                    row.insert(key.column().to_string(), scalar.clone());
                }
                (KeyKind::Continuous, KeyValue::Range(range)) => {
                    row.insert(begin_column_name(key.column()), range.begin().clone());
                    row.insert(end_column_name(key.column()), range.end().clone());
                }
                (KeyKind::Discrete, KeyValue::Range(_)) => {
                    return ScalarExpected { column: key.column() }.fail()
                }
                (KeyKind::Continuous, KeyValue::Scalar(_)) => {
                    return RangeExpected { column: key.column() }.fail()
                }
            }
        }
        Ok(row)
    }
}
