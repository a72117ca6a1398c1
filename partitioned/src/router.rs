//! Partition routing: building the match conditions that locate the single
//! partition whose boundary contains a given key-value tuple.

use partition_types::keys::{begin_column_name, end_column_name, KeyKind, KeySet};
use partition_types::values::{Error, KeyValue, KeyValues, MissingKeyValue, Scalar, ScalarExpected};
use snafu::OptionExt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// One per-key condition of a routing query against the partition catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchCondition {
    /// The stored column equals the value (discrete keys).
    Eq { column: String, value: Scalar },

    /// The value falls inside the stored `[<column>_begin, <column>_end]`
    /// interval, inclusive on both ends (continuous keys).
    Contains { column: String, value: Scalar },
}

impl MatchCondition {
    /// Render as a SQL boolean expression over the catalog row.
    pub fn to_sql(&self) -> String {
        match self {
            Self::Eq { column, value } => format!("{} = {}", column, value.to_sql_literal()),
            Self::Contains { column, value } => {
                let literal = value.to_sql_literal();
                format!(
                    "{} >= {} AND {} <= {}",
                    literal,
                    begin_column_name(column),
                    literal,
                    end_column_name(column)
                )
            }
        }
    }
}

/// Builds the conjunction of match conditions identifying the partition
/// that owns a set of key values.
///
/// This routes by containment, not by the keys a partition was created
/// with: a continuous key takes a single point value here, and the point
/// matches a partition when it lies within the stored begin/end interval,
/// inclusive on both ends.
#[derive(Debug)]
pub struct PartitionRouter<'a> {
    keys: &'a KeySet,
}

impl<'a> PartitionRouter<'a> {
    pub fn new(keys: &'a KeySet) -> Self {
        Self { keys }
    }

    /// Build one condition per key, in key order. Every key must have a
    /// point value.
    pub fn conditions(&self, values: &KeyValues) -> Result<Vec<MatchCondition>> {
        let mut conditions = Vec::with_capacity(self.keys.len());
        for key in self.keys.iter() {
            let value = values
                .get(key.column())
                .context(MissingKeyValue { column: key.column() })?;
            let scalar = match value {
                KeyValue::Scalar(scalar) => scalar.clone(),
                KeyValue::Range(_) => {
                    return ScalarExpected { column: key.column() }.fail()
                }
            };
            let column = key.column().to_string();
            conditions.push(match key.kind() {
                KeyKind::Discrete => MatchCondition::Eq {
                    column,
                    value: scalar,
                },
                KeyKind::Continuous => MatchCondition::Contains {
                    column,
                    value: scalar,
                },
            });
        }
        Ok(conditions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use partition_types::keys::Key;
    use partition_types::values::RangeValue;

    fn domain_date_keys() -> KeySet {
        let mut keys = KeySet::new();
        keys.push(Key::discrete("domain")).unwrap();
        keys.push(Key::continuous("date")).unwrap();
        keys
    }

    fn date(y: i32, m: u32, d: u32) -> Scalar {
        Scalar::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn conditions_follow_key_order() {
        let keys = domain_date_keys();
        let values = KeyValues::new()
            .with("date", date(2020, 1, 15))
            .with("domain", "example.com");

        let conditions = PartitionRouter::new(&keys).conditions(&values).unwrap();
        assert_eq!(
            conditions,
            vec![
                MatchCondition::Eq {
                    column: "domain".to_string(),
                    value: Scalar::from("example.com"),
                },
                MatchCondition::Contains {
                    column: "date".to_string(),
                    value: date(2020, 1, 15),
                },
            ]
        );
    }

    #[test]
    fn containment_renders_inclusive_on_both_ends() {
        let condition = MatchCondition::Contains {
            column: "date".to_string(),
            value: date(2020, 1, 15),
        };
        assert_eq!(
            condition.to_sql(),
            "'2020-01-15' >= date_begin AND '2020-01-15' <= date_end"
        );
    }

    #[test]
    fn ranges_are_rejected_for_routing() {
        let keys = domain_date_keys();
        let values = KeyValues::new()
            .with("domain", "example.com")
            .with(
                "date",
                RangeValue::inclusive(date(2020, 1, 1), date(2020, 1, 31)).unwrap(),
            );

        let err = PartitionRouter::new(&keys).conditions(&values).unwrap_err();
        assert!(matches!(err, Error::ScalarExpected { ref column } if column == "date"));
    }

    #[test]
    fn missing_values_are_reported_explicitly() {
        let keys = domain_date_keys();
        let values = KeyValues::new().with("date", date(2020, 1, 15));

        let err = PartitionRouter::new(&keys).conditions(&values).unwrap_err();
        assert!(matches!(err, Error::MissingKeyValue { ref column } if column == "domain"));
    }
}
