//! Boundary constraint derivation: the ordered predicate list a new
//! partition's CHECK constraint encodes.

use partition_types::keys::{KeyKind, KeySet};
use partition_types::values::{
    Error, KeyValue, KeyValues, MissingKeyValue, RangeExpected, Scalar, ScalarExpected,
};
use snafu::OptionExt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Comparison operator of one boundary predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryOp {
    Eq,
    Ge,
    Le,
    Lt,
}

impl BoundaryOp {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Lt => "<",
        }
    }
}

/// One per-column condition of a partition boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPredicate {
    column: String,
    op: BoundaryOp,
    value: Scalar,
}

impl BoundaryPredicate {
    fn new(column: impl Into<String>, op: BoundaryOp, value: Scalar) -> Self {
        Self {
            column: column.into(),
            op,
            value,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn op(&self) -> BoundaryOp {
        self.op
    }

    pub fn value(&self) -> &Scalar {
        &self.value
    }

    /// Render as a SQL boolean expression over the parent table's columns.
    pub fn to_sql(&self) -> String {
        format!(
            "{} {} {}",
            self.column,
            self.op.as_str(),
            self.value.to_sql_literal()
        )
    }
}

/// Derives the ordered boundary predicate list for a new partition from the
/// key values it is being created with.
///
/// Discrete keys contribute an equality predicate. Continuous keys
/// contribute an inclusive lower bound on the range begin and an upper
/// bound on the range end, strict when the range excludes its end. Building
/// is pure; nothing is touched on the backend.
#[derive(Debug)]
pub struct ConstraintBuilder<'a> {
    keys: &'a KeySet,
}

impl<'a> ConstraintBuilder<'a> {
    pub fn new(keys: &'a KeySet) -> Self {
        Self { keys }
    }

    /// Build the predicates, one or two per key, in key order.
    pub fn build(&self, values: &KeyValues) -> Result<Vec<BoundaryPredicate>> {
        let mut checks = Vec::new();
        for key in self.keys.iter() {
            let value = values
                .get(key.column())
                .context(MissingKeyValue { column: key.column() })?;
            match (key.kind(), value) {
                (KeyKind::Discrete, KeyValue::Scalar(scalar)) => {
                    checks.push(BoundaryPredicate::new(
                        key.column(),
                        BoundaryOp::Eq,
                        scalar.clone(),
                    ));
                }
                (KeyKind::Continuous, KeyValue::Range(range)) => {
                    checks.push(BoundaryPredicate::new(
                        key.column(),
                        BoundaryOp::Ge,
                        range.begin().clone(),
                    ));
                    let op = if range.end_exclusive() {
                        BoundaryOp::Lt
                    } else {
                        BoundaryOp::Le
                    };
                    checks.push(BoundaryPredicate::new(key.column(), op, range.end().clone()));
                }
                (KeyKind::Discrete, KeyValue::Range(_)) => {
                    return ScalarExpected { column: key.column() }.fail()
                }
                (KeyKind::Continuous, KeyValue::Scalar(_)) => {
                    return RangeExpected { column: key.column() }.fail()
                }
            }
        }
        Ok(checks)
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

    fn rendered(checks: &[BoundaryPredicate]) -> Vec<String> {
        checks.iter().map(BoundaryPredicate::to_sql).collect()
    }

    #[test]
    fn discrete_and_ranged_keys_build_ordered_predicates() {
        let keys = domain_date_keys();
        let values = KeyValues::new()
            .with("domain", "example.com")
            .with(
                "date",
                RangeValue::inclusive(date(2020, 1, 1), date(2020, 1, 31)).unwrap(),
            );

        let checks = ConstraintBuilder::new(&keys).build(&values).unwrap();
        assert_eq!(
            rendered(&checks),
            vec![
                "domain = 'example.com'",
                "date >= '2020-01-01'",
                "date <= '2020-01-31'",
            ]
        );
    }

    #[test]
    fn exclusive_ranges_use_a_strict_upper_bound() {
        let keys = domain_date_keys();
        let values = KeyValues::new()
            .with("domain", "example.com")
            .with(
                "date",
                RangeValue::exclusive(date(2020, 1, 1), date(2020, 2, 1)).unwrap(),
            );

        let checks = ConstraintBuilder::new(&keys).build(&values).unwrap();
        assert_eq!(checks[2].op(), BoundaryOp::Lt);
        assert_eq!(rendered(&checks)[2], "date < '2020-02-01'");
    }

    #[test]
    fn missing_values_fail_before_any_predicate_is_built() {
        let keys = domain_date_keys();
        let values = KeyValues::new().with("domain", "example.com");

        let err = ConstraintBuilder::new(&keys).build(&values).unwrap_err();
        assert!(matches!(err, Error::MissingKeyValue { ref column } if column == "date"));
    }

    #[test]
    fn value_shapes_are_checked_per_kind() {
        let keys = domain_date_keys();

        let values = KeyValues::new()
            .with("domain", RangeValue::inclusive(1i64, 2i64).unwrap())
            .with(
                "date",
                RangeValue::inclusive(date(2020, 1, 1), date(2020, 1, 31)).unwrap(),
            );
        let err = ConstraintBuilder::new(&keys).build(&values).unwrap_err();
        assert!(matches!(err, Error::ScalarExpected { .. }));

        let values = KeyValues::new()
            .with("domain", "example.com")
            .with("date", date(2020, 1, 1));
        let err = ConstraintBuilder::new(&keys).build(&values).unwrap_err();
        assert!(matches!(err, Error::RangeExpected { .. }));
    }
}
