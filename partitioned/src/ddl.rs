//! Child table DDL: the structured "create a child table inheriting the
//! parent, constrained to its boundary" request handed to the storage
//! backend.

use crate::boundary::BoundaryPredicate;

/// A child table creation request. Backends that speak SQL can render it
/// with [`to_sql`](Self::to_sql); others interpret the fields directly.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildTableDdl {
    name: String,
    parent: String,
    checks: Vec<BoundaryPredicate>,
}

impl ChildTableDdl {
    pub fn new(
        name: impl Into<String>,
        parent: impl Into<String>,
        checks: Vec<BoundaryPredicate>,
    ) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            checks,
        }
    }

    /// Physical name of the child table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent table the child inherits its column schema from.
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// The boundary predicates, conjoined into the CHECK constraint.
    pub fn checks(&self) -> &[BoundaryPredicate] {
        &self.checks
    }

    /// Render for SQL backends that support table inheritance.
    pub fn to_sql(&self) -> String {
        let boundary = self
            .checks
            .iter()
            .map(BoundaryPredicate::to_sql)
            .collect::<Vec<_>>()
            .join(" AND ");
        format!(
            "CREATE TABLE {} (\n  CHECK ({})\n) INHERITS ({});",
            self.name, boundary, self.parent
        )
    }
}
