//! Catalog metadata for partitions, shared across the storage seam.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::values::Scalar;

/// Catalog-assigned identifier of a partition. Used to derive the physical
/// child table name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PartitionId(pub u32);

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raw partition row as stored in the catalog: the identifier plus the
/// physical key column values the partition was created with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionRecord {
    pub id: PartitionId,
    pub values: BTreeMap<String, Scalar>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_ids_display_plainly() {
        assert_eq!(PartitionId(17).to_string(), "17");
    }

    #[test]
    fn partition_ids_order_numerically() {
        assert!(PartitionId(2) < PartitionId(10));
    }
}
