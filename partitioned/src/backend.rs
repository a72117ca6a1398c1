//! Traits by which the partitioning core talks to the storage system:
//! catalog reads, transactional catalog writes, and child table DDL. Having
//! the seam here keeps the core testable against the in-memory backend
//! while hosts plug in their own storage.

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use partition_types::keys::UniquenessRule;
use partition_types::partition_metadata::{PartitionId, PartitionRecord};
use partition_types::values::Scalar;
use snafu::Snafu;

use crate::ddl::ChildTableDdl;
use crate::router::MatchCondition;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum BackendError {
    #[snafu(display("uniqueness violated on column '{}'", column))]
    UniquenessViolation { column: String },

    #[snafu(display("backend execution failed: {}", message))]
    Execution { message: String },
}

pub type Result<T, E = BackendError> = std::result::Result<T, E>;

/// Declared storage type of a column, as reported by the backend's schema
/// metadata. Advisory: the core never depends on it for correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Date,
    Timestamp,
}

/// What catalog bootstrap must establish for one partitioned parent table.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSpec {
    /// The parent table partitions inherit from.
    pub parent_table: String,

    /// Physical key columns of the partition catalog, in key order.
    pub key_columns: Vec<String>,

    /// Uniqueness the backend must enforce on catalog writes. Enforcing
    /// these at the storage layer, not just in application code, is what
    /// closes the race between two concurrent creates for the same values.
    pub uniqueness_rules: Vec<UniquenessRule>,

    /// Rebuild catalog structures even if they already exist.
    pub force: bool,
}

/// A transactional unit of catalog-write plus DDL work. Dropping a
/// transaction without committing discards everything it buffered.
#[async_trait]
pub trait Transaction: Debug + Send {
    /// Insert a new partition row with the given physical key values and
    /// return its assigned identifier. Fails with
    /// [`BackendError::UniquenessViolation`] when the values collide with
    /// an existing partition under the installed uniqueness rules.
    async fn insert_partition(
        &mut self,
        parent_table: &str,
        values: &BTreeMap<String, Scalar>,
    ) -> Result<PartitionId>;

    /// Create the physical child table.
    async fn create_child_table(&mut self, ddl: &ChildTableDdl) -> Result<()>;

    /// Atomically apply all buffered work.
    async fn commit(&mut self) -> Result<()>;
}

/// The storage system the partitioning core runs against.
#[async_trait]
pub trait StorageBackend: Debug + Send + Sync {
    type Txn: Transaction;

    /// Open a new transaction.
    async fn begin(&self) -> Result<Self::Txn>;

    /// Find the first partition of `parent_table` satisfying every
    /// condition. Implementations must answer in catalog order, lowest
    /// identifier first, so ties resolve deterministically.
    async fn find_partition(
        &self,
        parent_table: &str,
        conditions: &[MatchCondition],
    ) -> Result<Option<PartitionRecord>>;

    /// Establish the catalog structures for a newly partitioned parent
    /// table.
    async fn init_catalog(&self, spec: &CatalogSpec) -> Result<()>;

    /// Declared storage type of `column` on the parent table, if known.
    async fn column_type(&self, parent_table: &str, column: &str) -> Result<Option<ColumnType>>;
}
