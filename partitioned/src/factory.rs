//! The partition factory: owns one parent table's partitioning keys and
//! drives partition creation, routing, and catalog bootstrap against a
//! storage backend.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use snafu::{ResultExt, Snafu};
use tracing::{debug, info};

use partition_types::keys::KeySet;
use partition_types::partition_metadata::PartitionId;
use partition_types::values::{self, KeyValues};

use crate::backend::{BackendError, CatalogSpec, ColumnType, StorageBackend, Transaction};
use crate::boundary::ConstraintBuilder;
use crate::ddl::ChildTableDdl;
use crate::router::PartitionRouter;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("a partition factory needs at least one partitioning key"))]
    EmptyKeySet {},

    #[snafu(display("invalid key values for partition boundary: {}", source))]
    Boundary { source: values::Error },

    #[snafu(display("invalid key values for partition routing: {}", source))]
    Routing { source: values::Error },

    #[snafu(display("key values collide with an existing partition on '{}'", column))]
    UniquenessConflict { column: String },

    #[snafu(display("storage backend error: {}", source))]
    Backend { source: BackendError },
}

impl From<BackendError> for Error {
    fn from(source: BackendError) -> Self {
        match source {
            BackendError::UniquenessViolation { column } => Self::UniquenessConflict { column },
            source => Self::Backend { source },
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Retention age configuration: a fixed value or one computed on demand.
pub enum DumpAge {
    Fixed(i64),
    Computed(Box<dyn Fn() -> i64 + Send + Sync>),
}

impl fmt::Debug for DumpAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(age) => f.debug_tuple("Fixed").field(age).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl Default for DumpAge {
    fn default() -> Self {
        Self::Fixed(0)
    }
}

/// Factory configuration. Recognized options: a retention age consumed by
/// dump tooling and whether partitions are archived rather than dropped.
#[derive(Debug, Default)]
pub struct PartitionOptions {
    pub dump_age: DumpAge,
    pub archive: bool,
}

/// One physical child table plus its catalog identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition {
    id: PartitionId,
    table_name: String,
    parent_table: String,
}

impl Partition {
    /// Partitions are handed out by their owning [`PartitionFactory`],
    /// never constructed directly.
    pub(crate) fn new(id: PartitionId, table_name: String, parent_table: String) -> Self {
        Self {
            id,
            table_name,
            parent_table,
        }
    }

    pub fn id(&self) -> PartitionId {
        self.id
    }

    /// Physical name of the child table.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The parent table this partition inherits from.
    pub fn parent_table(&self) -> &str {
        &self.parent_table
    }
}

/// Partitioning driver for one parent table.
#[derive(Debug)]
pub struct PartitionFactory<B: StorageBackend> {
    schema_name: Option<String>,
    table_name: String,
    keys: KeySet,
    backend: Arc<B>,
    options: PartitionOptions,
}

impl<B: StorageBackend> PartitionFactory<B> {
    /// Build a factory for `parent_table`, optionally schema qualified as
    /// `schema.table`. The key set must not be empty: partitioning without
    /// a key is meaningless.
    pub fn new(
        parent_table: impl Into<String>,
        keys: KeySet,
        backend: Arc<B>,
        options: PartitionOptions,
    ) -> Result<Self> {
        if keys.is_empty() {
            return EmptyKeySet {}.fail();
        }
        let parent_table = parent_table.into();
        let (schema_name, table_name) = match parent_table.split_once('.') {
            Some((schema, table)) => (Some(schema.to_string()), table.to_string()),
            None => (None, parent_table),
        };
        Ok(Self {
            schema_name,
            table_name,
            keys,
            backend,
            options,
        })
    }

    /// The schema-qualified parent table name.
    pub fn parent_table(&self) -> String {
        match &self.schema_name {
            Some(schema) => format!("{}.{}", schema, self.table_name),
            None => self.table_name.clone(),
        }
    }

    pub fn keys(&self) -> &KeySet {
        &self.keys
    }

    fn partition_table_name(&self, id: PartitionId) -> String {
        format!("{}_part_{}", self.parent_table(), id)
    }

    /// Create the partition owning `values`: one transaction covering the
    /// catalog row, the derived boundary constraint, and the child table.
    /// Either everything lands or nothing does.
    pub async fn create(&self, values: &KeyValues) -> Result<Partition> {
        // Both derivations are pure and run before any backend work, so
        // bad input never opens a transaction.
        let checks = ConstraintBuilder::new(&self.keys)
            .build(values)
            .context(Boundary)?;
        let row = values.physical(&self.keys).context(Boundary)?;

        let parent = self.parent_table();
        let mut txn = self.backend.begin().await?;
        let id = txn.insert_partition(&parent, &row).await?;
        let table_name = self.partition_table_name(id);
        let ddl = ChildTableDdl::new(table_name.as_str(), parent.as_str(), checks);
        txn.create_child_table(&ddl).await?;
        txn.commit().await?;

        info!(partition = %table_name, parent = %parent, "created partition");
        Ok(Partition::new(id, table_name, parent))
    }

    /// Find the partition whose boundary contains `values`. Continuous
    /// keys take the point value to locate, not the range the partition
    /// was created with. `Ok(None)` means no partition owns the values;
    /// when boundaries overlap, the partition with the lowest identifier
    /// wins.
    pub async fn find_for(&self, values: &KeyValues) -> Result<Option<Partition>> {
        let conditions = PartitionRouter::new(&self.keys)
            .conditions(values)
            .context(Routing)?;
        let parent = self.parent_table();
        let record = self.backend.find_partition(&parent, &conditions).await?;
        debug!(parent = %parent, found = record.is_some(), "routed key values");
        Ok(record.map(|record| {
            let table_name = self.partition_table_name(record.id);
            Partition::new(record.id, table_name, parent.clone())
        }))
    }

    /// Ask the backend to establish the catalog structures this key set
    /// needs: the parent table, the physical key columns, and one
    /// uniqueness rule per physical column scoped to the remaining
    /// columns.
    pub async fn initialize_catalog(&self, force: bool) -> Result<()> {
        let spec = CatalogSpec {
            parent_table: self.parent_table(),
            key_columns: self.keys.column_names(),
            uniqueness_rules: self.keys.uniqueness_rules(),
            force,
        };
        self.backend.init_catalog(&spec).await?;
        info!(parent = %spec.parent_table, "initialized partition catalog");
        Ok(())
    }

    /// Declared storage type of a parent table column, if the backend
    /// knows it.
    pub async fn column_type(&self, column: &str) -> Result<Option<ColumnType>> {
        Ok(self
            .backend
            .column_type(&self.parent_table(), column)
            .await?)
    }

    /// Retention age consumed by dump tooling.
    pub fn dump_age(&self) -> i64 {
        match &self.options.dump_age {
            DumpAge::Fixed(age) => *age,
            DumpAge::Computed(age) => age(),
        }
    }

    /// Whether expired partitions are archived rather than dropped.
    pub fn archive(&self) -> bool {
        self.options.archive
    }
}
