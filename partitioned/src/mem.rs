//! In-memory storage backend: a complete catalog and table store used by
//! the tests and usable by hosts as a reference implementation of the
//! backend seam.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;

use async_trait::async_trait;
use partition_types::keys::{begin_column_name, end_column_name, UniquenessRule};
use partition_types::partition_metadata::{PartitionId, PartitionRecord};
use partition_types::values::Scalar;
use tracing::debug;

use crate::backend::{
    CatalogSpec, ColumnType, Execution, Result, StorageBackend, Transaction, UniquenessViolation,
};
use crate::ddl::ChildTableDdl;
use crate::router::MatchCondition;

#[derive(Debug, Default)]
struct State {
    initialized: bool,
    next_id: u32,
    partitions: BTreeMap<PartitionId, BTreeMap<String, Scalar>>,
    tables: BTreeSet<String>,
    rules: Vec<UniquenessRule>,
    column_types: BTreeMap<String, ColumnType>,
}

impl State {
    /// Reject `values` if any installed rule finds an existing partition
    /// with the same value for the rule column and the same values across
    /// the rule scope.
    fn check_rules(&self, values: &BTreeMap<String, Scalar>) -> Result<()> {
        for rule in &self.rules {
            let candidate = match values.get(&rule.column) {
                Some(candidate) => candidate,
                None => continue,
            };
            for existing in self.partitions.values() {
                if existing.get(&rule.column) == Some(candidate)
                    && rule.scope.iter().all(|c| existing.get(c) == values.get(c))
                {
                    return UniquenessViolation {
                        column: rule.column.clone(),
                    }
                    .fail();
                }
            }
        }
        Ok(())
    }
}

fn matches_condition(values: &BTreeMap<String, Scalar>, condition: &MatchCondition) -> bool {
    match condition {
        MatchCondition::Eq { column, value } => values.get(column) == Some(value),
        MatchCondition::Contains { column, value } => {
            let begin = values.get(&begin_column_name(column));
            let end = values.get(&end_column_name(column));
            match (begin, end) {
                (Some(begin), Some(end)) => {
                    matches!(
                        value.partial_cmp(begin),
                        Some(Ordering::Greater) | Some(Ordering::Equal)
                    ) && matches!(
                        value.partial_cmp(end),
                        Some(Ordering::Less) | Some(Ordering::Equal)
                    )
                }
                _ => false,
            }
        }
    }
}

/// An in-memory partition catalog and table store.
#[derive(Debug, Default)]
pub struct MemBackend {
    state: Arc<Mutex<State>>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the storage type of a parent table column.
    pub fn set_column_type(&self, column: impl Into<String>, column_type: ColumnType) {
        self.state
            .lock()
            .column_types
            .insert(column.into(), column_type);
    }

    /// Record a physical table that exists outside the catalog's control.
    pub fn register_table(&self, name: impl Into<String>) {
        self.state.lock().tables.insert(name.into());
    }

    /// Number of committed catalog rows.
    pub fn partition_count(&self) -> usize {
        self.state.lock().partitions.len()
    }

    /// Whether the physical table `name` exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.state.lock().tables.contains(name)
    }
}

/// A buffered transaction against a [`MemBackend`]. Work is applied on
/// [`commit`](Transaction::commit); a dropped transaction leaves no trace.
#[derive(Debug)]
pub struct MemTransaction {
    state: Arc<Mutex<State>>,
    pending_partition: Option<(PartitionId, BTreeMap<String, Scalar>)>,
    pending_tables: Vec<String>,
}

#[async_trait]
impl Transaction for MemTransaction {
    async fn insert_partition(
        &mut self,
        _parent_table: &str,
        values: &BTreeMap<String, Scalar>,
    ) -> Result<PartitionId> {
        let mut state = self.state.lock();
        state.check_rules(values)?;
        // Identifier assignment is sequence-like: ids consumed by a
        // transaction that later rolls back are not reused.
        let id = PartitionId(state.next_id);
        state.next_id += 1;
        self.pending_partition = Some((id, values.clone()));
        Ok(id)
    }

    async fn create_child_table(&mut self, ddl: &ChildTableDdl) -> Result<()> {
        let state = self.state.lock();
        if !state.tables.contains(ddl.parent()) {
            return Execution {
                message: format!("unknown parent table '{}'", ddl.parent()),
            }
            .fail();
        }
        if state.tables.contains(ddl.name()) || self.pending_tables.iter().any(|t| t == ddl.name())
        {
            return Execution {
                message: format!("table '{}' already exists", ddl.name()),
            }
            .fail();
        }
        drop(state);
        self.pending_tables.push(ddl.name().to_string());
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        // Re-validate under the lock: another transaction may have
        // committed colliding values since insert_partition ran.
        if let Some((_, values)) = &self.pending_partition {
            state.check_rules(values)?;
        }
        if let Some((id, values)) = self.pending_partition.take() {
            debug!(id = %id, "committing partition row");
            state.partitions.insert(id, values);
        }
        for table in self.pending_tables.drain(..) {
            state.tables.insert(table);
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for MemBackend {
    type Txn = MemTransaction;

    async fn begin(&self) -> Result<MemTransaction> {
        Ok(MemTransaction {
            state: Arc::clone(&self.state),
            pending_partition: None,
            pending_tables: Vec::new(),
        })
    }

    async fn find_partition(
        &self,
        _parent_table: &str,
        conditions: &[MatchCondition],
    ) -> Result<Option<PartitionRecord>> {
        let state = self.state.lock();
        for (id, values) in &state.partitions {
            if conditions.iter().all(|c| matches_condition(values, c)) {
                return Ok(Some(PartitionRecord {
                    id: *id,
                    values: values.clone(),
                }));
            }
        }
        Ok(None)
    }

    async fn init_catalog(&self, spec: &CatalogSpec) -> Result<()> {
        let mut state = self.state.lock();
        if spec.force {
            *state = State::default();
        }
        if !state.initialized {
            state.rules = spec.uniqueness_rules.clone();
            state.tables.insert(spec.parent_table.clone());
            state.initialized = true;
        }
        Ok(())
    }

    async fn column_type(&self, _parent_table: &str, column: &str) -> Result<Option<ColumnType>> {
        Ok(self.state.lock().column_types.get(column).copied())
    }
}
