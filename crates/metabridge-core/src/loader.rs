//! Warehouse loader abstraction and load reports.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::locks::SourceLease;
use crate::table::{RowBatches, TargetTable};
use crate::Result;

/// Per-table outcome of a load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableLoadStats {
    /// Rows removed by the scoped delete.
    pub deleted: u64,
    /// Rows inserted.
    pub inserted: u64,
    /// Rows dropped on a uniqueness conflict.
    pub skipped_duplicates: u64,
    /// Rows with at least one value cut to its column width.
    pub trimmed_rows: u64,
}

/// Outcome of a committed load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub tables: BTreeMap<TargetTable, TableLoadStats>,
    /// Columns that could not be altered to their configured width.
    pub reconcile_errors: Vec<String>,
}

impl LoadReport {
    pub fn inserted(&self) -> BTreeMap<TargetTable, u64> {
        self.tables
            .iter()
            .map(|(t, s)| (*t, s.inserted))
            .collect()
    }
}

/// Outcome of a committed flush.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub deleted: BTreeMap<TargetTable, u64>,
}

/// Scoped replace of warehouse rows.
///
/// Both operations are all-or-nothing for the given sources and must only be
/// called under a lease covering every one of them.
#[async_trait]
pub trait WarehouseLoader: Send + Sync {
    /// Replace every row of `source_ids` with `batches`.
    async fn load(
        &self,
        batches: &RowBatches,
        source_ids: &[String],
        lease: &SourceLease,
    ) -> Result<LoadReport>;

    /// Delete every row of `source_ids`.
    async fn flush(&self, source_ids: &[String], lease: &SourceLease) -> Result<FlushReport>;
}
