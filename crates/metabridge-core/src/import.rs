//! Import orchestration: fetch, project, load under a source lease.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::builder::TreeBuilder;
use crate::config::PathConfig;
use crate::loader::{FlushReport, LoadReport, WarehouseLoader};
use crate::locks::{SourceLease, SourceLocks};
use crate::node::ChildRef;
use crate::projection::{project_tree, Projection};
use crate::source::OntologySource;
use crate::table::{RowBatches, TargetTable};
use crate::Result;

/// Result of fetching and projecting every root of a source.
#[derive(Debug, Default)]
pub struct Fetched {
    pub trees: usize,
    pub projection: Projection,
}

/// Outcome of a completed import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub run_id: Uuid,
    pub source_id: String,
    pub trees: usize,
    pub rows_written: BTreeMap<TargetTable, u64>,
    /// Non-fatal problems: rejected nodes, projection issues, reconciliation failures.
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

/// Fetch and project the trees below `roots` of one source.
///
/// An empty `roots` list means every top element. Roots rejected as invalid
/// are recorded in the projection issues; fetch errors abort.
pub async fn fetch_trees<S: OntologySource + ?Sized>(
    source: &S,
    source_id: &str,
    roots: &[ChildRef],
    paths: &PathConfig,
) -> Result<Fetched> {
    let roots = if roots.is_empty() {
        let top = source.top_elements().await?;
        info!(
            subsystem = "core",
            component = "import",
            source_id,
            roots = top.len(),
            "Importing every top element"
        );
        top
    } else {
        roots.to_vec()
    };

    let builder = TreeBuilder::new(source, source_id, paths);
    let mut fetched = Fetched::default();
    for root in &roots {
        let outcome = match builder.build(root).await {
            Ok(outcome) => outcome,
            Err(e) if !e.is_fatal() => {
                warn!(
                    subsystem = "core",
                    component = "import",
                    source_id,
                    node_uri = %root.uri,
                    error = %e,
                    "Root rejected"
                );
                fetched.projection.issues.push(e);
                continue;
            }
            Err(e) => return Err(e),
        };
        let mut projection = project_tree(&outcome.tree);
        projection.issues.extend(outcome.rejected);
        fetched.projection.merge(projection);
        fetched.trees += 1;
    }
    Ok(fetched)
}

/// Runs imports and flushes of single sources.
pub struct Importer<S, L> {
    source: S,
    loader: L,
    locks: SourceLocks,
    paths: PathConfig,
}

impl<S: OntologySource, L: WarehouseLoader> Importer<S, L> {
    pub fn new(source: S, loader: L, locks: SourceLocks, paths: PathConfig) -> Self {
        Self {
            source,
            loader,
            locks,
            paths,
        }
    }

    pub fn locks(&self) -> &SourceLocks {
        &self.locks
    }

    /// Fetch and project the trees below `roots` (every top element when
    /// empty) without loading them.
    pub async fn fetch(&self, source_id: &str, roots: &[ChildRef]) -> Result<Fetched> {
        let _lease = self.locks.try_acquire(&[source_id])?;
        self.fetch_leased(source_id, roots).await
    }

    async fn fetch_leased(&self, source_id: &str, roots: &[ChildRef]) -> Result<Fetched> {
        fetch_trees(&self.source, source_id, roots, &self.paths).await
    }

    /// Fetch, project and load one source.
    pub async fn import_source(&self, source_id: &str, roots: &[ChildRef]) -> Result<ImportReport> {
        let start = Instant::now();
        let run_id = Uuid::now_v7();
        let lease = self.locks.try_acquire(&[source_id])?;
        info!(
            subsystem = "core",
            component = "import",
            op = "import_source",
            run_id = %run_id,
            source_id,
            "Import started"
        );

        let fetched = self.fetch_leased(source_id, roots).await?;
        let load = self
            .load_leased(&fetched.projection.rows, source_id, &lease)
            .await?;

        let mut errors: Vec<String> = fetched
            .projection
            .issues
            .iter()
            .map(ToString::to_string)
            .collect();
        errors.extend(load.reconcile_errors.iter().cloned());

        let report = ImportReport {
            run_id,
            source_id: source_id.to_string(),
            trees: fetched.trees,
            rows_written: load.inserted(),
            errors,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            subsystem = "core",
            component = "import",
            op = "import_source",
            run_id = %run_id,
            source_id,
            trees = report.trees,
            row_count = report.rows_written.values().sum::<u64>(),
            errors = report.errors.len(),
            duration_ms = report.duration_ms,
            "Import finished"
        );
        Ok(report)
    }

    /// Load previously projected rows of one source.
    pub async fn load_rows(&self, source_id: &str, rows: &RowBatches) -> Result<LoadReport> {
        let lease = self.locks.try_acquire(&[source_id])?;
        self.load_leased(rows, source_id, &lease).await
    }

    async fn load_leased(
        &self,
        rows: &RowBatches,
        source_id: &str,
        lease: &SourceLease,
    ) -> Result<LoadReport> {
        let ids = [source_id.to_string()];
        self.loader.load(rows, &ids, lease).await.map_err(|e| {
            error!(
                subsystem = "core",
                component = "import",
                source_id,
                error = %e,
                "Load failed"
            );
            e
        })
    }

    /// Delete every warehouse row of one source.
    pub async fn flush_source(&self, source_id: &str) -> Result<FlushReport> {
        let lease = self.locks.try_acquire(&[source_id])?;
        let report = self.loader.flush(&[source_id.to_string()], &lease).await?;
        info!(
            subsystem = "core",
            component = "import",
            op = "flush_source",
            source_id,
            row_count = report.deleted.values().sum::<u64>(),
            "Source flushed"
        );
        Ok(report)
    }
}
