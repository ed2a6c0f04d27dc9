//! Column width reconciliation.
//!
//! Before a load, every configured column width is compared with the live
//! column definition and the column is altered when they differ. The
//! resulting effective widths drive value trimming.

use std::collections::{BTreeMap, HashMap};

use metabridge_core::{Error, ReconcilePolicy, Result, TargetTable, WarehouseConfig};
use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::sql::{alter_width_sql, COLUMN_WIDTHS_SQL};

/// Effective character limits per table and column.
#[derive(Debug, Clone, Default)]
pub struct WidthLimits {
    tables: BTreeMap<TargetTable, HashMap<String, u32>>,
}

impl WidthLimits {
    pub fn for_table(&self, table: TargetTable) -> &HashMap<String, u32> {
        static EMPTY: std::sync::OnceLock<HashMap<String, u32>> = std::sync::OnceLock::new();
        self.tables
            .get(&table)
            .unwrap_or_else(|| EMPTY.get_or_init(HashMap::new))
    }

    pub fn insert(&mut self, table: TargetTable, column: impl Into<String>, width: u32) {
        self.tables
            .entry(table)
            .or_default()
            .insert(column.into(), width);
    }
}

/// Widths in effect plus the columns that could not be altered.
#[derive(Debug, Default)]
pub struct Reconciliation {
    pub limits: WidthLimits,
    pub errors: Vec<Error>,
}

/// Live `varchar`/`char` widths of a table; unbounded columns map to `None`.
pub async fn live_widths(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<HashMap<String, Option<u32>>> {
    let rows: Vec<(String, Option<i32>)> = sqlx::query_as(COLUMN_WIDTHS_SQL)
        .bind(schema)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(Error::Database)?;

    Ok(rows
        .into_iter()
        .map(|(column, width)| (column, width.and_then(|w| u32::try_from(w).ok())))
        .collect())
}

/// Which configured columns need an alter, given the live definition.
///
/// Returns `(column, desired, live)` for every differing column, and an error
/// entry for configured columns the table does not have.
pub fn plan_changes(
    desired: &BTreeMap<String, u32>,
    live: &HashMap<String, Option<u32>>,
) -> (Vec<(String, u32, Option<u32>)>, Vec<String>) {
    let mut changes = Vec::new();
    let mut missing = Vec::new();
    for (column, width) in desired {
        match live.get(column) {
            Some(current) if *current == Some(*width) => {}
            Some(current) => changes.push((column.clone(), *width, *current)),
            None => missing.push(column.clone()),
        }
    }
    (changes, missing)
}

/// Reconcile every target table and collect the effective limits.
///
/// Under [`ReconcilePolicy::Abort`] the first failure is returned as an
/// error; otherwise failures are logged and the live width stays in effect.
pub async fn reconcile(pool: &PgPool, warehouse: &WarehouseConfig) -> Result<Reconciliation> {
    let mut out = Reconciliation::default();

    for table in TargetTable::ALL {
        let schema = table.schema(warehouse);
        let name = table.table_name(warehouse);
        let live = live_widths(pool, schema, name).await?;
        if live.is_empty() {
            return Err(Error::SchemaReconciliation(format!(
                "table {}.{} not found",
                schema, name
            )));
        }

        for (column, width) in &live {
            if let Some(w) = width {
                out.limits.insert(table, column.clone(), *w);
            }
        }

        let Some(desired) = warehouse.column_widths.get(name) else {
            continue;
        };
        let (changes, missing) = plan_changes(desired, &live);

        for column in missing {
            let err = Error::SchemaReconciliation(format!(
                "{}.{} has no column {}",
                schema, name, column
            ));
            fail(warehouse.on_reconcile_failure, &mut out, err)?;
        }

        for (column, width, current) in changes {
            let sql = alter_width_sql(schema, name, &column, width);
            debug!(
                subsystem = "db",
                component = "reconcile",
                db_table = %table,
                db_column = %column,
                from = ?current,
                to = width,
                "Altering column width"
            );
            match sqlx::query(&sql).execute(pool).await {
                Ok(_) => {
                    info!(
                        subsystem = "db",
                        component = "reconcile",
                        db_table = %table,
                        db_column = %column,
                        width,
                        "Column width reconciled"
                    );
                    out.limits.insert(table, column, width);
                }
                Err(e) => {
                    let err = Error::SchemaReconciliation(format!(
                        "{}.{}.{} to varchar({}): {}",
                        schema, name, column, width, e
                    ));
                    fail(warehouse.on_reconcile_failure, &mut out, err)?;
                }
            }
        }
    }
    Ok(out)
}

fn fail(policy: ReconcilePolicy, out: &mut Reconciliation, err: Error) -> Result<()> {
    match policy {
        ReconcilePolicy::Abort => Err(err),
        ReconcilePolicy::Proceed => {
            warn!(
                subsystem = "db",
                component = "reconcile",
                error = %err,
                "Width not reconciled, trimming against live width"
            );
            out.errors.push(err);
            Ok(())
        }
    }
}
