//! Staged row batches on disk.
//!
//! Each table of a source is written to
//! `{dir}/{prefix}.{source_id}.{schema}.{table}.csv` with a header row holding
//! the table's fixed column list. Empty fields stand for NULL and the literal
//! `current_timestamp` for the load time.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::WarehouseConfig;
use crate::table::{Field, Row, RowBatches, TargetTable};
use crate::{Error, Result};

/// File a table's rows are staged in.
pub fn staged_file(
    dir: &Path,
    prefix: &str,
    source_id: &str,
    table: TargetTable,
    warehouse: &WarehouseConfig,
) -> PathBuf {
    dir.join(format!(
        "{}.{}.{}.{}.csv",
        prefix,
        source_id,
        table.schema(warehouse),
        table.table_name(warehouse)
    ))
}

/// Write every table of `batches`, empty tables included.
pub fn write_staged(
    dir: &Path,
    prefix: &str,
    source_id: &str,
    batches: &RowBatches,
    warehouse: &WarehouseConfig,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(TargetTable::ALL.len());

    for table in TargetTable::ALL {
        let path = staged_file(dir, prefix, source_id, table, warehouse);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(table.columns().iter().map(|c| c.name))?;
        for row in batches.rows(table) {
            if row.fields.len() != table.columns().len() {
                return Err(Error::Staging(format!(
                    "{} row has {} fields, expected {}",
                    table,
                    row.fields.len(),
                    table.columns().len()
                )));
            }
            writer.write_record(row.fields.iter().map(Field::to_staged))?;
        }
        writer.flush()?;
        debug!(
            subsystem = "core",
            component = "staging",
            db_table = %table,
            row_count = batches.len(table),
            path = %path.display(),
            "Staged table"
        );
        written.push(path);
    }

    info!(
        subsystem = "core",
        component = "staging",
        op = "write_staged",
        source_id,
        row_count = batches.total(),
        "Staging files written"
    );
    Ok(written)
}

/// Read back the batches written by [`write_staged`].
///
/// A missing file is an error, as is a header that differs from the table's
/// column list.
pub fn read_staged(
    dir: &Path,
    prefix: &str,
    source_id: &str,
    warehouse: &WarehouseConfig,
) -> Result<RowBatches> {
    let mut batches = RowBatches::new();

    for table in TargetTable::ALL {
        let path = staged_file(dir, prefix, source_id, table, warehouse);
        let mut reader = csv::Reader::from_path(&path)?;

        let expected: Vec<&str> = table.columns().iter().map(|c| c.name).collect();
        let header = reader.headers()?;
        if header.iter().ne(expected.iter().copied()) {
            return Err(Error::Staging(format!(
                "{}: header does not match the {} column layout",
                path.display(),
                table
            )));
        }

        for record in reader.records() {
            let record = record?;
            batches.push(table, Row::new(record.iter().map(Field::from_staged).collect()));
        }
    }

    info!(
        subsystem = "core",
        component = "staging",
        op = "read_staged",
        source_id,
        row_count = batches.total(),
        "Staging files read"
    );
    Ok(batches)
}
