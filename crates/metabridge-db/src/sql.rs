//! SQL text for the warehouse statements.
//!
//! Schema, table and column names cannot be bound as parameters; they come
//! from validated configuration or the fixed column layouts.

use metabridge_core::{ColumnKind, TargetTable, WarehouseConfig};

/// Parameter placeholder with the cast its column needs.
fn placeholder(index: usize, kind: ColumnKind) -> String {
    match kind {
        ColumnKind::Text => format!("${}", index),
        ColumnKind::Integer => format!("${}::integer", index),
        ColumnKind::Timestamp => format!("${}::timestamp", index),
    }
}

/// Insert of one row; uniqueness conflicts are skipped.
pub fn insert_sql(table: TargetTable, warehouse: &WarehouseConfig) -> String {
    let columns = table.columns();
    let names: Vec<&str> = columns.iter().map(|c| c.name).collect();
    let values: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| placeholder(i + 1, c.kind))
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT DO NOTHING",
        table.qualified_name(warehouse),
        names.join(", "),
        values.join(", ")
    )
}

/// Scoped delete. `$1` is a text array of source ids for the tables with a
/// `sourcesystem_cd` column, a LIKE pattern for the table-access table.
pub fn delete_sql(table: TargetTable, warehouse: &WarehouseConfig) -> String {
    match table {
        TargetTable::TableAccess => format!(
            "DELETE FROM {} WHERE c_table_cd LIKE $1 ESCAPE '\\'",
            table.qualified_name(warehouse)
        ),
        _ => format!(
            "DELETE FROM {} WHERE sourcesystem_cd = ANY($1)",
            table.qualified_name(warehouse)
        ),
    }
}

/// Live column widths of a table.
pub const COLUMN_WIDTHS_SQL: &str = "SELECT column_name::text, character_maximum_length::int4 \
     FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2";

/// Change a column to `varchar(width)`.
pub fn alter_width_sql(schema: &str, table: &str, column: &str, width: u32) -> String {
    format!(
        "ALTER TABLE {}.{} ALTER COLUMN {} TYPE varchar({})",
        schema, table, column, width
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sql_casts_and_conflict() {
        let sql = insert_sql(TargetTable::ConceptDimension, &WarehouseConfig::default());
        assert_eq!(
            sql,
            "INSERT INTO i2b2demodata.concept_dimension (concept_path, concept_cd, name_char, \
             concept_blob, update_date, download_date, import_date, sourcesystem_cd, upload_id) \
             VALUES ($1, $2, $3, $4, $5::timestamp, $6::timestamp, $7::timestamp, $8, $9::integer) \
             ON CONFLICT DO NOTHING"
        );
    }

    #[test]
    fn test_insert_sql_placeholder_count() {
        let sql = insert_sql(TargetTable::Ontology, &WarehouseConfig::default());
        assert!(sql.starts_with("INSERT INTO i2b2metadata.i2b2 (c_hlevel, c_fullname"));
        assert!(sql.contains("$1::integer"));
        assert!(sql.contains("$25"));
        assert!(!sql.contains("$26"));
    }

    #[test]
    fn test_delete_sql() {
        let cfg = WarehouseConfig::default();
        assert_eq!(
            delete_sql(TargetTable::Ontology, &cfg),
            "DELETE FROM i2b2metadata.i2b2 WHERE sourcesystem_cd = ANY($1)"
        );
        assert_eq!(
            delete_sql(TargetTable::TableAccess, &cfg),
            "DELETE FROM i2b2metadata.table_access WHERE c_table_cd LIKE $1 ESCAPE '\\'"
        );
    }

    #[test]
    fn test_alter_width_sql() {
        assert_eq!(
            alter_width_sql("i2b2metadata", "i2b2", "c_tooltip", 900),
            "ALTER TABLE i2b2metadata.i2b2 ALTER COLUMN c_tooltip TYPE varchar(900)"
        );
    }
}
