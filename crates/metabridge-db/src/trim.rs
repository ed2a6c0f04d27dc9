//! Width trimming and source-tag injection of rows about to be inserted.

use std::collections::HashMap;

use metabridge_core::defaults::{SHORT_HASH_LEN, TRIM_SUFFIX};
use metabridge_core::{escape_like, Field, Row, TargetTable, WarehouseConfig};
use tracing::{debug, trace};

/// Cut `value` to `limit` characters, the last three being `...`.
///
/// Columns narrower than the suffix get a plain cut. Returns `None` when the
/// value already fits.
pub fn trim_value(value: &str, limit: u32) -> Option<String> {
    let limit = limit as usize;
    if value.chars().count() <= limit {
        return None;
    }
    if limit < TRIM_SUFFIX.len() {
        return Some(value.chars().take(limit).collect());
    }
    let keep = limit - TRIM_SUFFIX.len();
    let mut trimmed: String = value.chars().take(keep).collect();
    trimmed.push_str(TRIM_SUFFIX);
    Some(trimmed)
}

/// Trim every text field of `row` to its column limit.
///
/// Returns whether any field changed.
pub fn trim_row(table: TargetTable, row: &mut Row, limits: &HashMap<String, u32>) -> bool {
    let mut modified = false;
    for (column, field) in table.columns().iter().zip(row.fields.iter_mut()) {
        let Some(limit) = limits.get(column.name) else {
            continue;
        };
        if let Field::Text(value) = field {
            if let Some(trimmed) = trim_value(value, *limit) {
                trace!(
                    subsystem = "db",
                    component = "trim",
                    db_table = %table,
                    db_column = column.name,
                    limit,
                    "Value trimmed"
                );
                *value = trimmed;
                modified = true;
            }
        }
    }
    modified
}

/// Make the row carry its source scope.
///
/// Rows already tagged with one of `source_ids` keep their tag; anything
/// else is tagged with the first id. Table-access identifiers are forced
/// into the `{code_prefix}_{source}_{hash}` shape and their table name is
/// filled in.
pub fn inject_source(
    table: TargetTable,
    row: &mut Row,
    source_ids: &[String],
    code_prefix: &str,
    warehouse: &WarehouseConfig,
) {
    let Some(default_source) = source_ids.first() else {
        return;
    };

    match table {
        TargetTable::TableAccess => {
            let current = row
                .get(table, "c_table_cd")
                .and_then(Field::as_text)
                .unwrap_or("")
                .to_string();
            let scoped = source_ids
                .iter()
                .any(|s| is_scoped_code(&current, code_prefix, s));
            if !scoped {
                let code = format!(
                    "{}{}",
                    table_code_prefix(code_prefix, default_source),
                    code_hash(&current)
                );
                debug!(subsystem = "db", component = "inject", code = %code, "Scoping table-access code");
                row.set(table, "c_table_cd", Field::Text(code));
            }
            if matches!(row.get(table, "c_table_name"), Some(Field::Null) | None) {
                row.set(
                    table,
                    "c_table_name",
                    Field::text(warehouse.ontology_table.as_str()),
                );
            }
        }
        _ => {
            let tagged = row
                .get(table, "sourcesystem_cd")
                .and_then(Field::as_text)
                .is_some_and(|s| source_ids.iter().any(|id| id == s));
            if !tagged {
                row.set(table, "sourcesystem_cd", Field::text(default_source.as_str()));
            }
        }
    }
}

/// `{prefix}_{source}_`, the start of every table-access code of a source.
pub fn table_code_prefix(code_prefix: &str, source_id: &str) -> String {
    format!("{}_{}_", code_prefix, source_id)
}

/// Whether `code` is exactly `{prefix}_{source}_` followed by a short hash.
pub fn is_scoped_code(code: &str, code_prefix: &str, source_id: &str) -> bool {
    code.strip_prefix(&table_code_prefix(code_prefix, source_id))
        .is_some_and(|hash| hash.chars().count() == SHORT_HASH_LEN)
}

/// LIKE pattern matching the table-access codes of one source and no other.
///
/// The hash is matched by exactly [`SHORT_HASH_LEN`] single-character
/// wildcards, so source `a` never matches the codes of source `a_b`.
pub fn table_code_pattern(code_prefix: &str, source_id: &str) -> String {
    format!(
        "{}{}",
        escape_like(&table_code_prefix(code_prefix, source_id)),
        "_".repeat(SHORT_HASH_LEN)
    )
}

/// Trailing hash of a table-access code, or the whole code when shorter.
fn code_hash(code: &str) -> &str {
    match code.char_indices().rev().nth(SHORT_HASH_LEN - 1) {
        Some((start, _)) => &code[start..],
        None => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ta_row(code: &str) -> Row {
        let mut fields = vec![Field::Null; TargetTable::TableAccess.columns().len()];
        fields[0] = Field::text(code);
        Row::new(fields)
    }

    #[test]
    fn test_trim_520_to_255() {
        let description = "x".repeat(520);
        let trimmed = trim_value(&description, 255).unwrap();
        assert_eq!(trimmed.chars().count(), 255);
        assert!(trimmed.starts_with(&"x".repeat(252)));
        assert!(trimmed.ends_with("..."));
    }

    #[test]
    fn test_trim_fits_untouched() {
        assert_eq!(trim_value("short", 255), None);
        assert_eq!(trim_value(&"y".repeat(255), 255), None);
    }

    #[test]
    fn test_trim_never_exceeds_narrow_columns() {
        assert_eq!(trim_value("abcdef", 3).unwrap(), "...");
        assert_eq!(trim_value("abcdef", 2).unwrap(), "ab");
        assert_eq!(trim_value("abcdef", 0).unwrap(), "");
    }

    #[test]
    fn test_trim_counts_characters_not_bytes() {
        let value = "ä".repeat(10);
        assert_eq!(trim_value(&value, 10), None);
        assert_eq!(trim_value(&value, 5).unwrap(), "ää...");
    }

    #[test]
    fn test_trim_row_flags_modification() {
        let table = TargetTable::ConceptDimension;
        let mut row = Row::new(vec![Field::Null; table.columns().len()]);
        row.set(table, "name_char", Field::text("a long name"));
        row.set(table, "concept_cd", Field::text("X"));

        let mut limits = HashMap::new();
        limits.insert("name_char".to_string(), 6);
        limits.insert("concept_cd".to_string(), 50);

        assert!(trim_row(table, &mut row, &limits));
        assert_eq!(row.get(table, "name_char"), Some(&Field::text("a l...")));
        assert!(!trim_row(table, &mut row, &limits));
    }

    #[test]
    fn test_inject_sourcesystem() {
        let table = TargetTable::Ontology;
        let mut row = Row::new(vec![Field::Null; table.columns().len()]);
        inject_source(table, &mut row, &["dzl".to_string()], "i2b2", &WarehouseConfig::default());
        assert_eq!(row.get(table, "sourcesystem_cd"), Some(&Field::text("dzl")));
    }

    #[test]
    fn test_inject_keeps_matching_tag() {
        let table = TargetTable::ModifierDimension;
        let mut row = Row::new(vec![Field::Null; table.columns().len()]);
        row.set(table, "sourcesystem_cd", Field::text("b"));
        let ids = ["a".to_string(), "b".to_string()];
        inject_source(table, &mut row, &ids, "i2b2", &WarehouseConfig::default());
        assert_eq!(row.get(table, "sourcesystem_cd"), Some(&Field::text("b")));
    }

    #[test]
    fn test_inject_table_access_code() {
        let table = TargetTable::TableAccess;
        let cfg = WarehouseConfig::default();

        let mut scoped = ta_row("i2b2_dzl_AbCdEf12");
        inject_source(table, &mut scoped, &["dzl".to_string()], "i2b2", &cfg);
        assert_eq!(scoped.fields[0], Field::text("i2b2_dzl_AbCdEf12"));
        assert_eq!(scoped.get(table, "c_table_name"), Some(&Field::text("i2b2")));

        let mut foreign = ta_row("AbCdEf12");
        inject_source(table, &mut foreign, &["dzl".to_string()], "i2b2", &cfg);
        assert_eq!(foreign.fields[0], Field::text("i2b2_dzl_AbCdEf12"));

        let mut other_source = ta_row("i2b2_a_b_AbCdEf12");
        inject_source(table, &mut other_source, &["a".to_string()], "i2b2", &cfg);
        assert_eq!(other_source.fields[0], Field::text("i2b2_a_AbCdEf12"));
    }

    #[test]
    fn test_scoped_code_needs_exact_shape() {
        assert!(is_scoped_code("i2b2_a_AbCdEf12", "i2b2", "a"));
        assert!(!is_scoped_code("i2b2_a_b_AbCdEf12", "i2b2", "a"));
        assert!(is_scoped_code("i2b2_a_b_AbCdEf12", "i2b2", "a_b"));
        assert!(!is_scoped_code("i2b2_a_AbCd", "i2b2", "a"));
    }

    #[test]
    fn test_table_code_pattern_is_exact_width() {
        let hash = "_".repeat(8);
        assert_eq!(table_code_pattern("i2b2", "a"), format!("i2b2\\_a\\_{hash}"));
        assert_eq!(
            table_code_pattern("i2b2", "a_b"),
            format!("i2b2\\_a\\_b\\_{hash}")
        );
    }
}
