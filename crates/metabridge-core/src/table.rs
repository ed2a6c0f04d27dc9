//! Warehouse tables, their fixed column layouts and projected rows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::WarehouseConfig;
use crate::defaults;

/// SQL type family of a column, used for parameter casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn text(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Text,
    }
}

const fn int(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Integer,
    }
}

const fn ts(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Timestamp,
    }
}

const ONTOLOGY_COLUMNS: &[Column] = &[
    int("c_hlevel"),
    text("c_fullname"),
    text("c_name"),
    text("c_synonym_cd"),
    text("c_visualattributes"),
    int("c_totalnum"),
    text("c_basecode"),
    text("c_metadataxml"),
    text("c_facttablecolumn"),
    text("c_tablename"),
    text("c_columnname"),
    text("c_columndatatype"),
    text("c_operator"),
    text("c_dimcode"),
    text("c_comment"),
    text("c_tooltip"),
    text("m_applied_path"),
    ts("update_date"),
    ts("download_date"),
    ts("import_date"),
    text("sourcesystem_cd"),
    text("valuetype_cd"),
    text("m_exclusion_cd"),
    text("c_path"),
    text("c_symbol"),
];

const TABLE_ACCESS_COLUMNS: &[Column] = &[
    text("c_table_cd"),
    text("c_table_name"),
    text("c_protected_access"),
    text("c_ontology_protection"),
    int("c_hlevel"),
    text("c_fullname"),
    text("c_name"),
    text("c_synonym_cd"),
    text("c_visualattributes"),
    int("c_totalnum"),
    text("c_basecode"),
    text("c_metadataxml"),
    text("c_facttablecolumn"),
    text("c_dimtablename"),
    text("c_columnname"),
    text("c_columndatatype"),
    text("c_operator"),
    text("c_dimcode"),
    text("c_comment"),
    text("c_tooltip"),
    ts("c_entry_date"),
    ts("c_change_date"),
    text("c_status_cd"),
    text("valuetype_cd"),
];

const CONCEPT_COLUMNS: &[Column] = &[
    text("concept_path"),
    text("concept_cd"),
    text("name_char"),
    text("concept_blob"),
    ts("update_date"),
    ts("download_date"),
    ts("import_date"),
    text("sourcesystem_cd"),
    int("upload_id"),
];

const MODIFIER_COLUMNS: &[Column] = &[
    text("modifier_path"),
    text("modifier_cd"),
    text("name_char"),
    text("modifier_blob"),
    ts("update_date"),
    ts("download_date"),
    ts("import_date"),
    text("sourcesystem_cd"),
    int("upload_id"),
];

/// One of the four load targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTable {
    Ontology,
    TableAccess,
    ConceptDimension,
    ModifierDimension,
}

impl TargetTable {
    /// All targets in load order.
    pub const ALL: [TargetTable; 4] = [
        TargetTable::Ontology,
        TargetTable::TableAccess,
        TargetTable::ConceptDimension,
        TargetTable::ModifierDimension,
    ];

    /// Fixed column list; staged and inserted in this order.
    pub fn columns(self) -> &'static [Column] {
        match self {
            Self::Ontology => ONTOLOGY_COLUMNS,
            Self::TableAccess => TABLE_ACCESS_COLUMNS,
            Self::ConceptDimension => CONCEPT_COLUMNS,
            Self::ModifierDimension => MODIFIER_COLUMNS,
        }
    }

    pub fn column_index(self, name: &str) -> Option<usize> {
        self.columns().iter().position(|c| c.name == name)
    }

    pub fn schema(self, warehouse: &WarehouseConfig) -> &str {
        match self {
            Self::Ontology | Self::TableAccess => &warehouse.meta_schema,
            Self::ConceptDimension | Self::ModifierDimension => &warehouse.data_schema,
        }
    }

    pub fn table_name(self, warehouse: &WarehouseConfig) -> &str {
        match self {
            Self::Ontology => &warehouse.ontology_table,
            Self::TableAccess => &warehouse.table_access_table,
            Self::ConceptDimension => "concept_dimension",
            Self::ModifierDimension => "modifier_dimension",
        }
    }

    /// `schema.table`
    pub fn qualified_name(self, warehouse: &WarehouseConfig) -> String {
        format!("{}.{}", self.schema(warehouse), self.table_name(warehouse))
    }

    /// Column carrying the source scope.
    pub fn source_column(self) -> &'static str {
        match self {
            Self::TableAccess => "c_table_cd",
            _ => "sourcesystem_cd",
        }
    }
}

impl fmt::Display for TargetTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ontology => write!(f, "ontology"),
            Self::TableAccess => write!(f, "table_access"),
            Self::ConceptDimension => write!(f, "concept_dimension"),
            Self::ModifierDimension => write!(f, "modifier_dimension"),
        }
    }
}

/// A projected cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Null,
    Text(String),
    /// Replaced by the load wall-clock time.
    LoadTime,
}

impl Field {
    pub fn text(value: impl Into<String>) -> Self {
        Field::Text(value.into())
    }

    /// Empty strings become NULL.
    pub fn opt(value: Option<impl Into<String>>) -> Self {
        match value.map(Into::into) {
            Some(v) if !v.is_empty() => Field::Text(v),
            _ => Field::Null,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Field::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Staged string form: NULL is empty, load time is the sentinel.
    pub fn to_staged(&self) -> &str {
        match self {
            Field::Null => "",
            Field::Text(v) => v,
            Field::LoadTime => defaults::LOAD_TIME_SENTINEL,
        }
    }

    /// Inverse of [`to_staged`](Self::to_staged).
    pub fn from_staged(value: &str) -> Self {
        match value {
            "" => Field::Null,
            defaults::LOAD_TIME_SENTINEL => Field::LoadTime,
            v => Field::Text(v.to_string()),
        }
    }
}

/// One row, fields in the table's column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub fields: Vec<Field>,
}

impl Row {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Field of a named column.
    pub fn get(&self, table: TargetTable, column: &str) -> Option<&Field> {
        table.column_index(column).and_then(|i| self.fields.get(i))
    }

    pub fn set(&mut self, table: TargetTable, column: &str, value: Field) -> bool {
        match table.column_index(column) {
            Some(i) if i < self.fields.len() => {
                self.fields[i] = value;
                true
            }
            _ => false,
        }
    }
}

/// Projected rows grouped by target table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowBatches {
    tables: BTreeMap<TargetTable, Vec<Row>>,
}

impl RowBatches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, table: TargetTable, row: Row) {
        self.tables.entry(table).or_default().push(row);
    }

    pub fn rows(&self, table: TargetTable) -> &[Row] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows_mut(&mut self, table: TargetTable) -> &mut Vec<Row> {
        self.tables.entry(table).or_default()
    }

    /// Concatenate another batch set, table by table.
    pub fn merge(&mut self, other: RowBatches) {
        for (table, rows) in other.tables {
            self.tables.entry(table).or_default().extend(rows);
        }
    }

    pub fn len(&self, table: TargetTable) -> usize {
        self.rows(table).len()
    }

    pub fn total(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Row counts per table, zero entries included.
    pub fn counts(&self) -> BTreeMap<TargetTable, u64> {
        TargetTable::ALL
            .iter()
            .map(|t| (*t, self.len(*t) as u64))
            .collect()
    }
}
