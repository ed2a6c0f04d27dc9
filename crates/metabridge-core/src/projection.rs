//! Tree → row projection.
//!
//! Walks a tree in pre-order and emits, per node:
//! - one ontology row, plus one per notation variant;
//! - one table-access row when the node is a root;
//! - dimension rows for its notations (none for containers and collections).

use tracing::{debug, warn};

use crate::node::{Node, NodeId, NodeType};
use crate::table::{Field, Row, RowBatches, TargetTable};
use crate::tree::OntologyTree;
use crate::variant::NotationVariant;
use crate::Error;

/// Rows of one or more trees plus the non-fatal problems met on the way.
#[derive(Debug, Default)]
pub struct Projection {
    pub rows: RowBatches,
    pub issues: Vec<Error>,
}

impl Projection {
    /// Concatenate another projection.
    pub fn merge(&mut self, other: Projection) {
        self.rows.merge(other.rows);
        self.issues.extend(other.issues);
    }
}

/// Path-dependent part of an ontology or dimension row.
struct Placement<'a> {
    path: &'a str,
    level: i32,
    visual: &'a str,
    code: Option<&'a str>,
}

/// Project one tree.
pub fn project_tree(tree: &OntologyTree) -> Projection {
    let mut out = Projection::default();
    for id in tree.preorder() {
        project_node(tree, id, &mut out);
    }
    debug!(
        subsystem = "core",
        component = "projection",
        op = "project_tree",
        node_count = tree.len(),
        row_count = out.rows.total(),
        "Tree projected"
    );
    out
}

fn project_node(tree: &OntologyTree, id: NodeId, out: &mut Projection) {
    let node = tree.node(id);
    let path = tree.element_path(id);
    let level = tree.hierarchy_level(id);
    let visual = tree.visual_attribute(id);
    let applied = tree.applied_path(id);
    let variants = tree.notation_variants(id);

    let own = Placement {
        path: &path,
        level,
        visual: &visual,
        code: node.base_notation(),
    };
    out.rows
        .push(TargetTable::Ontology, ontology_row(node, &own, &applied));
    for variant in &variants {
        out.rows.push(
            TargetTable::Ontology,
            ontology_row(node, &variant_placement(variant), &applied),
        );
    }

    if let Some(code) = tree.table_code(id) {
        out.rows
            .push(TargetTable::TableAccess, table_access_row(node, &code, &own));
    }

    if node.notations.is_empty() {
        return;
    }
    let dimension = match node.node_type {
        NodeType::Concept => TargetTable::ConceptDimension,
        NodeType::Modifier => TargetTable::ModifierDimension,
        NodeType::Collection => {
            warn!(
                subsystem = "core",
                component = "projection",
                op = "project_node",
                node_uri = %node.uri,
                notations = node.notations.len(),
                "Collection carries notations, skipping dimension rows"
            );
            out.issues.push(Error::ProjectionInconsistency(format!(
                "collection {} has {} notation(s)",
                node.uri,
                node.notations.len()
            )));
            return;
        }
    };

    if variants.is_empty() {
        out.rows.push(dimension, dimension_row(node, &own));
    } else {
        for variant in variants.iter().filter(|v| !v.is_container()) {
            out.rows
                .push(dimension, dimension_row(node, &variant_placement(variant)));
        }
    }
}

fn variant_placement(variant: &NotationVariant) -> Placement<'_> {
    Placement {
        path: &variant.element_path,
        level: variant.hierarchy_level,
        visual: variant.visual_attribute,
        code: variant.code(),
    }
}

fn ontology_row(node: &Node, at: &Placement<'_>, applied_path: &str) -> Row {
    Row::new(vec![
        Field::text(at.level.to_string()), // c_hlevel
        Field::text(at.path), // c_fullname
        Field::text(node.row_name()), // c_name
        Field::text("N"), // c_synonym_cd
        Field::text(at.visual), // c_visualattributes
        Field::Null, // c_totalnum
        Field::opt(at.code), // c_basecode
        Field::opt(node.value_metadata_xml()), // c_metadataxml
        Field::text(node.fact_table_column()), // c_facttablecolumn
        Field::text(node.dimension_table()), // c_tablename
        Field::text(node.dimension_column()), // c_columnname
        Field::text("T"), // c_columndatatype
        Field::text("LIKE"), // c_operator
        Field::text(at.path), // c_dimcode
        Field::Null, // c_comment
        Field::opt(Some(node.description())), // c_tooltip
        Field::text(applied_path), // m_applied_path
        Field::LoadTime, // update_date
        Field::text(node.fetch_timestamp_text()), // download_date
        Field::LoadTime, // import_date
        Field::text(&node.source_id), // sourcesystem_cd
        Field::Null, // valuetype_cd
        Field::Null, // m_exclusion_cd
        Field::Null, // c_path
        Field::Null, // c_symbol
    ])
}

fn table_access_row(node: &Node, table_code: &str, at: &Placement<'_>) -> Row {
    Row::new(vec![
        Field::text(table_code), // c_table_cd
        Field::Null, // c_table_name, set by the loader
        Field::text("N"), // c_protected_access
        Field::Null, // c_ontology_protection
        Field::text("1"), // c_hlevel
        Field::text(at.path), // c_fullname
        // Same name as the root's ontology row so the catalog entry and the
        // tree agree; the pref label goes to the tooltip.
        Field::text(node.row_name()), // c_name
        Field::text("N"), // c_synonym_cd
        Field::text(at.visual), // c_visualattributes
        Field::Null, // c_totalnum
        Field::Null, // c_basecode
        Field::Null, // c_metadataxml
        Field::text("concept_cd"), // c_facttablecolumn
        Field::text("concept_dimension"), // c_dimtablename
        Field::text("concept_path"), // c_columnname
        Field::text("T"), // c_columndatatype
        Field::text("LIKE"), // c_operator
        Field::text(at.path), // c_dimcode
        Field::Null, // c_comment
        Field::opt(Some(node.pref_label())), // c_tooltip
        Field::LoadTime, // c_entry_date
        Field::LoadTime, // c_change_date
        Field::Null, // c_status_cd
        Field::Null, // valuetype_cd
    ])
}

fn dimension_row(node: &Node, at: &Placement<'_>) -> Row {
    Row::new(vec![
        Field::text(at.path), // *_path
        Field::opt(at.code), // *_cd
        Field::opt(Some(node.pref_label())), // name_char
        Field::Null, // *_blob
        Field::LoadTime, // update_date
        Field::text(node.fetch_timestamp_text()), // download_date
        Field::LoadTime, // import_date
        Field::text(&node.source_id), // sourcesystem_cd
        Field::Null, // upload_id
    ])
}
