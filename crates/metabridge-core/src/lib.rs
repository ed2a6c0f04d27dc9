//! # metabridge-core
//!
//! Ontology node model, tree projection and import orchestration.
//!
//! An ontology is fetched from an [`OntologySource`] into an arena
//! [`OntologyTree`], projected into per-table [`RowBatches`] and handed to a
//! [`WarehouseLoader`] for a source-scoped replace.

pub mod builder;
pub mod config;
pub mod defaults;
pub mod derive;
pub mod error;
pub mod identifier;
pub mod import;
pub mod labels;
pub mod loader;
pub mod locks;
pub mod logging;
pub mod memory;
pub mod names;
pub mod node;
pub mod projection;
pub mod source;
pub mod staging;
pub mod table;
pub mod tree;
pub mod variant;

// Re-export commonly used types at crate root
pub use builder::{BuildOutcome, TreeBuilder};
pub use config::{AppConfig, ConfigError, PathConfig, ReconcilePolicy, WarehouseConfig};
pub use derive::{collapse_separator, short_hash};
pub use error::{Error, Result};
pub use identifier::{escape_like, validate_identifier};
pub use import::{fetch_trees, Fetched, ImportReport, Importer};
pub use labels::TaggedValues;
pub use loader::{FlushReport, LoadReport, TableLoadStats, WarehouseLoader};
pub use locks::{SourceLease, SourceLocks};
pub use node::{ChildRef, Datatype, Node, NodeAttributes, NodeId, NodeType};
pub use projection::{project_tree, Projection};
pub use source::OntologySource;
pub use staging::{read_staged, write_staged};
pub use table::{Column, ColumnKind, Field, Row, RowBatches, TargetTable};
pub use tree::OntologyTree;
pub use variant::{NotationVariant, VariantKind};
