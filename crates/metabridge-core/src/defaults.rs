//! Centralized default constants for metabridge.
//!
//! Configuration falls back to these values; tests reference them directly.

// =============================================================================
// PATHS
// =============================================================================

/// Separator between path segments in warehouse paths.
pub const PATH_SEPARATOR: &str = "\\";

/// First segment of every concept root path.
pub const PATH_PREFIX: &str = "i2b2";

/// Synthetic segment separating notation leaves from real children.
pub const MULTI_MARKER: &str = "MULTI";

/// Display status marking a node hidden in the warehouse UI.
pub const HIDDEN_SENTINEL: &str = "i2b2hidden";

/// Applied path of every non-modifier node.
pub const APPLIED_PATH_WILDCARD: &str = "@";

/// Prefix of table-access identifiers (`{prefix}_{source}_{hash}`).
pub const TABLE_CODE_PREFIX: &str = "i2b2";

/// Number of characters kept from the encoded path digest.
pub const SHORT_HASH_LEN: usize = 8;

// =============================================================================
// WAREHOUSE
// =============================================================================

/// Schema holding the ontology and table-access tables.
pub const META_SCHEMA: &str = "i2b2metadata";

/// Schema holding the concept and modifier dimension tables.
pub const DATA_SCHEMA: &str = "i2b2demodata";

/// Name of the ontology/hierarchy table.
pub const ONTOLOGY_TABLE: &str = "i2b2";

/// Name of the table-access table.
pub const TABLE_ACCESS_TABLE: &str = "table_access";

/// Suffix appended to values cut down to their column width.
pub const TRIM_SUFFIX: &str = "...";

/// Staged value replaced with the load wall-clock time.
pub const LOAD_TIME_SENTINEL: &str = "current_timestamp";

/// Format of node fetch timestamps and load timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S.0";

/// Default database URL when neither config nor `DATABASE_URL` provide one.
pub const DATABASE_URL: &str = "postgres://localhost/i2b2";

// =============================================================================
// SOURCES
// =============================================================================

/// Timeout for a single SPARQL request (seconds).
pub const SPARQL_TIMEOUT_SECS: u64 = 60;

/// Prefix of staged CSV file names.
pub const STAGING_FILE_PREFIX: &str = "meta";

/// Staging directory when none is configured.
pub const STAGING_DIR: &str = "/var/tmp/metabridge";
