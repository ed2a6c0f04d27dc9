//! Structured logging field names for metabridge.
//!
//! All crates use these constants so log aggregation can query the same
//! field across the fetch, projection and load stages.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Import or load aborted |
//! | WARN  | Degraded but continuing (node rejected, width not reconciled, value trimmed) |
//! | INFO  | Lifecycle events: import start/finish, commit, rollback |
//! | DEBUG | Decision points, per-node derivations |
//! | TRACE | Per-row iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID of one import run (UUIDv7).
pub const RUN_ID: &str = "run_id";

/// Subsystem originating the log event.
/// Values: "core", "db", "sparql", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "builder", "projector", "loader", "reconcile"
pub const COMPONENT: &str = "component";

/// Logical operation name.
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Source scope tag of the import.
pub const SOURCE_ID: &str = "source_id";

/// URI of the ontology node being processed.
pub const NODE_URI: &str = "node_uri";

/// Warehouse table affected.
pub const DB_TABLE: &str = "db_table";

/// Warehouse column affected.
pub const DB_COLUMN: &str = "db_column";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows produced or written.
pub const ROW_COUNT: &str = "row_count";

/// Number of nodes in a built tree.
pub const NODE_COUNT: &str = "node_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_are_distinct() {
        let fields = [
            RUN_ID, SUBSYSTEM, COMPONENT, OPERATION, SOURCE_ID, NODE_URI, DB_TABLE, DB_COLUMN,
            DURATION_MS, ROW_COUNT, NODE_COUNT, ERROR_MSG,
        ];
        let unique: HashSet<_> = fields.iter().collect();
        assert_eq!(unique.len(), fields.len());
    }
}
