//! Identifier validation for configured schema, table and column names.
//!
//! Warehouse identifiers come from configuration and are spliced into SQL
//! text (they cannot be bound as parameters), so every one of them passes
//! through [`validate_identifier`] first.

use crate::{Error, Result};

/// PostgreSQL identifier length limit.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Validate a PostgreSQL identifier (schema, table or column name).
///
/// Identifiers must:
/// - Not be empty
/// - Not exceed 63 characters
/// - Contain only ASCII alphanumerics and underscores
/// - Not start with a digit
/// - Not be a reserved system schema or a dangerous keyword
///
/// # Examples
///
/// ```
/// use metabridge_core::validate_identifier;
///
/// assert!(validate_identifier("i2b2metadata").is_ok());
/// assert!(validate_identifier("concept_dimension").is_ok());
/// assert!(validate_identifier("1table").is_err());
/// assert!(validate_identifier("").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Config("Identifier cannot be empty".to_string()));
    }

    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(Error::Config(format!(
            "Identifier exceeds {} character limit: {} characters",
            MAX_IDENTIFIER_LEN,
            name.len()
        )));
    }

    if let Some(first) = name.chars().next() {
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::Config(format!(
                "Identifier must start with a letter or underscore, found: '{}'",
                first
            )));
        }
    }

    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(Error::Config(format!(
                "Identifier '{}' contains invalid character: '{}'",
                name, ch
            )));
        }
    }

    let lowercase = name.to_lowercase();
    const RESERVED: &[&str] = &[
        "pg_catalog",
        "information_schema",
        "pg_toast",
        "select",
        "insert",
        "update",
        "delete",
        "drop",
        "create",
        "alter",
        "grant",
        "revoke",
        "truncate",
    ];

    if RESERVED.contains(&lowercase.as_str()) {
        return Err(Error::Config(format!(
            "Identifier '{}' is a reserved SQL keyword",
            name
        )));
    }

    Ok(())
}

/// Escape LIKE wildcard characters (`%`, `_`, `\`) in a literal prefix.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
