//! Application configuration.
//!
//! Configuration is loaded from a YAML file and then overridden by
//! environment variables:
//! - `METABRIDGE_CONFIG` - path of the YAML file (when no explicit path is given)
//! - `DATABASE_URL` - warehouse connection string
//! - `METABRIDGE_SPARQL_TIMEOUT_SECS` - SPARQL request timeout
//! - `METABRIDGE_STAGING_DIR` - staging directory
//!
//! # Example
//!
//! ```yaml
//! database_url: postgres://i2b2:secret@db/i2b2
//! paths:
//!   separator: "\\"
//!   prefix: i2b2
//! warehouse:
//!   column_widths:
//!     i2b2:
//!       c_name: 2000
//!       c_tooltip: 900
//!   on_reconcile_failure: proceed
//! sources:
//!   dzl:
//!     endpoint: https://data.dzl.de/fuseki/cometar_live/query
//! prefixes:
//!   "http://data.dzl.de/ont/dwh#": "dwh:"
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::defaults;
use crate::identifier::validate_identifier;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl From<ConfigError> for crate::Error {
    fn from(e: ConfigError) -> Self {
        crate::Error::Config(e.to_string())
    }
}

/// Path encoding settings shared by every derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Segment separator (`SEP`).
    pub separator: String,
    /// First segment of concept root paths (`PREFIX`).
    pub prefix: String,
    /// Synthetic container segment for nodes with children and several notations.
    pub multi_marker: String,
    /// Display status value that hides a node.
    pub hidden_sentinel: String,
    /// Applied path of concepts and collections.
    pub applied_path_wildcard: String,
    /// First component of table-access identifiers.
    pub table_code_prefix: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            separator: defaults::PATH_SEPARATOR.to_string(),
            prefix: defaults::PATH_PREFIX.to_string(),
            multi_marker: defaults::MULTI_MARKER.to_string(),
            hidden_sentinel: defaults::HIDDEN_SENTINEL.to_string(),
            applied_path_wildcard: defaults::APPLIED_PATH_WILDCARD.to_string(),
            table_code_prefix: defaults::TABLE_CODE_PREFIX.to_string(),
        }
    }
}

impl PathConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.separator.is_empty() {
            return Err(ConfigError::Validation(
                "paths.separator cannot be empty".to_string(),
            ));
        }
        if self.multi_marker.is_empty() {
            return Err(ConfigError::Validation(
                "paths.multi_marker cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// What to do when a column cannot be altered to its configured width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReconcilePolicy {
    /// Log and continue, trimming against the last known live widths.
    #[default]
    Proceed,
    /// Abort the load before the transaction starts.
    Abort,
}

/// Target warehouse layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// Schema of the ontology and table-access tables.
    pub meta_schema: String,
    /// Schema of the concept and modifier dimension tables.
    pub data_schema: String,
    /// Ontology/hierarchy table name.
    pub ontology_table: String,
    /// Table-access table name.
    pub table_access_table: String,
    /// Desired varchar widths, keyed by table name then column name.
    pub column_widths: BTreeMap<String, BTreeMap<String, u32>>,
    pub on_reconcile_failure: ReconcilePolicy,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            meta_schema: defaults::META_SCHEMA.to_string(),
            data_schema: defaults::DATA_SCHEMA.to_string(),
            ontology_table: defaults::ONTOLOGY_TABLE.to_string(),
            table_access_table: defaults::TABLE_ACCESS_TABLE.to_string(),
            column_widths: BTreeMap::new(),
            on_reconcile_failure: ReconcilePolicy::default(),
        }
    }
}

impl WarehouseConfig {
    /// Validate every identifier and width.
    pub fn validate(&self) -> ConfigResult<()> {
        for ident in [
            &self.meta_schema,
            &self.data_schema,
            &self.ontology_table,
            &self.table_access_table,
        ] {
            validate_identifier(ident).map_err(|e| ConfigError::Validation(e.to_string()))?;
        }
        for (table, columns) in &self.column_widths {
            validate_identifier(table).map_err(|e| ConfigError::Validation(e.to_string()))?;
            for (column, width) in columns {
                validate_identifier(column)
                    .map_err(|e| ConfigError::Validation(e.to_string()))?;
                if *width == 0 {
                    return Err(ConfigError::Validation(format!(
                        "column width for {}.{} must be positive",
                        table, column
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Connection pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 4,
            min_connections: 1,
            connect_timeout_secs: 30,
        }
    }
}

/// One configured ontology source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    /// SPARQL query endpoint.
    pub endpoint: String,
    /// Explicit roots as `(uri, type)`; empty means every top element.
    #[serde(default)]
    pub roots: Vec<RootSetting>,
}

/// A configured root node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootSetting {
    pub uri: String,
    #[serde(rename = "type")]
    pub node_type: String,
}

/// SPARQL client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SparqlSettings {
    pub timeout_secs: u64,
}

impl Default for SparqlSettings {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::SPARQL_TIMEOUT_SECS,
        }
    }
}

/// Staging file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    pub directory: PathBuf,
    pub file_prefix: String,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(defaults::STAGING_DIR),
            file_prefix: defaults::STAGING_FILE_PREFIX.to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub pool: PoolSettings,
    pub paths: PathConfig,
    pub warehouse: WarehouseConfig,
    pub sources: BTreeMap<String, SourceSettings>,
    /// Namespace → short prefix, applied in order to derive node names.
    pub prefixes: IndexMap<String, String>,
    pub staging: StagingConfig,
    pub sparql: SparqlSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: defaults::DATABASE_URL.to_string(),
            pool: PoolSettings::default(),
            paths: PathConfig::default(),
            warehouse: WarehouseConfig::default(),
            sources: BTreeMap::new(),
            prefixes: IndexMap::new(),
            staging: StagingConfig::default(),
            sparql: SparqlSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load from an explicit path, else `METABRIDGE_CONFIG`, else defaults;
    /// then apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env::var("METABRIDGE_CONFIG").ok().map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration");
                Self::from_file(&path)?
            }
            None => {
                debug!("No configuration file given, using defaults");
                Self::default()
            }
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML configuration file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration text.
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(secs) = env::var("METABRIDGE_SPARQL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.sparql.timeout_secs = secs;
        }
        if let Ok(dir) = env::var("METABRIDGE_STAGING_DIR") {
            self.staging.directory = PathBuf::from(dir);
        }
    }

    /// Validate all sections.
    pub fn validate(&self) -> ConfigResult<()> {
        self.paths.validate()?;
        self.warehouse.validate()?;
        for (id, source) in &self.sources {
            if !source.endpoint.starts_with("http://") && !source.endpoint.starts_with("https://")
            {
                return Err(ConfigError::Validation(format!(
                    "source '{}' endpoint must start with http:// or https://, got: {}",
                    id, source.endpoint
                )));
            }
        }
        Ok(())
    }

    /// Look up a configured source.
    pub fn source(&self, source_id: &str) -> ConfigResult<&SourceSettings> {
        self.sources
            .get(source_id)
            .ok_or_else(|| ConfigError::UnknownSource(source_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.paths.separator, "\\");
        assert_eq!(config.warehouse.ontology_table, "i2b2");
        assert_eq!(config.warehouse.on_reconcile_failure, ReconcilePolicy::Proceed);
    }

    #[test]
    fn test_from_yaml_partial_sections() {
        let yaml = r#"
paths:
  separator: "/"
warehouse:
  column_widths:
    i2b2:
      c_tooltip: 255
  on_reconcile_failure: abort
sources:
  dzl:
    endpoint: https://data.dzl.de/fuseki/cometar_live/query
    roots:
      - uri: http://data.dzl.de/ont/dwh#Patientdata
        type: concept
prefixes:
  "http://data.dzl.de/ont/dwh#": "dwh:"
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.paths.separator, "/");
        assert_eq!(config.paths.prefix, "i2b2");
        assert_eq!(config.warehouse.column_widths["i2b2"]["c_tooltip"], 255);
        assert_eq!(config.warehouse.on_reconcile_failure, ReconcilePolicy::Abort);
        assert_eq!(config.source("dzl").unwrap().roots[0].node_type, "concept");
        assert_eq!(config.prefixes["http://data.dzl.de/ont/dwh#"], "dwh:");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_source() {
        let config = AppConfig::default();
        assert!(matches!(
            config.source("nope"),
            Err(ConfigError::UnknownSource(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_separator() {
        let mut config = AppConfig::default();
        config.paths.separator.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_width() {
        let mut config = AppConfig::default();
        config
            .warehouse
            .column_widths
            .entry("i2b2".to_string())
            .or_default()
            .insert("c_name".to_string(), 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unsafe_table_name() {
        let mut config = AppConfig::default();
        config.warehouse.ontology_table = "i2b2;drop".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_endpoint() {
        let yaml = "sources:\n  x:\n    endpoint: ftp://example.org\n";
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert!(config.validate().is_err());
    }
}
