//! # metabridge-db
//!
//! PostgreSQL side of metabridge.
//!
//! This crate provides:
//! - Connection pool management
//! - Column width reconciliation against the live warehouse schema
//! - Value trimming and source tagging of projected rows
//! - [`PgWarehouseLoader`], the transactional source-scoped replace
//!
//! ## Example
//!
//! ```rust,ignore
//! use metabridge_db::{create_pool, PgWarehouseLoader};
//!
//! let pool = create_pool(&config.database_url, &config.pool).await?;
//! let loader = PgWarehouseLoader::new(pool, config.warehouse.clone(), "i2b2")?;
//! let report = loader.load(&batches, &["dzl".to_string()], &lease).await?;
//! ```

pub mod loader;
pub mod pool;
pub mod reconcile;
pub mod sql;
pub mod trim;

// Always compiled so integration tests (in tests/) can use it.
pub mod test_fixtures;

pub use loader::PgWarehouseLoader;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use reconcile::{reconcile, Reconciliation, WidthLimits};
pub use trim::{inject_source, trim_row, trim_value};
