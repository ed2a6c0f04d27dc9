//! In-memory source and loader for deterministic testing.
//!
//! ## Usage
//!
//! ```rust
//! use metabridge_core::memory::InMemorySource;
//! use metabridge_core::OntologySource;
//!
//! # tokio_test_block(async {
//! let source = InMemorySource::new()
//!     .with_node("urn:root", "Root", &[])
//!     .with_node("urn:leaf", "Leaf", &[("Q1", "en")])
//!     .with_children("urn:root", &[("urn:leaf", "concept")]);
//!
//! let children = source.children("urn:root").await.unwrap();
//! assert_eq!(children[0].uri, "urn:leaf");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::labels::TaggedValues;
use crate::loader::{FlushReport, LoadReport, TableLoadStats, WarehouseLoader};
use crate::locks::SourceLease;
use crate::node::{ChildRef, NodeAttributes};
use crate::source::OntologySource;
use crate::table::{RowBatches, TargetTable};
use crate::{Error, Result};

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A recorded source request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCall {
    pub operation: &'static str,
    pub uri: String,
}

#[derive(Debug, Clone, Default)]
struct SourceData {
    attributes: HashMap<String, NodeAttributes>,
    children: HashMap<String, Vec<ChildRef>>,
    top: Vec<ChildRef>,
    failing: Vec<String>,
}

/// Ontology held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    data: Arc<SourceData>,
    call_log: Arc<Mutex<Vec<SourceCall>>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with an English pref label equal to `name`.
    pub fn with_node(self, uri: &str, name: &str, notations: &[(&str, &str)]) -> Self {
        let attrs = NodeAttributes {
            name: name.to_string(),
            pref_labels: TaggedValues::new().with(name, "en"),
            notations: notations.iter().copied().collect(),
            ..Default::default()
        };
        self.with_attributes(uri, attrs)
    }

    pub fn with_attributes(mut self, uri: &str, attrs: NodeAttributes) -> Self {
        Arc::make_mut(&mut self.data)
            .attributes
            .insert(uri.to_string(), attrs);
        self
    }

    /// Set the ordered `(uri, type)` children of `uri`.
    pub fn with_children(mut self, uri: &str, children: &[(&str, &str)]) -> Self {
        let refs = children
            .iter()
            .map(|(u, t)| ChildRef::new(*u, *t))
            .collect();
        Arc::make_mut(&mut self.data)
            .children
            .insert(uri.to_string(), refs);
        self
    }

    pub fn with_top_elements(mut self, top: &[(&str, &str)]) -> Self {
        Arc::make_mut(&mut self.data).top = top.iter().map(|(u, t)| ChildRef::new(*u, *t)).collect();
        self
    }

    /// Make every request for `uri` fail with a fetch error.
    pub fn fail_on(mut self, uri: &str) -> Self {
        Arc::make_mut(&mut self.data).failing.push(uri.to_string());
        self
    }

    /// All requests so far, in order.
    pub fn calls(&self) -> Vec<SourceCall> {
        guard(&self.call_log).clone()
    }

    fn record(&self, operation: &'static str, uri: &str) -> Result<()> {
        guard(&self.call_log).push(SourceCall {
            operation,
            uri: uri.to_string(),
        });
        if self.data.failing.iter().any(|f| f == uri) {
            return Err(Error::Fetch(format!("{} failed for {}", operation, uri)));
        }
        Ok(())
    }
}

#[async_trait]
impl OntologySource for InMemorySource {
    async fn top_elements(&self) -> Result<Vec<ChildRef>> {
        self.record("top_elements", "")?;
        Ok(self.data.top.clone())
    }

    async fn children(&self, uri: &str) -> Result<Vec<ChildRef>> {
        self.record("children", uri)?;
        Ok(self.data.children.get(uri).cloned().unwrap_or_default())
    }

    async fn attributes(&self, uri: &str) -> Result<NodeAttributes> {
        self.record("attributes", uri)?;
        self.data
            .attributes
            .get(uri)
            .cloned()
            .ok_or_else(|| Error::Fetch(format!("no such node: {}", uri)))
    }
}

/// A recorded loader request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderCall {
    Load {
        source_ids: Vec<String>,
        batches: RowBatches,
    },
    Flush {
        source_ids: Vec<String>,
    },
}

/// Loader that records what it is given.
#[derive(Debug, Clone, Default)]
pub struct RecordingLoader {
    calls: Arc<Mutex<Vec<LoaderCall>>>,
    fail: bool,
}

impl RecordingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call with a load transaction error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<LoaderCall> {
        guard(&self.calls).clone()
    }

    /// Batches of the most recent load.
    pub fn last_batches(&self) -> Option<RowBatches> {
        guard(&self.calls).iter().rev().find_map(|c| match c {
            LoaderCall::Load { batches, .. } => Some(batches.clone()),
            LoaderCall::Flush { .. } => None,
        })
    }
}

#[async_trait]
impl WarehouseLoader for RecordingLoader {
    async fn load(
        &self,
        batches: &RowBatches,
        source_ids: &[String],
        lease: &SourceLease,
    ) -> Result<LoadReport> {
        lease.ensure_covers(source_ids)?;
        guard(&self.calls).push(LoaderCall::Load {
            source_ids: source_ids.to_vec(),
            batches: batches.clone(),
        });
        if self.fail {
            return Err(Error::LoadTransaction("recording loader set to fail".to_string()));
        }

        let tables = TargetTable::ALL
            .iter()
            .map(|t| {
                (
                    *t,
                    TableLoadStats {
                        inserted: batches.len(*t) as u64,
                        ..Default::default()
                    },
                )
            })
            .collect();
        Ok(LoadReport {
            tables,
            reconcile_errors: Vec::new(),
        })
    }

    async fn flush(&self, source_ids: &[String], lease: &SourceLease) -> Result<FlushReport> {
        lease.ensure_covers(source_ids)?;
        guard(&self.calls).push(LoaderCall::Flush {
            source_ids: source_ids.to_vec(),
        });
        if self.fail {
            return Err(Error::LoadTransaction("recording loader set to fail".to_string()));
        }
        Ok(FlushReport::default())
    }
}
