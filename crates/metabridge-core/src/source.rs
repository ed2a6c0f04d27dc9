//! Ontology source abstraction.

use async_trait::async_trait;

use crate::node::{ChildRef, NodeAttributes};
use crate::Result;

/// Read access to an external ontology store.
///
/// Every failure is reported as [`Error::Fetch`](crate::Error::Fetch); the
/// builder never retries.
#[async_trait]
pub trait OntologySource: Send + Sync {
    /// Top-level elements of the ontology, in source order.
    async fn top_elements(&self) -> Result<Vec<ChildRef>>;

    /// Direct children of `uri`, in source order.
    async fn children(&self, uri: &str) -> Result<Vec<ChildRef>>;

    /// Descriptive attributes of `uri`.
    async fn attributes(&self, uri: &str) -> Result<NodeAttributes>;
}
