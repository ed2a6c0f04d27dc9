//! Tree materialisation from an [`OntologySource`].
//!
//! The walk is depth-first and sequential so siblings keep the order the
//! source returned them in. A fetch failure anywhere abandons the whole tree;
//! a child whose type cannot be resolved is dropped together with its subtree
//! and reported in [`BuildOutcome::rejected`].

use chrono::{Local, NaiveDateTime};
use futures::future::BoxFuture;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::PathConfig;
use crate::node::{ChildRef, Node, NodeId, NodeType};
use crate::source::OntologySource;
use crate::tree::OntologyTree;
use crate::{Error, Result};

/// A built tree plus the subtrees left out of it.
#[derive(Debug)]
pub struct BuildOutcome {
    pub tree: OntologyTree,
    pub rejected: Vec<Error>,
}

/// Builds trees for one source scope.
pub struct TreeBuilder<'a, S: OntologySource + ?Sized> {
    source: &'a S,
    source_id: &'a str,
    paths: &'a PathConfig,
}

impl<'a, S: OntologySource + ?Sized> TreeBuilder<'a, S> {
    pub fn new(source: &'a S, source_id: &'a str, paths: &'a PathConfig) -> Self {
        Self {
            source,
            source_id,
            paths,
        }
    }

    /// Build the tree below `root`.
    ///
    /// Errors when the root itself has no resolvable type or when any fetch
    /// fails.
    pub async fn build(&self, root: &ChildRef) -> Result<BuildOutcome> {
        let start = Instant::now();
        let root_node = self.fetch_node(root, None).await?;
        let mut tree = OntologyTree::new(root_node, self.paths.clone());
        let mut rejected = Vec::new();

        let root_id = tree.root();
        self.build_children(&mut tree, root_id, &mut rejected)
            .await
            .map_err(|e| {
                warn!(
                    subsystem = "core",
                    component = "builder",
                    source_id = self.source_id,
                    node_uri = %root.uri,
                    error = %e,
                    "Tree abandoned"
                );
                e
            })?;

        info!(
            subsystem = "core",
            component = "builder",
            op = "build",
            source_id = self.source_id,
            node_uri = %root.uri,
            node_count = tree.len(),
            rejected = rejected.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Tree built"
        );
        Ok(BuildOutcome { tree, rejected })
    }

    async fn fetch_node(&self, child: &ChildRef, parent_type: Option<NodeType>) -> Result<Node> {
        let attrs = self.source.attributes(&child.uri).await?;
        Node::new(
            child.uri.clone(),
            child.node_type.as_deref(),
            parent_type,
            attrs,
            self.source_id,
            fetch_time(),
        )
    }

    fn build_children<'b>(
        &'b self,
        tree: &'b mut OntologyTree,
        parent: NodeId,
        rejected: &'b mut Vec<Error>,
    ) -> BoxFuture<'b, Result<()>> {
        Box::pin(async move {
            let uri = tree.node(parent).uri.clone();
            let children = self.source.children(&uri).await?;
            debug!(
                subsystem = "core",
                component = "builder",
                node_uri = %uri,
                children = children.len(),
                "Children fetched"
            );

            for child in &children {
                if tree.has_ancestor_uri(parent, &child.uri) {
                    warn!(
                        subsystem = "core",
                        component = "builder",
                        node_uri = %child.uri,
                        "Node is its own ancestor, skipping"
                    );
                    rejected.push(Error::Validation(format!(
                        "cycle at {} below {}",
                        child.uri, uri
                    )));
                    continue;
                }

                let parent_type = tree.node(parent).node_type;
                match self.fetch_node(child, Some(parent_type)).await {
                    Ok(node) => {
                        let id = tree.add_child(parent, node);
                        self.build_children(tree, id, rejected).await?;
                    }
                    Err(e @ Error::Validation(_)) => {
                        warn!(
                            subsystem = "core",
                            component = "builder",
                            node_uri = %child.uri,
                            error = %e,
                            "Node rejected, skipping subtree"
                        );
                        rejected.push(e);
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(())
        })
    }
}

fn fetch_time() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySource;

    fn source() -> InMemorySource {
        InMemorySource::new()
            .with_node("urn:root", "Root", &[])
            .with_node("urn:a", "A", &[("A1", "en")])
            .with_node("urn:b", "B", &[])
            .with_node("urn:b1", "B1", &[])
            .with_children("urn:root", &[("urn:b", "concept"), ("urn:a", "concept")])
            .with_children("urn:b", &[("urn:b1", "modifier")])
    }

    #[tokio::test]
    async fn test_build_keeps_source_order() {
        let src = source();
        let paths = PathConfig::default();
        let outcome = TreeBuilder::new(&src, "dzl", &paths)
            .build(&ChildRef::new("urn:root", "concept"))
            .await
            .unwrap();

        let tree = outcome.tree;
        assert!(outcome.rejected.is_empty());
        assert_eq!(tree.len(), 4);
        let uris: Vec<_> = tree
            .preorder()
            .into_iter()
            .map(|id| tree.node(id).uri.clone())
            .collect();
        assert_eq!(uris, vec!["urn:root", "urn:b", "urn:b1", "urn:a"]);
        assert_eq!(tree.node(tree.root()).source_id, "dzl");
    }

    #[tokio::test]
    async fn test_untyped_child_subtree_skipped() {
        let src = InMemorySource::new()
            .with_node("urn:root", "Root", &[])
            .with_node("urn:x", "X", &[])
            .with_node("urn:x1", "X1", &[])
            .with_node("urn:y", "Y", &[])
            .with_children("urn:root", &[("urn:x", "thing"), ("urn:y", "concept")])
            .with_children("urn:x", &[("urn:x1", "concept")]);
        let paths = PathConfig::default();
        let outcome = TreeBuilder::new(&src, "dzl", &paths)
            .build(&ChildRef::new("urn:root", "concept"))
            .await
            .unwrap();

        assert_eq!(outcome.tree.len(), 2);
        assert_eq!(outcome.rejected.len(), 1);
        assert!(!src.calls().iter().any(|c| c.uri == "urn:x1"));
    }

    #[tokio::test]
    async fn test_untyped_root_is_error() {
        let src = InMemorySource::new().with_node("urn:root", "Root", &[]);
        let paths = PathConfig::default();
        let result = TreeBuilder::new(&src, "dzl", &paths)
            .build(&ChildRef::untyped("urn:root"))
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_fetch_failure_abandons_tree() {
        let src = source().fail_on("urn:b1");
        let paths = PathConfig::default();
        let result = TreeBuilder::new(&src, "dzl", &paths)
            .build(&ChildRef::new("urn:root", "concept"))
            .await;
        assert!(matches!(result, Err(Error::Fetch(_))));
    }

    #[tokio::test]
    async fn test_modifier_inheritance_during_build() {
        let src = InMemorySource::new()
            .with_node("urn:root", "Root", &[])
            .with_node("urn:m", "M", &[])
            .with_node("urn:c", "C", &[])
            .with_children("urn:root", &[("urn:m", "modifier")])
            .with_children("urn:m", &[("urn:c", "concept")]);
        let paths = PathConfig::default();
        let tree = TreeBuilder::new(&src, "dzl", &paths)
            .build(&ChildRef::new("urn:root", "concept"))
            .await
            .unwrap()
            .tree;
        let c = tree.node(tree.root()).children()[0];
        let c = tree.node(c).children()[0];
        assert_eq!(tree.node(c).node_type, NodeType::Modifier);
    }

    #[tokio::test]
    async fn test_cycle_is_rejected() {
        let src = InMemorySource::new()
            .with_node("urn:root", "Root", &[])
            .with_node("urn:a", "A", &[])
            .with_children("urn:root", &[("urn:a", "concept")])
            .with_children("urn:a", &[("urn:root", "concept")]);
        let paths = PathConfig::default();
        let outcome = TreeBuilder::new(&src, "dzl", &paths)
            .build(&ChildRef::new("urn:root", "concept"))
            .await
            .unwrap();
        assert_eq!(outcome.tree.len(), 2);
        assert_eq!(outcome.rejected.len(), 1);
    }
}
