//! Arena-backed ontology tree.

use serde::{Deserialize, Serialize};

use crate::config::PathConfig;
use crate::node::{Node, NodeId, NodeType};

/// One rooted ontology tree.
///
/// Nodes are owned by the arena and linked through [`NodeId`]s; a node is
/// only ever added below an existing parent, so the structure is acyclic and
/// every node except the root has exactly one parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyTree {
    nodes: Vec<Node>,
    paths: PathConfig,
}

impl OntologyTree {
    /// Create a tree from its root node.
    pub fn new(mut root: Node, paths: PathConfig) -> Self {
        root.parent = None;
        root.children.clear();
        Self {
            nodes: vec![root],
            paths,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn paths(&self) -> &PathConfig {
        &self.paths
    }

    /// Append `node` as the last child of `parent`.
    ///
    /// A node below a modifier is forced to modifier type.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        if self.node(parent).node_type == NodeType::Modifier {
            node.node_type = NodeType::Modifier;
        }
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Node by id.
    ///
    /// # Panics
    /// When `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<&Node> {
        self.node(id).parent.map(|p| self.node(p))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `uri` occurs on the chain from `id` up to the root.
    pub fn has_ancestor_uri(&self, id: NodeId, uri: &str) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = self.node(cur);
            if node.uri == uri {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// Node ids in pre-order (own node before children, siblings in insertion order).
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        order
    }
}
