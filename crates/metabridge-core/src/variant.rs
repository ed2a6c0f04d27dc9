//! Notation fan-out.
//!
//! A node with two or more notations is projected once for itself and once
//! per notation, each notation becoming a synthetic leaf below the node. When
//! the node also has real children the notation leaves are grouped under an
//! extra `MULTI` container so their paths cannot collide with the children.

use crate::node::NodeId;
use crate::tree::OntologyTree;

/// What a [`NotationVariant`] stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantKind {
    /// Synthetic grouping segment; never carries a code.
    MultiContainer,
    /// A real notation at `index` of the owner's variant list.
    Notation { index: usize, code: String, tag: String },
}

/// Path-level override of an owning node for one notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotationVariant {
    pub owner: NodeId,
    pub kind: VariantKind,
    pub element_path: String,
    pub hierarchy_level: i32,
    pub visual_attribute: &'static str,
}

impl NotationVariant {
    /// The notation code, `None` for the container.
    pub fn code(&self) -> Option<&str> {
        match &self.kind {
            VariantKind::Notation { code, .. } => Some(code),
            VariantKind::MultiContainer => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, VariantKind::MultiContainer)
    }
}

impl OntologyTree {
    /// Notation variants of a node; empty unless it has two or more notations.
    ///
    /// Indices count the container first when there is one, so the real
    /// notations of a node with children are numbered from 1.
    pub fn notation_variants(&self, id: NodeId) -> Vec<NotationVariant> {
        let node = self.node(id);
        if node.notations.len() < 2 {
            return Vec::new();
        }

        let sep = self.paths().separator.as_str();
        let multi = self.paths().multi_marker.as_str();
        let base_path = self.element_path(id);
        let base_level = self.hierarchy_level(id);
        let with_container = node.has_children();

        let mut variants = Vec::with_capacity(node.notations.len() + 1);
        if with_container {
            variants.push(NotationVariant {
                owner: id,
                kind: VariantKind::MultiContainer,
                element_path: format!("{base_path}{multi}{sep}"),
                hierarchy_level: base_level + 1,
                visual_attribute: "MH",
            });
        }

        let offset = usize::from(with_container);
        for (i, (code, tag)) in node.notations.iter().enumerate() {
            let index = i + offset;
            let (element_path, hierarchy_level) = if with_container {
                (
                    format!("{base_path}{multi}{sep}{index}{sep}"),
                    base_level + 2,
                )
            } else {
                (format!("{base_path}{index}{sep}"), base_level + 1)
            };
            variants.push(NotationVariant {
                owner: id,
                kind: VariantKind::Notation {
                    index,
                    code: code.to_string(),
                    tag: tag.to_string(),
                },
                element_path,
                hierarchy_level,
                visual_attribute: "LH",
            });
        }
        variants
    }
}
