//! Position-dependent node attributes.
//!
//! Everything here is a pure function of the tree: path, hierarchy level,
//! visual attribute code, applied path and the short hash used for
//! table-access identifiers.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use sha1::{Digest, Sha1};

use crate::defaults::SHORT_HASH_LEN;
use crate::node::{NodeId, NodeType};
use crate::tree::OntologyTree;

/// Collapse every run of repeated separators into a single separator.
pub fn collapse_separator(path: &str, separator: &str) -> String {
    if separator.is_empty() {
        return path.to_string();
    }
    let doubled = separator.repeat(2);
    let mut out = path.to_string();
    while out.contains(&doubled) {
        out = out.replace(&doubled, separator);
    }
    out
}

/// Short stable identifier of a path.
///
/// SHA-1 of the path bytes, first 8 digest bytes, URL-safe base64, first 8
/// characters.
pub fn short_hash(path: &str) -> String {
    let digest = Sha1::digest(path.as_bytes());
    let encoded = URL_SAFE.encode(&digest[..SHORT_HASH_LEN]);
    encoded.chars().take(SHORT_HASH_LEN).collect()
}

impl OntologyTree {
    pub fn is_root(&self, id: NodeId) -> bool {
        self.node(id).parent().is_none()
    }

    /// Number of ancestors above `id`.
    pub fn ancestor_depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent();
        while let Some(p) = current {
            depth += 1;
            current = self.node(p).parent();
        }
        depth
    }

    /// Whether `id` is a modifier anchored below a non-modifier.
    fn is_root_modifier(&self, id: NodeId) -> bool {
        let node = self.node(id);
        match self.parent(id) {
            Some(parent) => {
                node.node_type == NodeType::Modifier && parent.node_type != NodeType::Modifier
            }
            None => false,
        }
    }

    /// Warehouse path of a node, e.g. `\i2b2\dwh:Root\dwh:Child\`.
    pub fn element_path(&self, id: NodeId) -> String {
        let paths = self.paths();
        let sep = paths.separator.as_str();
        let node = self.node(id);

        let raw = match node.parent() {
            None => format!("{sep}{}{sep}{}{sep}", paths.prefix, node.name),
            Some(_) if self.is_root_modifier(id) => format!("{sep}{}{sep}", node.name),
            Some(parent) => format!("{}{sep}{}{sep}", self.element_path(parent), node.name),
        };
        collapse_separator(&raw, sep)
    }

    /// Warehouse hierarchy level.
    ///
    /// Modifiers anchored on a concept start again at 1; other modifiers
    /// continue from their parent; everything else is `ancestor_depth + 2`.
    pub fn hierarchy_level(&self, id: NodeId) -> i32 {
        let node = self.node(id);
        match (node.node_type, node.parent()) {
            (NodeType::Modifier, Some(parent)) => match self.node(parent).node_type {
                NodeType::Concept => 1,
                NodeType::Modifier | NodeType::Collection => self.hierarchy_level(parent) + 1,
            },
            _ => self.ancestor_depth(id) as i32 + 2,
        }
    }

    /// Two-character visual attribute code.
    pub fn visual_attribute(&self, id: NodeId) -> String {
        let node = self.node(id);
        let modifier = node.is_modifier();

        let first = match node.node_type {
            NodeType::Collection => 'C',
            _ if node.has_children() => {
                if modifier {
                    'D'
                } else {
                    'F'
                }
            }
            _ if node.notations.len() <= 1 => {
                if modifier {
                    'R'
                } else {
                    'L'
                }
            }
            _ => 'M',
        };

        let hidden = node.display_status.as_deref() == Some(self.paths().hidden_sentinel.as_str());
        let second = if hidden { 'H' } else { 'A' };

        format!("{first}{second}")
    }

    /// Path pattern a modifier applies to; the wildcard for everything else.
    pub fn applied_path(&self, id: NodeId) -> String {
        let paths = self.paths();
        let node = self.node(id);
        if node.node_type != NodeType::Modifier {
            return paths.applied_path_wildcard.clone();
        }
        match node.parent() {
            Some(parent) if self.node(parent).node_type == NodeType::Modifier => {
                self.applied_path(parent)
            }
            Some(parent) => {
                let sep = paths.separator.as_str();
                collapse_separator(&format!("{}{sep}%", self.element_path(parent)), sep)
            }
            // A modifier without an anchor concept applies nowhere in particular.
            None => paths.applied_path_wildcard.clone(),
        }
    }

    /// Short hash of a root's path; `None` for non-roots.
    pub fn stable_short_hash(&self, id: NodeId) -> Option<String> {
        self.is_root(id)
            .then(|| short_hash(&self.element_path(id)))
    }

    /// Table-access identifier `{prefix}_{source}_{hash}` of a root node.
    pub fn table_code(&self, id: NodeId) -> Option<String> {
        let node = self.node(id);
        self.stable_short_hash(id).map(|hash| {
            format!(
                "{}_{}_{}",
                self.paths().table_code_prefix,
                node.source_id,
                hash
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathConfig;
    use crate::labels::TaggedValues;
    use crate::node::{Node, NodeAttributes};
    use chrono::NaiveDate;

    fn node(name: &str, ty: &str) -> Node {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let attrs = NodeAttributes {
            name: name.to_string(),
            ..Default::default()
        };
        Node::new(format!("urn:{name}"), Some(ty), None, attrs, "dzl", ts).unwrap()
    }

    /// root(concept) -> a(concept) -> m(modifier) -> m2(modifier)
    fn sample() -> (OntologyTree, NodeId, NodeId, NodeId) {
        let mut tree = OntologyTree::new(node("Root", "concept"), PathConfig::default());
        let a = tree.add_child(tree.root(), node("A", "concept"));
        let m = tree.add_child(a, node("M", "modifier"));
        let m2 = tree.add_child(m, node("M2", "modifier"));
        (tree, a, m, m2)
    }

    #[test]
    fn test_collapse_separator() {
        assert_eq!(collapse_separator("\\a\\\\b\\", "\\"), "\\a\\b\\");
        assert_eq!(collapse_separator("\\\\\\a", "\\"), "\\a");
        assert_eq!(collapse_separator("//a//b/", "/"), "/a/b/");
    }

    #[test]
    fn test_element_paths() {
        let (tree, a, m, m2) = sample();
        assert_eq!(tree.element_path(tree.root()), "\\i2b2\\Root\\");
        assert_eq!(tree.element_path(a), "\\i2b2\\Root\\A\\");
        assert_eq!(tree.element_path(m), "\\M\\");
        assert_eq!(tree.element_path(m2), "\\M\\M2\\");
    }

    #[test]
    fn test_child_path_extends_parent_path() {
        let (tree, a, _, m2) = sample();
        let parent = tree.element_path(tree.root());
        assert!(tree
            .element_path(a)
            .starts_with(parent.trim_end_matches('\\')));
        assert!(tree.element_path(m2).starts_with("\\M"));
    }

    #[test]
    fn test_hierarchy_levels() {
        let (tree, a, m, m2) = sample();
        assert_eq!(tree.hierarchy_level(tree.root()), 2);
        assert_eq!(tree.hierarchy_level(a), 3);
        assert_eq!(tree.hierarchy_level(m), 1);
        assert_eq!(tree.hierarchy_level(m2), 2);
    }

    #[test]
    fn test_modifier_below_collection_continues_level() {
        let mut tree = OntologyTree::new(node("Root", "concept"), PathConfig::default());
        let coll = tree.add_child(tree.root(), node("Coll", "collection"));
        let m = tree.add_child(coll, node("M", "modifier"));
        assert_eq!(tree.hierarchy_level(coll), 3);
        assert_eq!(tree.hierarchy_level(m), 4);
    }

    #[test]
    fn test_applied_paths() {
        let (tree, a, m, m2) = sample();
        assert_eq!(tree.applied_path(a), "@");
        assert_eq!(tree.applied_path(m), "\\i2b2\\Root\\A\\%");
        assert_eq!(tree.applied_path(m2), "\\i2b2\\Root\\A\\%");
    }

    #[test]
    fn test_visual_attributes() {
        let mut tree = OntologyTree::new(node("Root", "concept"), PathConfig::default());
        let coll = tree.add_child(tree.root(), node("Coll", "collection"));
        let leaf = tree.add_child(tree.root(), node("Leaf", "concept"));

        let mut multi = node("Multi", "concept");
        multi.notations = TaggedValues::new().with("A1", "en").with("B2", "de");
        let multi = tree.add_child(tree.root(), multi);

        let mut hidden = node("Hidden", "concept");
        hidden.display_status = Some("i2b2hidden".to_string());
        let hidden = tree.add_child(tree.root(), hidden);

        let m = tree.add_child(leaf, node("M", "modifier"));
        let m_leaf = tree.add_child(m, node("ML", "modifier"));

        assert_eq!(tree.visual_attribute(tree.root()), "FA");
        assert_eq!(tree.visual_attribute(coll), "CA");
        assert_eq!(tree.visual_attribute(leaf), "FA");
        assert_eq!(tree.visual_attribute(multi), "MA");
        assert_eq!(tree.visual_attribute(hidden), "LH");
        assert_eq!(tree.visual_attribute(m), "DA");
        assert_eq!(tree.visual_attribute(m_leaf), "RA");
    }

    #[test]
    fn test_short_hash_is_deterministic() {
        let h1 = short_hash("\\i2b2\\Root\\");
        let h2 = short_hash("\\i2b2\\Root\\");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 8);
        assert_ne!(h1, short_hash("\\i2b2\\Root2\\"));
        assert!(h1
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_table_code_only_for_root() {
        let (tree, a, _, _) = sample();
        let code = tree.table_code(tree.root()).unwrap();
        assert_eq!(
            code,
            format!("i2b2_dzl_{}", short_hash("\\i2b2\\Root\\"))
        );
        assert!(tree.table_code(a).is_none());
    }
}
