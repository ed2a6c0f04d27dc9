//! Ontology node model.
//!
//! A [`Node`] holds the attributes fetched for one ontology element. Nodes
//! live in an [`OntologyTree`](crate::tree::OntologyTree) arena and refer to
//! their parent and children by [`NodeId`]; every position-dependent value
//! (path, level, visual code) is derived from the tree, see [`crate::derive`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::defaults;
use crate::labels::TaggedValues;
use crate::{Error, Result};

/// Index of a node inside its tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Kind of ontology element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Concept,
    Modifier,
    Collection,
}

impl NodeType {
    /// Resolve the effective type of a node.
    ///
    /// Anything below a modifier is a modifier, whatever it declares.
    pub fn resolve(declared: Option<&str>, parent: Option<NodeType>) -> Result<NodeType> {
        if parent == Some(NodeType::Modifier) {
            return Ok(NodeType::Modifier);
        }
        match declared {
            Some(raw) => raw.parse(),
            None => Err(Error::Validation("node has no type".to_string())),
        }
    }
}

impl FromStr for NodeType {
    type Err = Error;

    /// Accepts `concept`, `modifier` and `collection` in any case, either bare
    /// or as the local name of a type URI (e.g. `http://www.w3.org/2004/02/skos/core#Collection`).
    fn from_str(s: &str) -> Result<Self> {
        let local = s
            .trim()
            .rsplit(['#', '/', ':'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match local.as_str() {
            "concept" => Ok(Self::Concept),
            "modifier" => Ok(Self::Modifier),
            "collection" => Ok(Self::Collection),
            _ => Err(Error::Validation(format!("unresolvable node type: '{}'", s))),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concept => write!(f, "concept"),
            Self::Modifier => write!(f, "modifier"),
            Self::Collection => write!(f, "collection"),
        }
    }
}

/// Value type of a leaf node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Datatype {
    Float,
    Integer,
    LargeString,
    String,
}

impl Datatype {
    /// Parse a source-supplied datatype synonym, case-insensitively.
    ///
    /// Returns `None` for anything not in the synonym table; callers treat
    /// that as "unset".
    pub fn parse(raw: &str) -> Option<Self> {
        let local = raw.trim().rsplit(['#', ':']).next().unwrap_or_default();
        match local.to_lowercase().as_str() {
            "int" | "integer" => Some(Self::Integer),
            "float" | "dec" | "decimal" => Some(Self::Float),
            "string" | "str" => Some(Self::String),
            "largestring" => Some(Self::LargeString),
            _ => None,
        }
    }

    /// Name used in the warehouse value metadata.
    pub fn pretty(self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::String => "String",
            Self::LargeString => "largeString",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

/// A `(uri, type)` pair as returned by child and top-element queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
    pub uri: String,
    /// Raw declared type; `None` when the source has none.
    pub node_type: Option<String>,
}

impl ChildRef {
    pub fn new(uri: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            node_type: Some(node_type.into()),
        }
    }

    pub fn untyped(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            node_type: None,
        }
    }
}

/// Descriptive attributes of one element, as fetched from the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributes {
    /// Prefix-mapped short name.
    pub name: String,
    pub pref_labels: TaggedValues,
    pub display_labels: TaggedValues,
    pub alt_labels: TaggedValues,
    pub descriptions: TaggedValues,
    pub notations: TaggedValues,
    pub display: Option<String>,
    /// Raw datatype text.
    pub datatype: Option<String>,
    pub units: TaggedValues,
}

/// One ontology element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub uri: String,
    pub name: String,
    pub node_type: NodeType,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Title labels (text → tag).
    pub pref_labels: TaggedValues,
    /// Tree/sidebar labels (text → tag).
    pub display_labels: TaggedValues,
    pub alt_labels: TaggedValues,
    pub descriptions: TaggedValues,
    /// Codes (notation → tag).
    pub notations: TaggedValues,
    pub datatype: Option<Datatype>,
    pub units: TaggedValues,
    pub display_status: Option<String>,
    pub fetch_timestamp: NaiveDateTime,
    pub source_id: String,
}

impl Node {
    /// Build a node from fetched attributes.
    ///
    /// Fails with [`Error::Validation`] when no type can be resolved.
    /// An unrecognised datatype is logged and left unset.
    pub fn new(
        uri: impl Into<String>,
        declared_type: Option<&str>,
        parent_type: Option<NodeType>,
        attrs: NodeAttributes,
        source_id: impl Into<String>,
        fetch_timestamp: NaiveDateTime,
    ) -> Result<Self> {
        let uri = uri.into();
        let node_type = NodeType::resolve(declared_type, parent_type)
            .map_err(|e| Error::Validation(format!("{} ({})", e, uri)))?;

        let datatype = match attrs.datatype.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = Datatype::parse(raw);
                if parsed.is_none() {
                    warn!(
                        subsystem = "core",
                        component = "node",
                        node_uri = %uri,
                        datatype = raw,
                        "Unrecognised datatype, leaving unset"
                    );
                }
                parsed
            }
        };

        Ok(Self {
            uri,
            name: attrs.name,
            node_type,
            parent: None,
            children: Vec::new(),
            pref_labels: attrs.pref_labels,
            display_labels: attrs.display_labels,
            alt_labels: attrs.alt_labels,
            descriptions: attrs.descriptions,
            notations: attrs.notations,
            datatype,
            units: attrs.units,
            display_status: attrs.display,
            fetch_timestamp,
            source_id: source_id.into(),
        })
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_modifier(&self) -> bool {
        self.node_type == NodeType::Modifier
    }

    pub fn pref_label(&self) -> &str {
        self.pref_labels.effective()
    }

    /// Display label, falling back to the pref labels when none are present.
    pub fn display_label(&self) -> &str {
        if self.display_labels.is_empty() {
            self.pref_labels.effective()
        } else {
            self.display_labels.effective()
        }
    }

    /// Name shown in the warehouse tree: the display label, else the short
    /// name, else the URI. Never empty for a node with a URI.
    pub fn row_name(&self) -> &str {
        [self.display_label(), self.name.as_str(), self.uri.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        self.descriptions.effective()
    }

    /// The node's own code: the notation when there is exactly one.
    pub fn base_notation(&self) -> Option<&str> {
        if self.notations.len() == 1 {
            self.notations.values().next()
        } else {
            None
        }
    }

    /// Fact table column the node's codes are matched against.
    pub fn fact_table_column(&self) -> &'static str {
        if self.is_modifier() {
            "modifier_cd"
        } else {
            "concept_cd"
        }
    }

    /// Dimension table holding the node's codes.
    pub fn dimension_table(&self) -> &'static str {
        if self.is_modifier() {
            "modifier_dimension"
        } else {
            "concept_dimension"
        }
    }

    /// Path column of the dimension table.
    pub fn dimension_column(&self) -> &'static str {
        if self.is_modifier() {
            "modifier_path"
        } else {
            "concept_path"
        }
    }

    /// Fetch timestamp in warehouse text form.
    pub fn fetch_timestamp_text(&self) -> String {
        self.fetch_timestamp
            .format(defaults::TIMESTAMP_FORMAT)
            .to_string()
    }

    /// `<UnitValues>` fragment; only numeric datatypes carry units.
    pub fn units_xml(&self) -> String {
        match self.datatype {
            Some(dt) if dt.is_numeric() && !self.units.is_empty() => {
                let mut xml = String::from("<UnitValues>");
                for (i, unit) in self.units.values().enumerate() {
                    if i == 0 {
                        xml.push_str(&format!("<NormalUnits>{}</NormalUnits>", unit));
                    } else {
                        xml.push_str(&format!("<EqualUnits>{}</EqualUnits>", unit));
                    }
                }
                xml.push_str("</UnitValues>");
                xml
            }
            _ => String::new(),
        }
    }

    /// Value metadata XML, or `None` (SQL NULL) when the datatype is unset.
    pub fn value_metadata_xml(&self) -> Option<String> {
        self.datatype.map(|dt| {
            format!(
                "<ValueMetadata><Version>3.02</Version><CreationDateTime>{}</CreationDateTime>\
                 <DataType>{}</DataType><Oktousevalues>Y</Oktousevalues>{}</ValueMetadata>",
                self.fetch_timestamp_text(),
                dt.pretty(),
                self.units_xml()
            )
        })
    }
}
