//! Language-tagged attribute values.
//!
//! Ontology attributes may occur several times with different language
//! tags, e.g.
//!
//! ```text
//! skos:prefLabel "Gesundheitsfragebogen: EQ-5D VAS"@de ;
//! skos:prefLabel "Health questionnaire EQ-5D VAS"@en ;
//! ```
//!
//! which is held as `{"Gesundheitsfragebogen: EQ-5D VAS": "de", "Health questionnaire EQ-5D VAS": "en"}`.
//! Insertion order is kept: notation indices and the "first present" fallback
//! both depend on it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Language tag preferred by [`TaggedValues::effective`].
pub const PREFERRED_LANGUAGE: &str = "en";

/// Ordered mapping from value text to its language/tag marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaggedValues(IndexMap<String, String>);

impl TaggedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value; re-inserting an existing value keeps its position and replaces its tag.
    pub fn insert(&mut self, value: impl Into<String>, tag: impl Into<String>) {
        self.0.insert(value.into(), tag.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, value: impl Into<String>, tag: impl Into<String>) -> Self {
        self.insert(value, tag);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values with their tags, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(v, t)| (v.as_str(), t.as_str()))
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Value at a position.
    pub fn get_index(&self, index: usize) -> Option<(&str, &str)> {
        self.0
            .get_index(index)
            .map(|(v, t)| (v.as_str(), t.as_str()))
    }

    /// The single representative value: the first `"en"`-tagged entry, else
    /// the first entry, else the empty string.
    pub fn effective(&self) -> &str {
        self.0
            .iter()
            .find(|(_, tag)| tag.as_str() == PREFERRED_LANGUAGE)
            .or_else(|| self.0.first())
            .map(|(value, _)| value.as_str())
            .unwrap_or("")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TaggedValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
